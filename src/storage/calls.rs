//! Call log, contact directory and appointment storage helpers.

use super::traits::{Filter, Storage};
use crate::domain::{Appointment, Assistant, Call, CallStatus, Contact};
use crate::error::{CallwaveError, Result};

pub const CALLS_COLLECTION: &str = "calls";
pub const CONTACTS_COLLECTION: &str = "contacts";
pub const ASSISTANTS_COLLECTION: &str = "assistants";
pub const APPOINTMENTS_COLLECTION: &str = "appointments";

/// Helper for call log queries.
pub struct CallStore<'a, S: Storage> {
    storage: &'a S,
}

impl<'a, S: Storage> CallStore<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    pub fn get(&self, id: &str) -> Result<Option<Call>> {
        self.storage.get(CALLS_COLLECTION, id)
    }

    pub fn create(&self, record: &Call) -> Result<()> {
        self.storage.create(CALLS_COLLECTION, record)
    }

    /// Look up a call by the provider's correlation id.
    pub fn find_by_external_id(&self, external_id: &str) -> Result<Option<Call>> {
        let found: Vec<Call> = self
            .storage
            .query(CALLS_COLLECTION, &[Filter::eq("external_id", external_id)])?;
        Ok(found.into_iter().next())
    }

    /// Write `record` only while the stored call is still in progress.
    pub fn update_if_in_progress(&self, record: &Call) -> Result<bool> {
        self.storage.update_if(
            CALLS_COLLECTION,
            &record.id,
            record,
            &[Filter::eq("status", CallStatus::InProgress)],
        )
    }

    /// Write `record` only if the stored call has not been ended yet.
    pub fn update_if_not_ended(&self, record: &Call) -> Result<bool> {
        self.storage.update_if(
            CALLS_COLLECTION,
            &record.id,
            record,
            &[Filter::eq("ended_at", serde_json::Value::Null)],
        )
    }

    pub fn find_by_campaign(&self, campaign_id: &str) -> Result<Vec<Call>> {
        self.storage
            .query(CALLS_COLLECTION, &[Filter::eq("campaign_id", campaign_id)])
    }
}

/// Helper for contacts and assistants, the records campaigns point at.
pub struct DirectoryStore<'a, S: Storage> {
    storage: &'a S,
}

impl<'a, S: Storage> DirectoryStore<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    pub fn contact(&self, id: &str) -> Result<Option<Contact>> {
        self.storage.get(CONTACTS_COLLECTION, id)
    }

    pub fn create_contact(&self, record: &Contact) -> Result<()> {
        self.storage.create(CONTACTS_COLLECTION, record)
    }

    pub fn assistant(&self, id: &str) -> Result<Option<Assistant>> {
        self.storage.get(ASSISTANTS_COLLECTION, id)
    }

    pub fn require_assistant(&self, id: &str) -> Result<Assistant> {
        self.assistant(id)?
            .ok_or_else(|| CallwaveError::AssistantNotFound(id.to_string()))
    }

    pub fn find_assistant_by_external_id(&self, external_id: &str) -> Result<Option<Assistant>> {
        let found: Vec<Assistant> = self
            .storage
            .query(ASSISTANTS_COLLECTION, &[Filter::eq("external_id", external_id)])?;
        Ok(found.into_iter().next())
    }

    pub fn create_assistant(&self, record: &Assistant) -> Result<()> {
        self.storage.create(ASSISTANTS_COLLECTION, record)
    }
}

/// Helper for appointment records.
pub struct AppointmentStore<'a, S: Storage> {
    storage: &'a S,
}

impl<'a, S: Storage> AppointmentStore<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    pub fn create(&self, record: &Appointment) -> Result<()> {
        self.storage.create(APPOINTMENTS_COLLECTION, record)
    }

    pub fn find_by_call(&self, call_id: &str) -> Result<Vec<Appointment>> {
        self.storage
            .query(APPOINTMENTS_COLLECTION, &[Filter::eq("call_id", call_id)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CallDirection;
    use crate::storage::JsonlStorage;
    use chrono::Utc;
    use tempfile::TempDir;

    fn create_test_storage() -> (JsonlStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = JsonlStorage::new(temp_dir.path()).unwrap();
        (storage, temp_dir)
    }

    #[test]
    fn test_find_by_external_id() {
        let (storage, _temp) = create_test_storage();
        let store = CallStore::new(&storage);

        let call = Call::new_in_progress(CallDirection::Outbound, "org", Some("vapi-1".into()), Utc::now());
        store.create(&call).unwrap();

        assert_eq!(store.find_by_external_id("vapi-1").unwrap().map(|c| c.id), Some(call.id));
        assert!(store.find_by_external_id("vapi-2").unwrap().is_none());
    }

    #[test]
    fn test_update_if_not_ended_only_once() {
        let (storage, _temp) = create_test_storage();
        let store = CallStore::new(&storage);

        let call = Call::new_in_progress(CallDirection::Outbound, "org", Some("vapi-1".into()), Utc::now());
        store.create(&call).unwrap();

        let mut ended = call.clone();
        ended.status = CallStatus::Completed;
        ended.ended_at = Some(Utc::now());

        assert!(store.update_if_not_ended(&ended).unwrap());
        assert!(!store.update_if_not_ended(&ended).unwrap());
    }

    #[test]
    fn test_require_assistant_missing() {
        let (storage, _temp) = create_test_storage();
        let store = DirectoryStore::new(&storage);
        assert!(matches!(
            store.require_assistant("ast-x"),
            Err(CallwaveError::AssistantNotFound(_))
        ));
    }
}
