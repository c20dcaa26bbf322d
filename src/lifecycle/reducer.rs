//! Call lifecycle reducer.
//!
//! Applies parsed provider events to call records and, for campaign calls,
//! to the owning campaign contact. Events are looked up by the provider's
//! call id only. Events for unknown calls, duplicate endings and updates to
//! calls that already ended are dropped, not errored.
//!
//! Events for one call id are applied one at a time in arrival order; events
//! for different calls run independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use super::event::{CallReport, LifecycleEvent, TranscriptUpdate};
use super::sentiment;
use crate::campaign::StatsAggregator;
use crate::domain::{BookingRequest, Call, CallDirection, CallStatus, ContactStatus};
use crate::error::Result;
use crate::storage::{AppointmentStore, CallStore, CampaignContactStore, DirectoryStore, Storage};

/// Function name the assistant uses to book an appointment
pub const BOOK_APPOINTMENT: &str = "book_appointment";

/// Why an event changed nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No call with this correlation id
    UnknownCall,
    /// The call already reached the state this event would produce
    AlreadyEnded,
    /// Event type not handled, or no call id
    UnsupportedEvent,
    /// Function other than appointment booking
    UnhandledFunction,
    /// Booking arguments without a usable start time
    InvalidBooking,
}

impl IgnoreReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            IgnoreReason::UnknownCall => "unknown call",
            IgnoreReason::AlreadyEnded => "already ended",
            IgnoreReason::UnsupportedEvent => "unsupported event",
            IgnoreReason::UnhandledFunction => "unhandled function",
            IgnoreReason::InvalidBooking => "invalid booking",
        }
    }
}

/// What applying one event did
#[derive(Debug, Clone, PartialEq)]
pub enum ReduceOutcome {
    /// An inbound call record was created
    Created { call_id: String },
    /// The call record was updated
    Updated { call_id: String, status: CallStatus },
    AppointmentBooked { call_id: String, appointment_id: String },
    Ignored(IgnoreReason),
}

/// Applies lifecycle events to stored records.
pub struct CallLifecycleReducer<S: Storage> {
    storage: Arc<S>,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: Storage> CallLifecycleReducer<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Apply `event` as of `now`.
    pub async fn apply(&self, event: LifecycleEvent, now: DateTime<Utc>) -> Result<ReduceOutcome> {
        let Some(call_id) = event.call_id().map(str::to_string) else {
            log::debug!("Dropping {} event without call id", event.kind());
            return Ok(ReduceOutcome::Ignored(IgnoreReason::UnsupportedEvent));
        };

        let lock = self.lock_for(&call_id);
        let outcome = {
            let _guard = lock.lock().await;
            self.reduce(event, &call_id, now)
        };
        drop(lock);
        self.release(&call_id);

        if let Ok(ReduceOutcome::Ignored(reason)) = &outcome {
            log::debug!("Event for call {} ignored: {}", call_id, reason.as_str());
        }
        outcome
    }

    fn lock_for(&self, call_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(call_id.to_string()).or_default())
    }

    /// Drop the per-call lock once nobody else holds or waits on it
    fn release(&self, call_id: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks.get(call_id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(call_id);
        }
    }

    fn reduce(&self, event: LifecycleEvent, call_id: &str, now: DateTime<Utc>) -> Result<ReduceOutcome> {
        match event {
            LifecycleEvent::CallStarted {
                assistant_id, metadata, ..
            } => self.on_started(call_id, assistant_id.as_deref(), metadata, now),
            LifecycleEvent::CallEnded { report, .. } => self.on_ended(call_id, report, now),
            LifecycleEvent::Transcript { update, .. } => self.on_transcript(call_id, update),
            LifecycleEvent::Forwarded { destination, .. } => self.on_forwarded(call_id, destination),
            LifecycleEvent::FunctionCall { name, payload, .. } => self.on_function_call(call_id, &name, payload),
            LifecycleEvent::Unknown { event_type, .. } => {
                log::debug!("Unhandled event type '{}' for call {}", event_type, call_id);
                Ok(ReduceOutcome::Ignored(IgnoreReason::UnsupportedEvent))
            }
        }
    }

    fn on_started(
        &self,
        call_id: &str,
        provider_assistant_id: Option<&str>,
        metadata: Value,
        now: DateTime<Utc>,
    ) -> Result<ReduceOutcome> {
        let calls = CallStore::new(self.storage.as_ref());

        if let Some(mut call) = calls.find_by_external_id(call_id)? {
            if call.status.is_terminal() {
                return Ok(ReduceOutcome::Ignored(IgnoreReason::AlreadyEnded));
            }
            call.started_at = Some(now);
            call.duration_seconds = Some(0);
            call.touch();
            if !calls.update_if_in_progress(&call)? {
                return Ok(ReduceOutcome::Ignored(IgnoreReason::AlreadyEnded));
            }
            return Ok(ReduceOutcome::Updated {
                call_id: call.id,
                status: call.status,
            });
        }

        // Outbound call whose record the dispatcher has not written yet
        if metadata.get("campaignContactId").is_some() {
            return Ok(ReduceOutcome::Ignored(IgnoreReason::UnknownCall));
        }

        let directory = DirectoryStore::new(self.storage.as_ref());
        let assistant = match metadata.get("assistantId").and_then(Value::as_str) {
            Some(id) => directory.assistant(id)?,
            None => match provider_assistant_id {
                Some(external) => directory.find_assistant_by_external_id(external)?,
                None => None,
            },
        };
        let organization_id = metadata
            .get("organizationId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| assistant.as_ref().map(|a| a.organization_id.clone()));

        let (Some(assistant), Some(organization_id)) = (assistant, organization_id) else {
            return Ok(ReduceOutcome::Ignored(IgnoreReason::UnknownCall));
        };

        let mut call = Call::new_in_progress(CallDirection::Inbound, organization_id, Some(call_id.to_string()), now);
        call.assistant_id = Some(assistant.id);
        call.metadata = metadata;
        calls.create(&call)?;

        log::info!("Inbound call {} ({}) started", call.id, call_id);
        Ok(ReduceOutcome::Created { call_id: call.id })
    }

    fn on_ended(&self, call_id: &str, report: CallReport, now: DateTime<Utc>) -> Result<ReduceOutcome> {
        let calls = CallStore::new(self.storage.as_ref());
        let Some(mut call) = calls.find_by_external_id(call_id)? else {
            return Ok(ReduceOutcome::Ignored(IgnoreReason::UnknownCall));
        };
        if call.ended_at.is_some() {
            return Ok(ReduceOutcome::Ignored(IgnoreReason::AlreadyEnded));
        }

        // A forwarded call stays transferred whatever the end reason says
        if call.status != CallStatus::Transferred {
            call.status = report
                .ended_reason
                .as_deref()
                .map(CallStatus::from_end_reason)
                .unwrap_or(CallStatus::Completed);
        }

        if report.duration_seconds.is_some() {
            call.duration_seconds = report.duration_seconds;
        }
        call.transcript = report.transcript.or(call.transcript);
        call.summary = report.summary.or(call.summary);
        call.recording_url = report.recording_url.or(call.recording_url);
        call.cost = report.cost.or(call.cost);
        call.ended_reason = report.ended_reason;
        call.ended_at = Some(now);
        call.sentiment = Some(sentiment::classify(call.summary.as_deref(), call.transcript.as_deref()));
        call.touch();

        if !calls.update_if_not_ended(&call)? {
            return Ok(ReduceOutcome::Ignored(IgnoreReason::AlreadyEnded));
        }
        log::info!(
            "Call {} ({}) ended: {} after {}s",
            call.id,
            call_id,
            call.status.as_str(),
            call.duration_seconds.unwrap_or(0)
        );

        self.settle_campaign_contact(&call, now)?;

        Ok(ReduceOutcome::Updated {
            call_id: call.id,
            status: call.status,
        })
    }

    /// Close the campaign contact that placed `call`, then refresh its campaign stats
    fn settle_campaign_contact(&self, call: &Call, now: DateTime<Utc>) -> Result<()> {
        let contacts = CampaignContactStore::new(self.storage.as_ref());
        let Some(mut cc) = contacts.find_by_call(&call.id)? else {
            return Ok(());
        };
        let attempts = cc.attempts;

        cc.status = if call.status == CallStatus::Completed {
            ContactStatus::Completed
        } else {
            ContactStatus::Failed
        };
        cc.result = call.ended_reason.clone().or_else(|| Some(call.status.as_str().to_string()));
        cc.completed_at = Some(now);
        cc.next_attempt_at = None;
        cc.touch();

        if !contacts.update_if_current_attempt(&cc, &call.id, attempts)? {
            log::debug!("Campaign contact {} closed or redialled since call {}, leaving it", cc.id, call.id);
            return Ok(());
        }

        if let Err(e) = StatsAggregator::new(self.storage.as_ref()).refresh(&cc.campaign_id) {
            log::error!("Stats refresh failed for campaign {}: {}", cc.campaign_id, e);
        }
        Ok(())
    }

    fn on_transcript(&self, call_id: &str, update: TranscriptUpdate) -> Result<ReduceOutcome> {
        let calls = CallStore::new(self.storage.as_ref());
        let Some(mut call) = calls.find_by_external_id(call_id)? else {
            return Ok(ReduceOutcome::Ignored(IgnoreReason::UnknownCall));
        };
        if call.status.is_terminal() {
            return Ok(ReduceOutcome::Ignored(IgnoreReason::AlreadyEnded));
        }

        call.transcript = Some(match (update, call.transcript.take()) {
            (TranscriptUpdate::Append(line), Some(existing)) if !existing.is_empty() => {
                format!("{}\n{}", existing, line)
            }
            (TranscriptUpdate::Append(text), _) | (TranscriptUpdate::Replace(text), _) => text,
        });
        call.touch();

        if !calls.update_if_in_progress(&call)? {
            return Ok(ReduceOutcome::Ignored(IgnoreReason::AlreadyEnded));
        }
        Ok(ReduceOutcome::Updated {
            call_id: call.id,
            status: call.status,
        })
    }

    fn on_forwarded(&self, call_id: &str, destination: Option<String>) -> Result<ReduceOutcome> {
        let calls = CallStore::new(self.storage.as_ref());
        let Some(mut call) = calls.find_by_external_id(call_id)? else {
            return Ok(ReduceOutcome::Ignored(IgnoreReason::UnknownCall));
        };
        if call.status.is_terminal() {
            return Ok(ReduceOutcome::Ignored(IgnoreReason::AlreadyEnded));
        }

        call.status = CallStatus::Transferred;
        if let Some(target) = &destination {
            if !call.metadata.is_object() {
                call.metadata = json!({});
            }
            call.metadata["forwardedTo"] = json!(target);
        }
        call.forwarded_to = destination;
        call.touch();

        if !calls.update_if_in_progress(&call)? {
            return Ok(ReduceOutcome::Ignored(IgnoreReason::AlreadyEnded));
        }
        log::info!(
            "Call {} forwarded to {}",
            call.id,
            call.forwarded_to.as_deref().unwrap_or("unknown destination")
        );
        Ok(ReduceOutcome::Updated {
            call_id: call.id,
            status: call.status,
        })
    }

    fn on_function_call(&self, call_id: &str, name: &str, payload: Value) -> Result<ReduceOutcome> {
        let Some(call) = CallStore::new(self.storage.as_ref()).find_by_external_id(call_id)? else {
            return Ok(ReduceOutcome::Ignored(IgnoreReason::UnknownCall));
        };

        if name.trim().to_ascii_lowercase().replace('-', "_") != BOOK_APPOINTMENT {
            log::debug!("Function '{}' on call {} not handled", name, call.id);
            return Ok(ReduceOutcome::Ignored(IgnoreReason::UnhandledFunction));
        }

        let request: BookingRequest = match serde_json::from_value(payload) {
            Ok(request) => request,
            Err(e) => {
                log::warn!("Unreadable booking on call {}: {}", call.id, e);
                return Ok(ReduceOutcome::Ignored(IgnoreReason::InvalidBooking));
            }
        };
        let Some(appointment) = request.into_appointment(&call.organization_id, call.contact_id.clone(), &call.id)
        else {
            log::warn!("Booking on call {} has no usable start time", call.id);
            return Ok(ReduceOutcome::Ignored(IgnoreReason::InvalidBooking));
        };

        AppointmentStore::new(self.storage.as_ref()).create(&appointment)?;
        log::info!("Appointment {} booked from call {}", appointment.id, call.id);
        Ok(ReduceOutcome::AppointmentBooked {
            call_id: call.id,
            appointment_id: appointment.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Assistant, CampaignContact};
    use crate::storage::{CAMPAIGN_CONTACTS_COLLECTION, Filter, HasId, JsonlStorage};
    use serde::{Serialize, de::DeserializeOwned};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    fn setup() -> (Arc<JsonlStorage>, CallLifecycleReducer<JsonlStorage>, TempDir) {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(JsonlStorage::new(temp.path()).unwrap());
        let reducer = CallLifecycleReducer::new(storage.clone());
        (storage, reducer, temp)
    }

    fn outbound(storage: &JsonlStorage, external: &str) -> Call {
        let mut call = Call::new_in_progress(CallDirection::Outbound, "org-1", Some(external.to_string()), Utc::now());
        call.contact_id = Some("ct-1".to_string());
        CallStore::new(storage).create(&call).unwrap();
        call
    }

    fn ended(external: &str, reason: &str) -> LifecycleEvent {
        LifecycleEvent::CallEnded {
            call_id: external.to_string(),
            report: CallReport {
                ended_reason: Some(reason.to_string()),
                duration_seconds: Some(42),
                summary: Some("Client satisfait, merci".to_string()),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_call_ended_sets_outcome() {
        let (storage, reducer, _temp) = setup();
        let call = outbound(&storage, "vapi-1");

        let outcome = reducer.apply(ended("vapi-1", "customer-ended-call"), Utc::now()).await.unwrap();
        assert_eq!(
            outcome,
            ReduceOutcome::Updated {
                call_id: call.id.clone(),
                status: CallStatus::Completed
            }
        );

        let stored = CallStore::new(storage.as_ref()).get(&call.id).unwrap().unwrap();
        assert_eq!(stored.duration_seconds, Some(42));
        assert_eq!(stored.sentiment, Some(crate::domain::Sentiment::Positive));
        assert!(stored.ended_at.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_call_ended_is_dropped() {
        let (storage, reducer, _temp) = setup();
        outbound(&storage, "vapi-1");

        reducer.apply(ended("vapi-1", "customer-busy"), Utc::now()).await.unwrap();
        let again = reducer.apply(ended("vapi-1", "customer-ended-call"), Utc::now()).await.unwrap();
        assert_eq!(again, ReduceOutcome::Ignored(IgnoreReason::AlreadyEnded));

        let stored = CallStore::new(storage.as_ref()).find_by_external_id("vapi-1").unwrap().unwrap();
        assert_eq!(stored.status, CallStatus::Missed);
    }

    #[tokio::test]
    async fn test_unknown_call_is_ignored() {
        let (storage, reducer, _temp) = setup();
        let outcome = reducer.apply(ended("nope", "customer-ended-call"), Utc::now()).await.unwrap();
        assert_eq!(outcome, ReduceOutcome::Ignored(IgnoreReason::UnknownCall));
        assert!(storage.list::<Call>(crate::storage::CALLS_COLLECTION).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transcript_appends_while_in_progress() {
        let (storage, reducer, _temp) = setup();
        let call = outbound(&storage, "vapi-1");

        for line in ["bot: Bonjour", "user: Oui"] {
            let event = LifecycleEvent::Transcript {
                call_id: "vapi-1".to_string(),
                update: TranscriptUpdate::Append(line.to_string()),
            };
            reducer.apply(event, Utc::now()).await.unwrap();
        }

        let stored = CallStore::new(storage.as_ref()).get(&call.id).unwrap().unwrap();
        assert_eq!(stored.transcript.as_deref(), Some("bot: Bonjour\nuser: Oui"));
        assert_eq!(stored.status, CallStatus::InProgress);
    }

    #[tokio::test]
    async fn test_forwarded_then_ended_stays_transferred() {
        let (storage, reducer, _temp) = setup();
        let call = outbound(&storage, "vapi-1");
        let mut cc = CampaignContact::new("cmp-1", "ct-1", 3);
        cc.status = ContactStatus::Scheduled;
        cc.attempts = 1;
        cc.call_log_id = Some(call.id.clone());
        CampaignContactStore::new(storage.as_ref()).create(&cc).unwrap();

        let forwarded = LifecycleEvent::Forwarded {
            call_id: "vapi-1".to_string(),
            destination: Some("+33100000000".to_string()),
        };
        reducer.apply(forwarded, Utc::now()).await.unwrap();
        reducer.apply(ended("vapi-1", "assistant-forwarded-call"), Utc::now()).await.unwrap();

        let stored = CallStore::new(storage.as_ref()).get(&call.id).unwrap().unwrap();
        assert_eq!(stored.status, CallStatus::Transferred);
        assert_eq!(stored.metadata["forwardedTo"], "+33100000000");
        assert_eq!(stored.duration_seconds, Some(42));

        let cc = CampaignContactStore::new(storage.as_ref()).get(&cc.id).unwrap().unwrap();
        assert_eq!(cc.status, ContactStatus::Failed);
    }

    /// Lets a redial of the contact land between settlement's read and write
    struct RedialBeforeSettle {
        inner: JsonlStorage,
        redialled: AtomicBool,
    }

    impl Storage for RedialBeforeSettle {
        fn create<T: Serialize + DeserializeOwned + HasId>(&self, collection: &str, record: &T) -> Result<()> {
            self.inner.create(collection, record)
        }

        fn get<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<Option<T>> {
            self.inner.get(collection, id)
        }

        fn update<T: Serialize + DeserializeOwned + HasId>(&self, collection: &str, id: &str, record: &T) -> Result<()> {
            self.inner.update(collection, id, record)
        }

        fn update_if<T: Serialize + DeserializeOwned + HasId>(
            &self,
            collection: &str,
            id: &str,
            record: &T,
            expected: &[Filter],
        ) -> Result<bool> {
            if collection == CAMPAIGN_CONTACTS_COLLECTION && !self.redialled.swap(true, Ordering::SeqCst) {
                let mut redial: CampaignContact = self.inner.get(collection, id)?.unwrap();
                redial.attempts += 1;
                redial.call_log_id = Some("call-next".to_string());
                self.inner.update(collection, id, &redial)?;
            }
            self.inner.update_if(collection, id, record, expected)
        }

        fn delete(&self, collection: &str, id: &str) -> Result<()> {
            self.inner.delete(collection, id)
        }

        fn query<T: DeserializeOwned>(&self, collection: &str, filters: &[Filter]) -> Result<Vec<T>> {
            self.inner.query(collection, filters)
        }

        fn list<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>> {
            self.inner.list(collection)
        }
    }

    #[tokio::test]
    async fn test_settlement_leaves_redialled_contact_open() {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(RedialBeforeSettle {
            inner: JsonlStorage::new(temp.path()).unwrap(),
            redialled: AtomicBool::new(false),
        });
        let call = outbound(&storage.inner, "vapi-1");
        let mut cc = CampaignContact::new("cmp-1", "ct-1", 3);
        cc.status = ContactStatus::Scheduled;
        cc.attempts = 1;
        cc.call_log_id = Some(call.id.clone());
        CampaignContactStore::new(&storage.inner).create(&cc).unwrap();

        let reducer = CallLifecycleReducer::new(storage.clone());
        let outcome = reducer.apply(ended("vapi-1", "customer-busy"), Utc::now()).await.unwrap();
        assert!(matches!(outcome, ReduceOutcome::Updated { status: CallStatus::Missed, .. }));
        assert!(storage.redialled.load(Ordering::SeqCst));

        let stored = CampaignContactStore::new(&storage.inner).get(&cc.id).unwrap().unwrap();
        assert_eq!(stored.status, ContactStatus::Scheduled);
        assert_eq!(stored.attempts, 2);
        assert_eq!(stored.call_log_id.as_deref(), Some("call-next"));
        assert!(stored.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_inbound_call_started_creates_call() {
        let (storage, reducer, _temp) = setup();
        let assistant = Assistant::new("org-9", "Reception", Some("asst_in".to_string()));
        DirectoryStore::new(storage.as_ref()).create_assistant(&assistant).unwrap();

        let event = LifecycleEvent::CallStarted {
            call_id: "vapi-in".to_string(),
            assistant_id: Some("asst_in".to_string()),
            metadata: Value::Null,
        };
        let outcome = reducer.apply(event, Utc::now()).await.unwrap();
        assert!(matches!(outcome, ReduceOutcome::Created { .. }));

        let call = CallStore::new(storage.as_ref()).find_by_external_id("vapi-in").unwrap().unwrap();
        assert_eq!(call.direction, CallDirection::Inbound);
        assert_eq!(call.organization_id, "org-9");
        assert_eq!(call.assistant_id, Some(assistant.id));
    }

    #[tokio::test]
    async fn test_call_started_without_context_is_dropped() {
        let (storage, reducer, _temp) = setup();
        let event = LifecycleEvent::CallStarted {
            call_id: "vapi-x".to_string(),
            assistant_id: None,
            metadata: json!({ "campaignContactId": "cc-1" }),
        };
        let outcome = reducer.apply(event, Utc::now()).await.unwrap();
        assert_eq!(outcome, ReduceOutcome::Ignored(IgnoreReason::UnknownCall));
        assert!(CallStore::new(storage.as_ref()).find_by_external_id("vapi-x").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_book_appointment_requires_known_call() {
        let (storage, reducer, _temp) = setup();
        let payload = json!({ "date": "2026-06-01", "time": "10:30", "service": "Visite" });

        let orphan = LifecycleEvent::FunctionCall {
            call_id: "nope".to_string(),
            name: BOOK_APPOINTMENT.to_string(),
            payload: payload.clone(),
        };
        assert_eq!(
            reducer.apply(orphan, Utc::now()).await.unwrap(),
            ReduceOutcome::Ignored(IgnoreReason::UnknownCall)
        );

        let call = outbound(&storage, "vapi-1");
        let event = LifecycleEvent::FunctionCall {
            call_id: "vapi-1".to_string(),
            name: "book-appointment".to_string(),
            payload,
        };
        let outcome = reducer.apply(event, Utc::now()).await.unwrap();
        assert!(matches!(outcome, ReduceOutcome::AppointmentBooked { .. }));

        let booked = AppointmentStore::new(storage.as_ref()).find_by_call(&call.id).unwrap();
        assert_eq!(booked.len(), 1);
        assert_eq!(booked[0].title, "Visite");
        assert_eq!(booked[0].contact_id.as_deref(), Some("ct-1"));
    }

    #[tokio::test]
    async fn test_other_function_is_ignored() {
        let (storage, reducer, _temp) = setup();
        outbound(&storage, "vapi-1");
        let event = LifecycleEvent::FunctionCall {
            call_id: "vapi-1".to_string(),
            name: "transfer_to_human".to_string(),
            payload: Value::Null,
        };
        assert_eq!(
            reducer.apply(event, Utc::now()).await.unwrap(),
            ReduceOutcome::Ignored(IgnoreReason::UnhandledFunction)
        );
    }

    #[tokio::test]
    async fn test_locks_are_released() {
        let (storage, reducer, _temp) = setup();
        outbound(&storage, "vapi-1");
        reducer.apply(ended("vapi-1", "customer-ended-call"), Utc::now()).await.unwrap();
        assert!(reducer.locks.lock().unwrap().is_empty());
    }
}
