//! Campaign and campaign-contact storage helpers.

use chrono::{DateTime, Utc};

use super::traits::{Filter, Storage};
use crate::domain::{Campaign, CampaignContact, CampaignStatus, ContactStatus};
use crate::error::{CallwaveError, Result};

/// Collection name for campaigns.
pub const CAMPAIGNS_COLLECTION: &str = "campaigns";

/// Collection name for campaign contacts.
pub const CAMPAIGN_CONTACTS_COLLECTION: &str = "campaign_contacts";

const OPEN_CONTACT_STATUSES: [ContactStatus; 2] = [ContactStatus::Pending, ContactStatus::Scheduled];

/// Helper for campaign-specific queries.
pub struct CampaignStore<'a, S: Storage> {
    storage: &'a S,
}

impl<'a, S: Storage> CampaignStore<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    pub fn get(&self, id: &str) -> Result<Option<Campaign>> {
        self.storage.get(CAMPAIGNS_COLLECTION, id)
    }

    /// Get a campaign or fail with `CampaignNotFound`.
    pub fn require(&self, id: &str) -> Result<Campaign> {
        self.get(id)?
            .ok_or_else(|| CallwaveError::CampaignNotFound(id.to_string()))
    }

    pub fn create(&self, record: &Campaign) -> Result<()> {
        self.storage.create(CAMPAIGNS_COLLECTION, record)
    }

    pub fn update(&self, record: &Campaign) -> Result<()> {
        self.storage.update(CAMPAIGNS_COLLECTION, &record.id, record)
    }

    /// Write `record` only if the stored campaign still has status `expected`.
    pub fn update_if_status(&self, record: &Campaign, expected: CampaignStatus) -> Result<bool> {
        self.storage
            .update_if(CAMPAIGNS_COLLECTION, &record.id, record, &[Filter::eq("status", expected)])
    }

    pub fn find_by_status(&self, status: CampaignStatus) -> Result<Vec<Campaign>> {
        self.storage
            .query(CAMPAIGNS_COLLECTION, &[Filter::eq("status", status)])
    }

    pub fn list_all(&self) -> Result<Vec<Campaign>> {
        self.storage.list(CAMPAIGNS_COLLECTION)
    }
}

/// Helper for campaign-contact queries.
pub struct CampaignContactStore<'a, S: Storage> {
    storage: &'a S,
}

impl<'a, S: Storage> CampaignContactStore<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    pub fn get(&self, id: &str) -> Result<Option<CampaignContact>> {
        self.storage.get(CAMPAIGN_CONTACTS_COLLECTION, id)
    }

    pub fn create(&self, record: &CampaignContact) -> Result<()> {
        self.storage.create(CAMPAIGN_CONTACTS_COLLECTION, record)
    }

    /// Write `record` unless the stored contact has reached a terminal status.
    ///
    /// Returns false when the write was refused.
    pub fn update_if_open(&self, record: &CampaignContact) -> Result<bool> {
        self.storage.update_if(
            CAMPAIGN_CONTACTS_COLLECTION,
            &record.id,
            record,
            &[Filter::is_in("status", &OPEN_CONTACT_STATUSES)],
        )
    }

    /// Write `record` only if the stored contact is open and still on the
    /// attempt that placed `call_id`.
    ///
    /// A redial between reading and writing bumps `attempts` and replaces
    /// `call_log_id`, so the write is refused.
    pub fn update_if_current_attempt(&self, record: &CampaignContact, call_id: &str, attempts: u32) -> Result<bool> {
        self.storage.update_if(
            CAMPAIGN_CONTACTS_COLLECTION,
            &record.id,
            record,
            &[
                Filter::is_in("status", &OPEN_CONTACT_STATUSES),
                Filter::eq("call_log_id", call_id),
                Filter::eq("attempts", attempts),
            ],
        )
    }

    /// All contacts of a campaign, in creation order.
    pub fn find_by_campaign(&self, campaign_id: &str) -> Result<Vec<CampaignContact>> {
        self.storage
            .query(CAMPAIGN_CONTACTS_COLLECTION, &[Filter::eq("campaign_id", campaign_id)])
    }

    /// Contacts an orchestrator run at `now` should dispatch.
    pub fn find_eligible(&self, campaign_id: &str, now: DateTime<Utc>) -> Result<Vec<CampaignContact>> {
        let open: Vec<CampaignContact> = self.storage.query(
            CAMPAIGN_CONTACTS_COLLECTION,
            &[
                Filter::eq("campaign_id", campaign_id),
                Filter::is_in("status", &OPEN_CONTACT_STATUSES),
            ],
        )?;
        Ok(open.into_iter().filter(|cc| cc.is_eligible(now)).collect())
    }

    /// The campaign contact whose latest attempt produced `call_id`.
    pub fn find_by_call(&self, call_id: &str) -> Result<Option<CampaignContact>> {
        let found: Vec<CampaignContact> = self
            .storage
            .query(CAMPAIGN_CONTACTS_COLLECTION, &[Filter::eq("call_log_id", call_id)])?;
        Ok(found.into_iter().next())
    }
}
