//! Contacts and per-campaign contact progress records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{CAMPAIGN_CONTACT_PREFIX, CONTACT_PREFIX, generate_id};
use crate::storage::HasId;

/// A person that can be dialled
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub id: String,
    pub organization_id: String,
    pub name: Option<String>,
    /// E.164 number, e.g. "+33612345678"
    pub phone_number: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Contact {
    pub fn new(organization_id: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            id: generate_id(CONTACT_PREFIX),
            organization_id: organization_id.into(),
            name: None,
            phone_number: phone_number.into(),
            email: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl HasId for Contact {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Progress of one contact within one campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    /// Never attempted
    Pending,
    /// Attempted at least once, waiting for `next_attempt_at` or a call outcome
    Scheduled,
    Completed,
    Failed,
}

impl ContactStatus {
    /// Returns true if no further dispatch or transition is allowed
    pub fn is_terminal(&self) -> bool {
        matches!(self, ContactStatus::Completed | ContactStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::Pending => "pending",
            ContactStatus::Scheduled => "scheduled",
            ContactStatus::Completed => "completed",
            ContactStatus::Failed => "failed",
        }
    }
}

/// Join record between a Campaign and a Contact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampaignContact {
    pub id: String,
    pub campaign_id: String,
    pub contact_id: String,

    pub status: ContactStatus,

    /// Incremented on every dispatch attempt, never on a window deferral
    pub attempts: u32,
    pub max_attempts: u32,

    /// Not eligible for dispatch while this lies in the future
    pub next_attempt_at: Option<DateTime<Utc>>,
    pub last_attempt_at: Option<DateTime<Utc>>,

    /// Call placed by the latest attempt (lookup only, not owned)
    pub call_log_id: Option<String>,

    /// Outcome tag: provider end reason, or "error"
    pub result: Option<String>,

    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CampaignContact {
    pub fn new(campaign_id: impl Into<String>, contact_id: impl Into<String>, max_attempts: u32) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(CAMPAIGN_CONTACT_PREFIX),
            campaign_id: campaign_id.into(),
            contact_id: contact_id.into(),
            status: ContactStatus::Pending,
            attempts: 0,
            max_attempts,
            next_attempt_at: None,
            last_attempt_at: None,
            call_log_id: None,
            result: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether an orchestrator run at `now` should dispatch this contact
    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        let open_status = matches!(self.status, ContactStatus::Pending | ContactStatus::Scheduled);
        let due = self.next_attempt_at.is_none_or(|at| at <= now);
        open_status && due && self.has_attempts_left()
    }

    pub fn has_attempts_left(&self) -> bool {
        self.attempts < self.max_attempts
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl HasId for CampaignContact {
    fn id(&self) -> &str {
        &self.id
    }
}
