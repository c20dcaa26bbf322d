//! Campaign record and related types
//!
//! A Campaign is a batch outbound-calling job: one assistant dialling a set of
//! contacts inside a daily call window, a few at a time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{CAMPAIGN_PREFIX, generate_id};
use crate::storage::HasId;

/// Default delay before a contact becomes eligible again
pub const DEFAULT_RETRY_DELAY_MINUTES: u32 = 60;

/// Default attempt budget per contact
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default number of calls placed concurrently
pub const DEFAULT_CONCURRENT_CALLS: u32 = 5;

/// The core Campaign struct
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Campaign {
    //=== Identity ===
    pub id: String,

    /// Organization that owns the campaign
    pub organization_id: String,

    /// Voice persona used for every call in the campaign
    pub assistant_id: String,

    pub name: String,

    //=== State ===
    pub status: CampaignStatus,

    pub settings: CampaignSettings,

    /// Denormalized rollup; recomputed by the stats aggregator, never authoritative
    #[serde(default)]
    pub stats: CampaignStats,

    //=== Timestamps ===
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Status of a campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Running,
    Paused,
    Completed,
    Cancelled,
}

impl CampaignStatus {
    /// Returns true if an orchestrator run may move the campaign to running.
    ///
    /// Completed campaigns can be run again to pick up rescheduled contacts.
    pub fn can_start(&self) -> bool {
        matches!(
            self,
            CampaignStatus::Draft | CampaignStatus::Scheduled | CampaignStatus::Paused | CampaignStatus::Completed
        )
    }

    /// Returns true if the campaign was stopped from outside the orchestrator
    pub fn is_halted(&self) -> bool {
        matches!(self, CampaignStatus::Paused | CampaignStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Scheduled => "scheduled",
            CampaignStatus::Running => "running",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(CampaignStatus::Draft),
            "scheduled" => Ok(CampaignStatus::Scheduled),
            "running" => Ok(CampaignStatus::Running),
            "paused" => Ok(CampaignStatus::Paused),
            "completed" => Ok(CampaignStatus::Completed),
            "cancelled" => Ok(CampaignStatus::Cancelled),
            other => Err(format!("unknown campaign status: {}", other)),
        }
    }
}

/// Dialling behaviour for a campaign
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CampaignSettings {
    /// Batch size; at most this many provider requests are in flight
    pub concurrent_calls: u32,

    /// Window opening, "HH:MM" 24h in `timezone`
    pub call_window_start: String,

    /// Window closing (inclusive), "HH:MM" 24h in `timezone`
    pub call_window_end: String,

    /// IANA timezone name, e.g. "Europe/Paris"
    pub timezone: String,

    /// Unset means [`DEFAULT_RETRY_DELAY_MINUTES`]
    pub retry_delay_minutes: Option<u32>,

    /// Copied onto each campaign contact at creation
    pub max_attempts: u32,
}

impl Default for CampaignSettings {
    fn default() -> Self {
        Self {
            concurrent_calls: DEFAULT_CONCURRENT_CALLS,
            call_window_start: "09:00".to_string(),
            call_window_end: "18:00".to_string(),
            timezone: "UTC".to_string(),
            retry_delay_minutes: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl CampaignSettings {
    pub fn retry_delay_minutes(&self) -> u32 {
        self.retry_delay_minutes.unwrap_or(DEFAULT_RETRY_DELAY_MINUTES)
    }
}

/// Campaign-level counters derived from campaign contacts and their calls
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CampaignStats {
    pub total_contacts: u32,
    pub calls_made: u32,
    pub calls_answered: u32,
    pub calls_completed: u32,
    pub calls_failed: u32,
    /// Percentage of calls made that completed, 0..=100
    pub success_rate: f64,
    /// Mean call duration in seconds
    pub avg_duration: f64,
    pub total_cost: f64,
}

impl Campaign {
    /// Create a new draft campaign
    pub fn new(
        organization_id: impl Into<String>,
        assistant_id: impl Into<String>,
        name: impl Into<String>,
        settings: CampaignSettings,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(CAMPAIGN_PREFIX),
            organization_id: organization_id.into(),
            assistant_id: assistant_id.into(),
            name: name.into(),
            status: CampaignStatus::Draft,
            settings,
            stats: CampaignStats::default(),
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl HasId for Campaign {
    fn id(&self) -> &str {
        &self.id
    }
}
