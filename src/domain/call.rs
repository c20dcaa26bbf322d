//! Call log record
//!
//! A Call is created at dispatch time (outbound) or when the provider reports
//! a call start (inbound). After that it is mutated only by the lifecycle
//! reducer, keyed by `external_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{CALL_PREFIX, generate_id};
use crate::storage::HasId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    Inbound,
    Outbound,
}

/// Call state machine: `in_progress` then exactly one terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    InProgress,
    Completed,
    Missed,
    Transferred,
    Failed,
}

impl CallStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CallStatus::InProgress)
    }

    /// Map a provider end reason onto a terminal status.
    ///
    /// Unlisted reasons count as completed.
    pub fn from_end_reason(reason: &str) -> Self {
        match reason.trim().to_ascii_lowercase().as_str() {
            "customer-did-not-answer" | "customer-busy" | "no-answer" | "voicemail" => CallStatus::Missed,
            "assistant-forwarded-call" | "call-forwarded" => CallStatus::Transferred,
            "pipeline-error" | "assistant-error" | "error" | "twilio-failed-to-connect" | "failed" => {
                CallStatus::Failed
            }
            _ => CallStatus::Completed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::InProgress => "in_progress",
            CallStatus::Completed => "completed",
            CallStatus::Missed => "missed",
            CallStatus::Transferred => "transferred",
            CallStatus::Failed => "failed",
        }
    }
}

/// Coarse sentiment label computed from the end-of-call summary and transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Call {
    pub id: String,

    /// Provider call id; the only key lifecycle events carry
    pub external_id: Option<String>,

    pub organization_id: String,
    pub assistant_id: Option<String>,
    pub contact_id: Option<String>,
    pub campaign_id: Option<String>,

    pub direction: CallDirection,
    pub status: CallStatus,

    pub duration_seconds: Option<u32>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub recording_url: Option<String>,
    pub cost: Option<f64>,
    pub sentiment: Option<Sentiment>,

    pub ended_reason: Option<String>,
    pub forwarded_to: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,

    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Call {
    /// A call that has just been placed or picked up
    pub fn new_in_progress(
        direction: CallDirection,
        organization_id: impl Into<String>,
        external_id: Option<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: generate_id(CALL_PREFIX),
            external_id,
            organization_id: organization_id.into(),
            assistant_id: None,
            contact_id: None,
            campaign_id: None,
            direction,
            status: CallStatus::InProgress,
            duration_seconds: Some(0),
            transcript: None,
            summary: None,
            recording_url: None,
            cost: None,
            sentiment: None,
            ended_reason: None,
            forwarded_to: None,
            metadata: serde_json::Value::Null,
            started_at: Some(started_at),
            ended_at: None,
            created_at: started_at,
            updated_at: started_at,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl HasId for Call {
    fn id(&self) -> &str {
        &self.id
    }
}
