//! Appointments booked by an assistant during a call

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{APPOINTMENT_PREFIX, generate_id};
use crate::storage::HasId;

const DEFAULT_DURATION_MINUTES: u32 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub organization_id: String,
    pub contact_id: Option<String>,
    /// Originating call; an appointment always has one
    pub call_id: String,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl HasId for Appointment {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Arguments of a `book_appointment` function call, as sent by the assistant
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct BookingRequest {
    #[serde(default, alias = "service")]
    pub title: Option<String>,
    #[serde(default, alias = "start_time", alias = "datetime")]
    pub starts_at: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default, alias = "duration")]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, alias = "customer_name")]
    pub name: Option<String>,
}

impl BookingRequest {
    /// Resolve the requested start time.
    ///
    /// Accepts an RFC 3339 `starts_at`, or a `date` ("YYYY-MM-DD") plus
    /// `time` ("HH:MM") taken as UTC.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        if let Some(raw) = self.starts_at.as_deref() {
            if let Ok(parsed) = DateTime::parse_from_rfc3339(raw.trim()) {
                return Some(parsed.with_timezone(&Utc));
            }
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M") {
                return Some(naive.and_utc());
            }
        }

        let date = NaiveDate::parse_from_str(self.date.as_deref()?.trim(), "%Y-%m-%d").ok()?;
        let time = NaiveTime::parse_from_str(self.time.as_deref()?.trim(), "%H:%M").ok()?;
        Some(date.and_time(time).and_utc())
    }

    /// Build the appointment for a call, or None if no start time can be resolved
    pub fn into_appointment(
        self,
        organization_id: &str,
        contact_id: Option<String>,
        call_id: &str,
    ) -> Option<Appointment> {
        let starts_at = self.start()?;
        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.name.as_ref().map(|n| format!("Appointment with {}", n)))
            .unwrap_or_else(|| "Appointment".to_string());

        Some(Appointment {
            id: generate_id(APPOINTMENT_PREFIX),
            organization_id: organization_id.to_string(),
            contact_id,
            call_id: call_id.to_string(),
            title,
            starts_at,
            duration_minutes: self.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
            notes: self.notes,
            created_at: Utc::now(),
        })
    }
}
