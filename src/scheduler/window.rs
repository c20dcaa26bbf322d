//! Call window evaluation.
//!
//! A campaign may only dispatch between `call_window_start` and
//! `call_window_end` (inclusive, minute resolution) in its own timezone.
//! Windows are same-day only; a window whose start is after its end is
//! rejected rather than interpreted as wrapping past midnight.
//!
//! Any malformed setting makes the evaluator answer "not eligible".

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::domain::CampaignSettings;

/// Reasons a campaign's window settings cannot be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    #[error("malformed window time '{0}', expected HH:MM")]
    MalformedTime(String),

    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("window {start}-{end} crosses midnight, which is not supported")]
    Overnight { start: String, end: String },
}

/// Parsed call window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallWindow {
    start_minute: u32,
    end_minute: u32,
    timezone: Tz,
}

/// Parse "HH:MM" (24h) into minutes since midnight.
pub fn parse_hhmm(value: &str) -> Option<u32> {
    let (hours, minutes) = value.trim().split_once(':')?;
    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return None;
    }
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

impl CallWindow {
    pub fn new(start: &str, end: &str, timezone: &str) -> Result<Self, WindowError> {
        let start_minute = parse_hhmm(start).ok_or_else(|| WindowError::MalformedTime(start.to_string()))?;
        let end_minute = parse_hhmm(end).ok_or_else(|| WindowError::MalformedTime(end.to_string()))?;
        let timezone: Tz = timezone
            .trim()
            .parse()
            .map_err(|_| WindowError::UnknownTimezone(timezone.to_string()))?;

        if start_minute > end_minute {
            return Err(WindowError::Overnight {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        Ok(Self {
            start_minute,
            end_minute,
            timezone,
        })
    }

    pub fn from_settings(settings: &CampaignSettings) -> Result<Self, WindowError> {
        Self::new(&settings.call_window_start, &settings.call_window_end, &settings.timezone)
    }

    /// Whether `now` falls inside the window, in the window's timezone.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.timezone);
        let minute = local.hour() * 60 + local.minute();
        self.start_minute <= minute && minute <= self.end_minute
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }
}

/// May a campaign with these settings dispatch at `now`? Fails closed.
pub fn may_dispatch(settings: &CampaignSettings, now: DateTime<Utc>) -> bool {
    match CallWindow::from_settings(settings) {
        Ok(window) => window.contains(now),
        Err(e) => {
            log::warn!("Call window not evaluable, refusing dispatch: {}", e);
            false
        }
    }
}
