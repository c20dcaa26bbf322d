//! Retry scheduling for campaign contacts.
//!
//! Two situations push a contact's `next_attempt_at` into the future:
//! - a dispatch attempt failed and the contact still has attempts left
//! - the call window refused dispatch (not an attempt, `attempts` untouched)

use chrono::{DateTime, Duration, Utc};

use crate::domain::{CampaignContact, CampaignSettings, ContactStatus, DEFAULT_RETRY_DELAY_MINUTES};

/// Result tag stored on a contact whose dispatch failed.
pub const ERROR_RESULT: &str = "error";

/// What happens to a contact after a failed dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again once `at` has passed.
    Reschedule { at: DateTime<Utc> },
    /// Attempt budget spent; the contact is failed for good.
    Exhausted,
}

/// Retry delay for one campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    delay_minutes: u32,
}

impl RetryPolicy {
    pub fn new(delay_minutes: u32) -> Self {
        Self { delay_minutes }
    }

    pub fn from_settings(settings: &CampaignSettings) -> Self {
        Self::new(settings.retry_delay_minutes())
    }

    pub fn delay(&self) -> Duration {
        Duration::minutes(i64::from(self.delay_minutes))
    }

    /// `now + retry_delay_minutes`
    pub fn next_attempt_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.delay()
    }

    /// Window refused dispatch: push the contact back without spending an attempt.
    ///
    /// Status is left alone, so a never-dialled contact stays pending.
    pub fn defer(&self, contact: &mut CampaignContact, now: DateTime<Utc>) {
        contact.next_attempt_at = Some(self.next_attempt_at(now));
        contact.touch();
    }

    /// Record a failed attempt. The caller has already incremented `attempts`.
    pub fn after_failure(&self, contact: &mut CampaignContact, now: DateTime<Utc>) -> RetryDecision {
        contact.result = Some(ERROR_RESULT.to_string());
        contact.touch();

        if contact.has_attempts_left() {
            let at = self.next_attempt_at(now);
            contact.status = ContactStatus::Scheduled;
            contact.next_attempt_at = Some(at);
            RetryDecision::Reschedule { at }
        } else {
            contact.status = ContactStatus::Failed;
            contact.next_attempt_at = None;
            contact.completed_at = Some(now);
            RetryDecision::Exhausted
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_DELAY_MINUTES)
    }
}
