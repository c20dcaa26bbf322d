//! Campaign stats rollup.
//!
//! Stats are always recomputed from campaign contacts and the calls they
//! link to; the copy stored on the campaign is a cache.

use std::collections::HashSet;

use crate::domain::{Call, CampaignContact, CampaignStats, ContactStatus};
use crate::error::Result;
use crate::storage::{CallStore, CampaignContactStore, CampaignStore, Storage};

/// Attempts at writing stats before giving up on a campaign that keeps changing.
const WRITE_ATTEMPTS: usize = 3;

/// Compute stats for one campaign.
///
/// `calls` may contain calls not linked to any contact; only calls referenced
/// by a contact's `call_log_id` contribute duration and cost.
pub fn compute(contacts: &[CampaignContact], calls: &[Call]) -> CampaignStats {
    let total_contacts = contacts.len() as u32;
    let calls_made = contacts.iter().filter(|cc| cc.status != ContactStatus::Pending).count() as u32;
    let calls_completed = contacts
        .iter()
        .filter(|cc| cc.status == ContactStatus::Completed)
        .count() as u32;
    let calls_failed = contacts.iter().filter(|cc| cc.status == ContactStatus::Failed).count() as u32;

    let linked: HashSet<&str> = contacts.iter().filter_map(|cc| cc.call_log_id.as_deref()).collect();
    let linked_calls: Vec<&Call> = calls.iter().filter(|c| linked.contains(c.id.as_str())).collect();

    let durations: Vec<u32> = linked_calls.iter().filter_map(|c| c.duration_seconds).collect();
    let avg_duration = if durations.is_empty() {
        0.0
    } else {
        durations.iter().map(|d| f64::from(*d)).sum::<f64>() / durations.len() as f64
    };
    let total_cost = linked_calls.iter().filter_map(|c| c.cost).sum();

    let success_rate = if calls_made == 0 {
        0.0
    } else {
        f64::from(calls_completed) / f64::from(calls_made) * 100.0
    };

    CampaignStats {
        total_contacts,
        calls_made,
        calls_answered: calls_completed,
        calls_completed,
        calls_failed,
        success_rate,
        avg_duration,
        total_cost,
    }
}

/// Recomputes and caches campaign stats.
pub struct StatsAggregator<'a, S: Storage> {
    storage: &'a S,
}

impl<'a, S: Storage> StatsAggregator<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    /// Compute stats from the current records without writing them.
    pub fn snapshot(&self, campaign_id: &str) -> Result<CampaignStats> {
        let contacts = CampaignContactStore::new(self.storage).find_by_campaign(campaign_id)?;
        let calls = CallStore::new(self.storage).find_by_campaign(campaign_id)?;
        Ok(compute(&contacts, &calls))
    }

    /// Recompute stats and store them on the campaign.
    ///
    /// Only the `stats` field is replaced; the write is conditional on the
    /// campaign status so a concurrent status change is never reverted.
    pub fn refresh(&self, campaign_id: &str) -> Result<CampaignStats> {
        let campaigns = CampaignStore::new(self.storage);
        let stats = self.snapshot(campaign_id)?;

        for _ in 0..WRITE_ATTEMPTS {
            let mut campaign = campaigns.require(campaign_id)?;
            if campaign.stats == stats {
                return Ok(stats);
            }
            let status = campaign.status;
            campaign.stats = stats.clone();
            campaign.touch();
            if campaigns.update_if_status(&campaign, status)? {
                log::debug!(
                    "Stats refreshed for campaign {}: made={} completed={} failed={}",
                    campaign_id,
                    stats.calls_made,
                    stats.calls_completed,
                    stats.calls_failed
                );
                return Ok(stats);
            }
        }

        log::warn!("Campaign {} kept changing, stats left stale", campaign_id);
        Ok(stats)
    }
}
