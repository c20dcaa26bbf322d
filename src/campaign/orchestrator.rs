//! Campaign orchestrator: one forward pass over a campaign's eligible contacts.
//!
//! Contacts are dispatched in fixed-size batches. Within a batch every
//! dispatch runs as its own task; the next batch starts only once all tasks
//! of the previous one have resolved. Campaign status is re-read before each
//! batch so an external pause or cancel stops the run between batches.
//!
//! The clock is read once when the run starts, again by every dispatch and
//! once at completion, so a run that outlasts the call window stops dialling
//! when the window closes.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::dispatcher::{DispatchOutcome, Dispatcher};
use super::stats::StatsAggregator;
use crate::domain::{CampaignStatus, CampaignStats};
use crate::error::{CallwaveError, Result};
use crate::provider::VoiceProvider;
use crate::scheduler::{CallWindow, partition};
use crate::storage::{CampaignContactStore, CampaignStore, DirectoryStore, Storage};

/// Per-run dispatch tallies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub batches: usize,
    pub placed: usize,
    pub deferred: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Dispatches that hit a storage error or panicked
    pub errors: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Placed { .. } => self.placed += 1,
            DispatchOutcome::Deferred { .. } => self.deferred += 1,
            DispatchOutcome::Failed { .. } => self.failed += 1,
            DispatchOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn attempted(&self) -> usize {
        self.placed + self.deferred + self.failed + self.skipped + self.errors
    }
}

/// Source of the current time for a run
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// How an orchestrator run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Every batch ran and the campaign is now completed
    Completed { summary: RunSummary, stats: Option<CampaignStats> },
    /// The call window deferred every contact; the campaign is back to scheduled
    Rescheduled { summary: RunSummary },
    /// No contact was eligible; campaign untouched
    NothingToCall,
    /// Campaign was paused or cancelled externally; it was not completed
    Aborted { status: CampaignStatus, summary: RunSummary },
}

/// Drives dispatch across a campaign.
pub struct CampaignOrchestrator<S: Storage + 'static> {
    storage: Arc<S>,
    dispatcher: Arc<Dispatcher<S>>,
}

impl<S: Storage + 'static> CampaignOrchestrator<S> {
    pub fn new(storage: Arc<S>, provider: Arc<dyn VoiceProvider>) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&storage), provider));
        Self { storage, dispatcher }
    }

    /// Run the campaign against the wall clock.
    pub async fn run(&self, campaign_id: &str) -> Result<RunOutcome> {
        self.run_with_clock(campaign_id, Arc::new(Utc::now)).await
    }

    /// Run the campaign with time frozen at `now`.
    pub async fn run_at(&self, campaign_id: &str, now: DateTime<Utc>) -> Result<RunOutcome> {
        self.run_with_clock(campaign_id, Arc::new(move || now)).await
    }

    /// Run the campaign, reading the time from `clock`.
    ///
    /// Configuration problems fail before any status change. Rescheduled
    /// contacts are left for a later run.
    pub async fn run_with_clock(&self, campaign_id: &str, clock: Clock) -> Result<RunOutcome> {
        let now = clock();
        let campaigns = CampaignStore::new(self.storage.as_ref());
        let mut campaign = campaigns.require(campaign_id)?;

        if !campaign.status.can_start() {
            return Err(CallwaveError::InvalidState(format!(
                "campaign {} is {} and cannot be started",
                campaign.id, campaign.status
            )));
        }

        let assistant = DirectoryStore::new(self.storage.as_ref()).require_assistant(&campaign.assistant_id)?;
        let assistant_external_id = assistant
            .provider_id()
            .ok_or_else(|| {
                CallwaveError::Configuration(format!("assistant {} has no provider id configured", assistant.id))
            })?
            .to_string();

        CallWindow::from_settings(&campaign.settings)
            .map_err(|e| CallwaveError::Configuration(format!("campaign {}: {}", campaign.id, e)))?;
        if campaign.settings.concurrent_calls == 0 {
            return Err(CallwaveError::Configuration(format!(
                "campaign {}: concurrent_calls must be at least 1",
                campaign.id
            )));
        }

        let eligible = CampaignContactStore::new(self.storage.as_ref()).find_eligible(&campaign.id, now)?;
        if eligible.is_empty() {
            log::info!("Campaign {}: nothing to call", campaign.id);
            return Ok(RunOutcome::NothingToCall);
        }

        let previous = campaign.status;
        campaign.status = CampaignStatus::Running;
        campaign.started_at = Some(now);
        campaign.completed_at = None;
        campaign.touch();
        if !campaigns.update_if_status(&campaign, previous)? {
            return Err(CallwaveError::InvalidState(format!(
                "campaign {} changed status while starting",
                campaign.id
            )));
        }

        let ids: Vec<String> = eligible.into_iter().map(|cc| cc.id).collect();
        let batches = partition(ids, campaign.settings.concurrent_calls as usize);
        log::info!(
            "Campaign {} running: {} batch(es) of up to {} via {}",
            campaign.id,
            batches.len(),
            campaign.settings.concurrent_calls,
            self.dispatcher.provider_name()
        );

        let campaign = Arc::new(campaign);
        let assistant_external_id = Arc::new(assistant_external_id);
        let mut summary = RunSummary::default();

        for (index, batch) in batches.into_iter().enumerate() {
            let status = campaigns.require(&campaign.id)?.status;
            if status.is_halted() {
                log::warn!("Campaign {} is {}, stopping before batch {}", campaign.id, status, index + 1);
                return Ok(RunOutcome::Aborted { status, summary });
            }

            let mut handles = Vec::with_capacity(batch.len());
            for cc_id in batch {
                let dispatcher = Arc::clone(&self.dispatcher);
                let campaign = Arc::clone(&campaign);
                let assistant_external_id = Arc::clone(&assistant_external_id);
                let clock = Arc::clone(&clock);
                let handle = tokio::spawn(async move {
                    let outcome = dispatcher
                        .dispatch(&campaign, &assistant_external_id, &cc_id, clock())
                        .await;
                    (cc_id, outcome)
                });
                handles.push(handle);
            }

            let size = handles.len();
            for joined in futures::future::join_all(handles).await {
                match joined {
                    Ok((_, Ok(outcome))) => summary.record(&outcome),
                    Ok((cc_id, Err(e))) => {
                        summary.errors += 1;
                        tracing::error!(campaign_id = %campaign.id, contact = %cc_id, error = %e, "Dispatch error");
                    }
                    Err(e) => {
                        summary.errors += 1;
                        tracing::error!(campaign_id = %campaign.id, error = ?e, "Dispatch task panicked");
                    }
                }
            }
            summary.batches += 1;

            tracing::info!(
                campaign_id = %campaign.id,
                batch = index + 1,
                size,
                placed = summary.placed,
                failed = summary.failed,
                "Batch resolved"
            );
        }

        let mut completed = campaigns.require(&campaign.id)?;
        if completed.status != CampaignStatus::Running {
            log::warn!("Campaign {} is {} after the last batch, not completing", completed.id, completed.status);
            return Ok(RunOutcome::Aborted {
                status: completed.status,
                summary,
            });
        }

        // Nobody was dialled: the window was closed for the whole pass
        if summary.placed + summary.failed == 0 && summary.deferred > 0 {
            completed.status = CampaignStatus::Scheduled;
            completed.touch();
            if !campaigns.update_if_status(&completed, CampaignStatus::Running)? {
                let status = campaigns.require(&campaign.id)?.status;
                return Ok(RunOutcome::Aborted { status, summary });
            }
            log::info!(
                "Campaign {} rescheduled: all {} contact(s) deferred by the call window",
                campaign.id,
                summary.deferred
            );
            return Ok(RunOutcome::Rescheduled { summary });
        }

        completed.status = CampaignStatus::Completed;
        completed.completed_at = Some(clock());
        completed.touch();
        if !campaigns.update_if_status(&completed, CampaignStatus::Running)? {
            let status = campaigns.require(&campaign.id)?.status;
            return Ok(RunOutcome::Aborted { status, summary });
        }

        let stats = match StatsAggregator::new(self.storage.as_ref()).refresh(&campaign.id) {
            Ok(stats) => Some(stats),
            Err(e) => {
                log::error!("Stats refresh failed for campaign {}: {}", campaign.id, e);
                None
            }
        };

        log::info!(
            "Campaign {} completed: placed={} deferred={} failed={} skipped={} errors={}",
            campaign.id,
            summary.placed,
            summary.deferred,
            summary.failed,
            summary.skipped,
            summary.errors
        );
        Ok(RunOutcome::Completed { summary, stats })
    }
}
