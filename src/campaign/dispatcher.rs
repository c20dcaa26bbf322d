//! Outbound dispatcher: one call attempt for one campaign contact.
//!
//! Provider failures never escape `dispatch`; they become bookkeeping on the
//! contact (reschedule or terminal failure). Only storage errors propagate.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::{Call, CallDirection, Campaign, CampaignContact, ContactStatus};
use crate::error::{CallwaveError, Result};
use crate::provider::{Customer, OutboundCallRequest, ProviderError, VoiceProvider};
use crate::scheduler::{RetryDecision, RetryPolicy, may_dispatch};
use crate::storage::{CAMPAIGN_CONTACTS_COLLECTION, CallStore, CampaignContactStore, DirectoryStore, Storage};

/// What one dispatch did.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Provider accepted the call; a Call record now exists
    Placed { call_id: String, external_call_id: String },
    /// Call window closed; rescheduled without spending an attempt
    Deferred { until: DateTime<Utc> },
    /// Provider refused or was unreachable
    Failed { error: String, decision: RetryDecision },
    /// Contact no longer eligible (terminal or changed concurrently)
    Skipped,
}

/// Places outbound calls for campaign contacts.
pub struct Dispatcher<S: Storage> {
    storage: Arc<S>,
    provider: Arc<dyn VoiceProvider>,
}

impl<S: Storage> Dispatcher<S> {
    pub fn new(storage: Arc<S>, provider: Arc<dyn VoiceProvider>) -> Self {
        Self { storage, provider }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Attempt one outbound call for `campaign_contact_id` at `now`.
    ///
    /// `assistant_external_id` is the provider-side assistant id, resolved
    /// once per run by the orchestrator.
    pub async fn dispatch(
        &self,
        campaign: &Campaign,
        assistant_external_id: &str,
        campaign_contact_id: &str,
        now: DateTime<Utc>,
    ) -> Result<DispatchOutcome> {
        let contacts = CampaignContactStore::new(self.storage.as_ref());
        let policy = RetryPolicy::from_settings(&campaign.settings);

        let mut cc = contacts
            .get(campaign_contact_id)?
            .ok_or_else(|| CallwaveError::not_found(CAMPAIGN_CONTACTS_COLLECTION, campaign_contact_id))?;

        if !cc.is_eligible(now) {
            log::debug!("Contact {} not eligible ({}), skipping", cc.id, cc.status.as_str());
            return Ok(DispatchOutcome::Skipped);
        }

        if !may_dispatch(&campaign.settings, now) {
            policy.defer(&mut cc, now);
            let until = cc.next_attempt_at.unwrap_or(now);
            if !contacts.update_if_open(&cc)? {
                return Ok(DispatchOutcome::Skipped);
            }
            log::info!("Contact {} deferred to {} (outside call window)", cc.id, until);
            return Ok(DispatchOutcome::Deferred { until });
        }

        cc.attempts += 1;
        cc.last_attempt_at = Some(now);
        cc.touch();
        if !contacts.update_if_open(&cc)? {
            return Ok(DispatchOutcome::Skipped);
        }

        let request = match self.build_request(campaign, assistant_external_id, &cc) {
            Ok(request) => request,
            Err(e) => return self.record_failure(&contacts, &policy, cc, e, now),
        };

        match self.provider.create_outbound_call(request).await {
            Ok(placed) => {
                let mut call = Call::new_in_progress(
                    CallDirection::Outbound,
                    campaign.organization_id.clone(),
                    Some(placed.external_call_id.clone()),
                    now,
                );
                call.assistant_id = Some(campaign.assistant_id.clone());
                call.contact_id = Some(cc.contact_id.clone());
                call.campaign_id = Some(campaign.id.clone());
                call.metadata = json!({
                    "campaignContactId": cc.id,
                    "providerStatus": placed.status,
                });
                CallStore::new(self.storage.as_ref()).create(&call)?;

                // Held back until the call reports its outcome
                cc.status = ContactStatus::Scheduled;
                cc.next_attempt_at = Some(policy.next_attempt_at(now));
                cc.call_log_id = Some(call.id.clone());
                cc.touch();
                if !contacts.update_if_open(&cc)? {
                    log::warn!(
                        "Contact {} closed while call {} was being placed; link not stored",
                        cc.id,
                        call.id
                    );
                }

                log::info!(
                    "Placed call {} ({}) for contact {} attempt {}/{}",
                    call.id,
                    placed.external_call_id,
                    cc.id,
                    cc.attempts,
                    cc.max_attempts
                );
                Ok(DispatchOutcome::Placed {
                    call_id: call.id,
                    external_call_id: placed.external_call_id,
                })
            }
            Err(e) => self.record_failure(&contacts, &policy, cc, e, now),
        }
    }

    fn build_request(
        &self,
        campaign: &Campaign,
        assistant_external_id: &str,
        cc: &CampaignContact,
    ) -> std::result::Result<OutboundCallRequest, ProviderError> {
        let contact = DirectoryStore::new(self.storage.as_ref())
            .contact(&cc.contact_id)
            .map_err(|e| ProviderError::Validation(format!("contact {} unreadable: {}", cc.contact_id, e)))?
            .ok_or_else(|| ProviderError::Validation(format!("contact {} does not exist", cc.contact_id)))?;

        let request = OutboundCallRequest {
            assistant_external_id: assistant_external_id.to_string(),
            customer: Customer {
                number: contact.phone_number,
                name: contact.name,
            },
            metadata: json!({
                "campaignId": campaign.id,
                "campaignContactId": cc.id,
            }),
        };
        request.validate()?;
        Ok(request)
    }

    fn record_failure(
        &self,
        contacts: &CampaignContactStore<'_, S>,
        policy: &RetryPolicy,
        mut cc: CampaignContact,
        error: ProviderError,
        now: DateTime<Utc>,
    ) -> Result<DispatchOutcome> {
        let decision = policy.after_failure(&mut cc, now);
        if !contacts.update_if_open(&cc)? {
            return Ok(DispatchOutcome::Skipped);
        }

        match decision {
            RetryDecision::Reschedule { at } => log::warn!(
                "Dispatch failed for contact {} (attempt {}/{}), retry at {}: {}",
                cc.id,
                cc.attempts,
                cc.max_attempts,
                at,
                error
            ),
            RetryDecision::Exhausted => log::warn!(
                "Dispatch failed for contact {} on final attempt {}: {}",
                cc.id,
                cc.attempts,
                error
            ),
        }

        Ok(DispatchOutcome::Failed {
            error: format!("{}: {}", error.kind(), error),
            decision,
        })
    }
}

impl<S: Storage> std::fmt::Debug for Dispatcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("provider", &self.provider.name())
            .finish()
    }
}
