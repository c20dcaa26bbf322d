//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use callwave::domain::{Assistant, Campaign, CampaignContact, CampaignSettings, CampaignStatus, Contact};
use callwave::provider::{OutboundCall, OutboundCallRequest, ProviderError, VoiceProvider};
use callwave::storage::{CampaignContactStore, CampaignStore, DirectoryStore, JsonlStorage};
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

/// Monday 2026-05-04 12:00 UTC
pub fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap()
}

/// How the mock provider answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    Accept,
    Reject,
}

/// Records requests and answers with a fixed behaviour.
pub struct MockProvider {
    behaviour: Behaviour,
    pub requests: std::sync::Mutex<Vec<OutboundCallRequest>>,
    counter: AtomicUsize,
    /// Campaign to pause on the first request
    pause: Option<(Arc<JsonlStorage>, String)>,
}

impl MockProvider {
    pub fn new(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            requests: std::sync::Mutex::new(Vec::new()),
            counter: AtomicUsize::new(0),
            pause: None,
        }
    }

    /// Accepts calls and pauses `campaign_id` while the first one is placed
    pub fn pausing(storage: Arc<JsonlStorage>, campaign_id: &str) -> Self {
        Self {
            pause: Some((storage, campaign_id.to_string())),
            ..Self::new(Behaviour::Accept)
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl VoiceProvider for MockProvider {
    async fn create_outbound_call(&self, request: OutboundCallRequest) -> Result<OutboundCall, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let n = self.counter.fetch_add(1, Ordering::SeqCst);

        if let Some((storage, campaign_id)) = &self.pause {
            if n == 0 {
                let store = CampaignStore::new(storage.as_ref());
                let mut campaign = store.require(campaign_id).unwrap();
                campaign.status = CampaignStatus::Paused;
                store.update(&campaign).unwrap();
            }
        }

        match self.behaviour {
            Behaviour::Accept => Ok(OutboundCall {
                external_call_id: format!("vapi-{}", n),
                status: "queued".to_string(),
            }),
            Behaviour::Reject => Err(ProviderError::ApiError {
                status: 400,
                message: "Couldn't create call".to_string(),
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub struct Fixture {
    pub storage: Arc<JsonlStorage>,
    pub campaign: Campaign,
    pub contacts: Vec<CampaignContact>,
    _temp: TempDir,
}

impl Fixture {
    pub fn new(settings: CampaignSettings, contact_count: usize) -> Self {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(JsonlStorage::new(temp.path()).unwrap());
        let directory = DirectoryStore::new(storage.as_ref());

        let assistant = Assistant::new("org-1", "Sophie", Some("asst_ext_1".to_string()));
        directory.create_assistant(&assistant).unwrap();

        let max_attempts = settings.max_attempts;
        let campaign = Campaign::new("org-1", &assistant.id, "Relance clients", settings);
        CampaignStore::new(storage.as_ref()).create(&campaign).unwrap();

        let mut contacts = Vec::new();
        for i in 0..contact_count {
            let contact = Contact::new("org-1", format!("+336123456{:02}", i)).with_name(format!("Client {}", i));
            directory.create_contact(&contact).unwrap();
            let cc = CampaignContact::new(&campaign.id, &contact.id, max_attempts);
            CampaignContactStore::new(storage.as_ref()).create(&cc).unwrap();
            contacts.push(cc);
        }

        Self {
            storage,
            campaign,
            contacts,
            _temp: temp,
        }
    }

    pub fn contact(&self, index: usize) -> CampaignContact {
        CampaignContactStore::new(self.storage.as_ref())
            .get(&self.contacts[index].id)
            .unwrap()
            .unwrap()
    }

    pub fn all_contacts(&self) -> Vec<CampaignContact> {
        CampaignContactStore::new(self.storage.as_ref())
            .find_by_campaign(&self.campaign.id)
            .unwrap()
    }

    pub fn campaign(&self) -> Campaign {
        CampaignStore::new(self.storage.as_ref()).require(&self.campaign.id).unwrap()
    }
}
