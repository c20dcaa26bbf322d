//! Storage layer for Callwave.
//!
//! This module provides the persistence abstraction for campaigns, campaign
//! contacts, contacts, assistants, calls and appointments:
//! - `Storage`: CRUD plus conditional update (`update_if`)
//! - `JsonlStorage`: JSONL files with an in-memory cache
//! - typed stores wrapping a `Storage` with collection-specific queries

mod calls;
mod campaigns;
mod jsonl;
mod traits;

pub use calls::{
    APPOINTMENTS_COLLECTION, ASSISTANTS_COLLECTION, AppointmentStore, CALLS_COLLECTION, CONTACTS_COLLECTION,
    CallStore, DirectoryStore,
};
pub use campaigns::{CAMPAIGN_CONTACTS_COLLECTION, CAMPAIGNS_COLLECTION, CampaignContactStore, CampaignStore};
pub use jsonl::JsonlStorage;
pub use traits::{Filter, FilterOp, HasId, Storage};
