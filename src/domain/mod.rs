//! Domain types for Callwave
//!
//! This module contains all core domain types:
//! - Campaign: an outbound-calling job with settings and a cached stats rollup
//! - CampaignContact: per-contact progress inside a campaign
//! - Contact / Assistant: the dialled person and the voice persona
//! - Call: the call log, driven by provider lifecycle events
//! - Appointment: bookings made by an assistant during a call

pub mod appointment;
pub mod assistant;
pub mod call;
pub mod campaign;
pub mod contact;

pub use appointment::{Appointment, BookingRequest};
pub use assistant::Assistant;
pub use call::{Call, CallDirection, CallStatus, Sentiment};
pub use campaign::{
    Campaign, CampaignSettings, CampaignStats, CampaignStatus, DEFAULT_CONCURRENT_CALLS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_RETRY_DELAY_MINUTES,
};
pub use contact::{CampaignContact, Contact, ContactStatus};
