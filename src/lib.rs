//! Callwave - outbound campaign dialing for voice AI assistants
//!
//! Callwave runs outbound calling campaigns through a voice AI provider and
//! keeps call records in step with the provider's asynchronous lifecycle
//! events: it decides when a contact may be called, how many calls run at
//! once, what happens when a call fails, and how call outcomes roll up into
//! campaign stats.

pub mod campaign;
pub mod domain;
pub mod error;
pub mod id;
pub mod lifecycle;
pub mod provider;
pub mod scheduler;
pub mod storage;

pub use error::{CallwaveError, Result};
