//! Call lifecycle handling
//!
//! This module provides:
//! - LifecycleEvent: tagged union parsed from provider webhooks
//! - CallLifecycleReducer: applies events to calls and campaign contacts
//! - sentiment: keyword heuristic run when a call ends

pub mod event;
pub mod reducer;
pub mod sentiment;

pub use event::{CallReport, LifecycleEvent, TranscriptUpdate};
pub use reducer::{BOOK_APPOINTMENT, CallLifecycleReducer, IgnoreReason, ReduceOutcome};
pub use sentiment::classify as classify_sentiment;
