//! Voice provider layer
//!
//! This module provides:
//! - VoiceProvider trait for outbound call creation
//! - VapiClient implementation over HTTP

pub mod client;
pub mod vapi;

pub use client::{Customer, OutboundCall, OutboundCallRequest, ProviderError, VoiceProvider};
pub use vapi::{VapiClient, VapiConfig};
