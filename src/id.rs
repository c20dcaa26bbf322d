//! ID generation utilities for Callwave
//!
//! Every record id is prefixed with its kind so ids stay readable in logs and
//! JSONL files.

use chrono::Utc;
use rand::Rng;

pub const CAMPAIGN_PREFIX: &str = "cmp";
pub const CAMPAIGN_CONTACT_PREFIX: &str = "cc";
pub const CONTACT_PREFIX: &str = "ct";
pub const ASSISTANT_PREFIX: &str = "ast";
pub const CALL_PREFIX: &str = "call";
pub const APPOINTMENT_PREFIX: &str = "apt";

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Generate a unique record ID
///
/// Format: `{prefix}-{timestamp_ms}-{random_hex}`
/// Example: `call-1738300800123-a1b2c3d4`
pub fn generate_id(prefix: &str) -> String {
    let random: u32 = rand::rng().random();
    format!("{}-{}-{:08x}", prefix, now_ms(), random)
}
