//! Scheduling primitives for campaign dispatch.
//!
//! This module provides:
//! - **Call window**: may a campaign dispatch right now, in its own timezone?
//! - **Retry policy**: when a failed or deferred contact becomes eligible again.
//! - **Batching**: fixed-size groups that bound in-flight provider requests.
//!
//! All three are pure with respect to storage; the campaign dispatcher and
//! orchestrator apply their results.

mod batch;
mod retry;
mod window;

pub use batch::partition;
pub use retry::{ERROR_RESULT, RetryDecision, RetryPolicy};
pub use window::{CallWindow, WindowError, may_dispatch, parse_hhmm};
