//! Campaign execution.
//!
//! - `Dispatcher`: one outbound call attempt for one campaign contact
//! - `CampaignOrchestrator`: batched forward pass over a campaign
//! - `StatsAggregator`: recomputes the cached campaign stats

mod dispatcher;
mod orchestrator;
pub mod stats;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use orchestrator::{CampaignOrchestrator, Clock, RunOutcome, RunSummary};
pub use stats::StatsAggregator;
