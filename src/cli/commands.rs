//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: one orchestrator pass over a campaign
//! - event: apply a provider webhook payload
//! - stats / list / window: inspect campaigns
//! - create / add-contact / add-assistant: seed records

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Callwave - outbound campaign dialer for voice AI assistants
#[derive(Parser, Debug)]
#[command(name = "callwave")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dispatch every eligible contact of a campaign once
    Run {
        /// Campaign ID
        campaign_id: String,
    },

    /// Apply a provider webhook payload read from a JSON file
    Event {
        /// Path to the webhook body
        file: PathBuf,
    },

    /// Recompute and show campaign stats
    Stats {
        /// Campaign ID
        campaign_id: String,
    },

    /// List campaigns
    List {
        /// Filter by status (draft, scheduled, running, paused, completed, cancelled)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Show whether a campaign may dispatch right now
    Window {
        /// Campaign ID
        campaign_id: String,
    },

    /// Create a draft campaign
    Create {
        /// Campaign name
        name: String,

        /// Organization ID
        #[arg(short, long)]
        org: String,

        /// Assistant ID
        #[arg(short, long)]
        assistant: String,

        /// Calls placed at once (defaults from config)
        #[arg(long)]
        concurrent: Option<u32>,

        /// Call window as HH:MM-HH:MM
        #[arg(short, long, default_value = "09:00-18:00")]
        window: String,

        /// IANA timezone of the call window
        #[arg(short = 'z', long, default_value = "UTC")]
        timezone: String,

        /// Minutes before a failed contact is retried (defaults from config)
        #[arg(long)]
        retry_delay: Option<u32>,

        /// Attempts per contact (defaults from config)
        #[arg(long)]
        max_attempts: Option<u32>,
    },

    /// Add a contact to a campaign
    AddContact {
        /// Campaign ID
        campaign_id: String,

        /// Phone number in E.164 form
        #[arg(short, long)]
        phone: String,

        /// Display name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Register an assistant
    AddAssistant {
        /// Assistant name
        name: String,

        /// Organization ID
        #[arg(short, long)]
        org: String,

        /// Assistant ID on the voice provider
        #[arg(short, long)]
        external_id: Option<String>,
    },
}
