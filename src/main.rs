use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail, eyre};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod cli;
mod config;

use callwave::campaign::{CampaignOrchestrator, RunOutcome, StatsAggregator};
use callwave::domain::{
    Assistant, Campaign, CampaignContact, CampaignSettings, CampaignStats, CampaignStatus, Contact,
};
use callwave::lifecycle::{CallLifecycleReducer, LifecycleEvent, ReduceOutcome};
use callwave::provider::VapiClient;
use callwave::scheduler::CallWindow;
use callwave::storage::{CampaignContactStore, CampaignStore, DirectoryStore, JsonlStorage};
use cli::Cli;
use cli::commands::Commands;
use config::Config;

fn setup_logging(config: &Config) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("callwave")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("callwave.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let default_level = config.log_level.as_deref().unwrap_or("info");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn open_storage(config: &Config) -> Result<Arc<JsonlStorage>> {
    let storage = JsonlStorage::new(&config.storage.data_dir)
        .context(format!("Failed to open storage at {}", config.storage.data_dir.display()))?;
    Ok(Arc::new(storage))
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
        println!("  Data directory: {}", config.storage.data_dir.display());
    }

    let storage = open_storage(config)?;

    match &cli.command {
        Commands::Run { campaign_id } => handle_run_command(campaign_id, storage, config),
        Commands::Event { file } => handle_event_command(file, storage),
        Commands::Stats { campaign_id } => handle_stats_command(campaign_id, &storage),
        Commands::List { status } => handle_list_command(status.as_deref(), &storage),
        Commands::Window { campaign_id } => handle_window_command(campaign_id, &storage),
        Commands::Create {
            name,
            org,
            assistant,
            concurrent,
            window,
            timezone,
            retry_delay,
            max_attempts,
        } => {
            let (start, end) = window
                .split_once('-')
                .ok_or_else(|| eyre!("Window must look like HH:MM-HH:MM, got '{}'", window))?;
            let settings = CampaignSettings {
                concurrent_calls: concurrent.unwrap_or(config.campaign.default_concurrent_calls),
                call_window_start: start.trim().to_string(),
                call_window_end: end.trim().to_string(),
                timezone: timezone.clone(),
                retry_delay_minutes: Some(retry_delay.unwrap_or(config.campaign.default_retry_delay_minutes)),
                max_attempts: max_attempts.unwrap_or(config.campaign.default_max_attempts),
            };
            handle_create_command(name, org, assistant, settings, &storage)
        }
        Commands::AddContact {
            campaign_id,
            phone,
            name,
        } => handle_add_contact_command(campaign_id, phone, name.as_deref(), &storage),
        Commands::AddAssistant { name, org, external_id } => {
            handle_add_assistant_command(name, org, external_id.clone(), &storage)
        }
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

fn handle_run_command(campaign_id: &str, storage: Arc<JsonlStorage>, config: &Config) -> Result<()> {
    info!("Running campaign: {}", campaign_id);
    let provider = VapiClient::new(config.provider.to_vapi_config()).context("Failed to create provider client")?;
    let orchestrator = CampaignOrchestrator::new(storage, Arc::new(provider));

    let outcome = runtime()?
        .block_on(orchestrator.run(campaign_id))
        .context(format!("Campaign {} failed", campaign_id))?;

    match outcome {
        RunOutcome::Completed { summary, stats } => {
            println!("{} {}", "Completed:".green(), campaign_id);
            println!(
                "  {} batch(es): {} placed, {} deferred, {} failed, {} skipped, {} errors",
                summary.batches, summary.placed, summary.deferred, summary.failed, summary.skipped, summary.errors
            );
            if let Some(stats) = stats {
                print_stats(&stats);
            }
        }
        RunOutcome::Rescheduled { summary } => {
            println!("{} {}", "Rescheduled:".yellow(), campaign_id);
            println!("  call window closed; {} contact(s) deferred", summary.deferred);
        }
        RunOutcome::NothingToCall => {
            println!("{} {}", "Nothing to call:".yellow(), campaign_id);
        }
        RunOutcome::Aborted { status, summary } => {
            println!("{} {} is {}", "Stopped:".red(), campaign_id, status);
            println!(
                "  {} dispatch(es) across {} batch(es) before stopping",
                summary.attempted(),
                summary.batches
            );
        }
    }
    Ok(())
}

fn handle_event_command(file: &Path, storage: Arc<JsonlStorage>) -> Result<()> {
    info!("Applying event from: {}", file.display());
    let content = fs::read_to_string(file).context(format!("Failed to read {}", file.display()))?;
    let body: serde_json::Value = serde_json::from_str(&content).context("Event file is not valid JSON")?;

    let event = LifecycleEvent::from_webhook(&body);
    let kind = event.kind().to_string();
    let reducer = CallLifecycleReducer::new(storage);
    let outcome = runtime()?
        .block_on(reducer.apply(event, chrono::Utc::now()))
        .context("Failed to apply event")?;

    match outcome {
        ReduceOutcome::Created { call_id } => println!("{} {} ({})", "Created:".green(), call_id, kind),
        ReduceOutcome::Updated { call_id, status } => {
            println!("{} {} -> {} ({})", "Updated:".green(), call_id, status.as_str(), kind)
        }
        ReduceOutcome::AppointmentBooked {
            call_id,
            appointment_id,
        } => println!("{} {} from call {}", "Booked:".green(), appointment_id, call_id),
        ReduceOutcome::Ignored(reason) => println!("{} {} ({})", "Ignored:".yellow(), reason.as_str(), kind),
    }
    Ok(())
}

fn handle_stats_command(campaign_id: &str, storage: &JsonlStorage) -> Result<()> {
    info!("Refreshing stats for campaign: {}", campaign_id);
    let stats = StatsAggregator::new(storage)
        .refresh(campaign_id)
        .context(format!("Failed to compute stats for {}", campaign_id))?;
    println!("{} {}", "Stats for:".green(), campaign_id);
    print_stats(&stats);
    Ok(())
}

fn print_stats(stats: &CampaignStats) {
    println!("  Contacts:     {}", stats.total_contacts);
    println!("  Calls made:   {}", stats.calls_made);
    println!("  Completed:    {}", stats.calls_completed.to_string().green());
    println!("  Failed:       {}", stats.calls_failed.to_string().red());
    println!("  Success rate: {:.1}%", stats.success_rate);
    println!("  Avg duration: {:.0}s", stats.avg_duration);
    println!("  Total cost:   {:.2}", stats.total_cost);
}

fn handle_list_command(status: Option<&str>, storage: &JsonlStorage) -> Result<()> {
    info!("Listing campaigns - status: {:?}", status);
    let campaigns = CampaignStore::new(storage);
    let list = match status {
        Some(s) => {
            let status: CampaignStatus = s.parse().map_err(|e: String| eyre!(e))?;
            campaigns.find_by_status(status)?
        }
        None => campaigns.list_all()?,
    };

    if list.is_empty() {
        println!("{}", "No campaigns".yellow());
        return Ok(());
    }

    for campaign in list {
        let status = match campaign.status {
            CampaignStatus::Running => campaign.status.as_str().cyan(),
            CampaignStatus::Completed => campaign.status.as_str().green(),
            CampaignStatus::Paused | CampaignStatus::Cancelled => campaign.status.as_str().red(),
            _ => campaign.status.as_str().normal(),
        };
        println!(
            "{}  {:<10}  {}  ({}/{} made, {:.0}% success)",
            campaign.id,
            status,
            campaign.name,
            campaign.stats.calls_made,
            campaign.stats.total_contacts,
            campaign.stats.success_rate
        );
    }
    Ok(())
}

fn handle_window_command(campaign_id: &str, storage: &JsonlStorage) -> Result<()> {
    let campaign = CampaignStore::new(storage).require(campaign_id)?;
    let settings = &campaign.settings;
    let window = CallWindow::from_settings(settings).map_err(|e| eyre!("Campaign {}: {}", campaign_id, e))?;

    let now = chrono::Utc::now();
    let local = now.with_timezone(&window.timezone());
    let label = if window.contains(now) {
        "open".green()
    } else {
        "closed".red()
    };
    println!(
        "Window {}-{} {} is {} (local time {})",
        settings.call_window_start,
        settings.call_window_end,
        settings.timezone,
        label,
        local.format("%H:%M")
    );
    Ok(())
}

fn handle_create_command(
    name: &str,
    org: &str,
    assistant_id: &str,
    settings: CampaignSettings,
    storage: &JsonlStorage,
) -> Result<()> {
    if settings.concurrent_calls == 0 {
        bail!("Concurrent calls must be at least 1");
    }
    CallWindow::from_settings(&settings).map_err(|e| eyre!("Invalid call window: {}", e))?;
    DirectoryStore::new(storage).require_assistant(assistant_id)?;

    let campaign = Campaign::new(org, assistant_id, name, settings);
    CampaignStore::new(storage).create(&campaign)?;
    info!("Created campaign {}", campaign.id);
    println!("{} {}", "Created campaign:".green(), campaign.id);
    Ok(())
}

fn handle_add_contact_command(campaign_id: &str, phone: &str, name: Option<&str>, storage: &JsonlStorage) -> Result<()> {
    let campaign = CampaignStore::new(storage).require(campaign_id)?;

    let mut contact = Contact::new(&campaign.organization_id, phone);
    if let Some(name) = name {
        contact = contact.with_name(name);
    }
    DirectoryStore::new(storage).create_contact(&contact)?;

    let cc = CampaignContact::new(&campaign.id, &contact.id, campaign.settings.max_attempts);
    CampaignContactStore::new(storage).create(&cc)?;
    println!("{} {} ({})", "Added contact:".green(), cc.id, phone);
    Ok(())
}

fn handle_add_assistant_command(
    name: &str,
    org: &str,
    external_id: Option<String>,
    storage: &JsonlStorage,
) -> Result<()> {
    let assistant = Assistant::new(org, name, external_id);
    DirectoryStore::new(storage).create_assistant(&assistant)?;
    println!("{} {}", "Added assistant:".green(), assistant.id);
    if assistant.provider_id().is_none() {
        println!("{}", "  No provider id set; campaigns using it cannot run".yellow());
    }
    Ok(())
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging
    setup_logging(&config).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
