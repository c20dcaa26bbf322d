use eyre::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use callwave::domain::{DEFAULT_CONCURRENT_CALLS, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY_MINUTES};
use callwave::provider::{VapiConfig, vapi};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub storage: StorageConfig,
    pub provider: ProviderConfig,
    pub campaign: CampaignDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("callwave"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key_env: String,
    pub timeout_ms: u64,
    pub phone_number_id: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: vapi::DEFAULT_BASE_URL.to_string(),
            api_key_env: vapi::DEFAULT_API_KEY_ENV.to_string(),
            timeout_ms: 30000,
            phone_number_id: None,
        }
    }
}

impl ProviderConfig {
    pub fn to_vapi_config(&self) -> VapiConfig {
        VapiConfig {
            base_url: self.base_url.clone(),
            api_key_env: self.api_key_env.clone(),
            phone_number_id: self.phone_number_id.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

/// Settings applied to campaigns created from the command line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignDefaults {
    pub default_retry_delay_minutes: u32,
    pub default_max_attempts: u32,
    pub default_concurrent_calls: u32,
}

impl Default for CampaignDefaults {
    fn default() -> Self {
        Self {
            default_retry_delay_minutes: DEFAULT_RETRY_DELAY_MINUTES,
            default_max_attempts: DEFAULT_MAX_ATTEMPTS,
            default_concurrent_calls: DEFAULT_CONCURRENT_CALLS,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            storage: StorageConfig::default(),
            provider: ProviderConfig::default(),
            campaign: CampaignDefaults::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_name = env!("CARGO_PKG_NAME");

        // Try local file first: ./<project>.yml
        let local_config = PathBuf::from(format!("{}.yml", project_name));
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Then ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.campaign.default_concurrent_calls == 0 {
            bail!("campaign.default_concurrent_calls must be at least 1");
        }
        if self.campaign.default_max_attempts == 0 {
            bail!("campaign.default_max_attempts must be at least 1");
        }
        if self.provider.timeout_ms == 0 {
            bail!("provider.timeout_ms must be greater than 0");
        }
        Ok(())
    }
}
