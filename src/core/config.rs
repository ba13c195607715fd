use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

const DEFAULT_VATCOMPLY_URL: &str = "https://api.vatcomply.com";

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct VatComplyProviderConfig {
    pub base_url: String,
    /// Base currency to request. The service picks its own base when absent.
    pub base: Option<String>,
    pub retries: usize,
    pub retry_delay_ms: u64,
}

impl Default for VatComplyProviderConfig {
    fn default() -> Self {
        VatComplyProviderConfig {
            base_url: DEFAULT_VATCOMPLY_URL.to_string(),
            base: None,
            retries: 3,
            retry_delay_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub vatcomply: VatComplyProviderConfig,
}

/// Where the rate snapshot is persisted and how long it stays fresh.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub key: String,
    pub expiry_secs: u64,
}

impl CacheConfig {
    pub fn expiry(&self) -> chrono::Duration {
        i64::try_from(self.expiry_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            key: "currency_converter_cache".to_string(),
            expiry_secs: 5 * 60,
        }
    }
}

/// Keys for remembered selections and the values used when nothing is remembered.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    pub amount_key: String,
    pub from_key: String,
    pub to_key: String,
    pub default_amount: String,
    pub default_from: String,
    pub default_to: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            amount_key: "currency_converter_amount".to_string(),
            from_key: "currency_converter_from".to_string(),
            to_key: "currency_converter_to".to_string(),
            default_amount: "1".to_string(),
            default_from: "USD".to_string(),
            default_to: "EUR".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub session: SessionConfig,
    pub data_path: Option<String>,
    /// Treat the network as unavailable; cached rates are used as-is.
    #[serde(default)]
    pub offline: bool,
}

impl AppConfig {
    /// Loads the config from the default location, falling back to defaults
    /// when no file has been set up yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "xfx", "xfx")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "xfx", "xfx")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
