use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::constants::{limits, tracking};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub movies: MoviesConfig,

    pub series: SeriesConfig,

    pub library: LibraryConfig,

    pub transfer: TransferConfig,

    pub tracking: TrackingConfig,

    pub wizard: WizardConfig,

    pub server: ServerConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Timeout applied to every backend HTTP call.
    pub request_timeout_seconds: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            worker_threads: 2,
            request_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MoviesConfig {
    pub url: String,

    pub api_key: String,

    /// Root folder every new movie is added under. Users are never prompted for it.
    pub root_folder: String,

    pub monitor: bool,
}

impl Default for MoviesConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:7878".to_string(),
            api_key: String::new(),
            root_folder: "/movies".to_string(),
            monitor: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesConfig {
    pub enabled: bool,

    pub url: String,

    pub api_key: String,

    pub root_folder: String,

    pub monitor: bool,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "http://localhost:8989".to_string(),
            api_key: String::new(),
            root_folder: "/tv".to_string(),
            monitor: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    pub enabled: bool,

    pub url: String,

    pub token: String,

    pub movies_section_id: Option<u32>,

    pub shows_section_id: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub enabled: bool,

    pub url: String,

    pub username: Option<String>,

    pub password: Option<String>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "http://localhost:9091/transmission/rpc".to_string(),
            username: None,
            password: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub interval_seconds: u64,

    pub max_iterations: u32,

    pub bar_width: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            interval_seconds: tracking::DEFAULT_INTERVAL.as_secs(),
            max_iterations: tracking::DEFAULT_MAX_ITERATIONS,
            bar_width: tracking::DEFAULT_BAR_WIDTH,
        }
    }
}

impl TrackingConfig {
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    /// Selection sessions older than this are dropped.
    pub session_timeout_seconds: u64,

    /// How many search results get the "already held" checks.
    pub existence_check_limit: usize,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            session_timeout_seconds: 180,
            existence_check_limit: limits::DEFAULT_EXISTENCE_CHECKS,
        }
    }
}

impl WizardConfig {
    #[must_use]
    pub const fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 3001,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Config {
    /// Loads the first config file found, then applies environment overrides.
    pub fn load() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                warn!(error = %e, "Failed to read .env file");
            }
        }

        let mut config = Self::load_file()?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("slavarr").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".slavarr").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(&path)?;
            Ok(true)
        }
    }

    /// Overrides fields from environment variables. `lookup` is injected so
    /// tests do not have to touch the process environment.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let flag = |value: String| value.eq_ignore_ascii_case("true");

        if let Some(v) = lookup("LOG_LEVEL") {
            self.general.log_level = v;
        }

        if let Some(v) = lookup("RADARR_URL") {
            self.movies.url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("RADARR_API_KEY") {
            self.movies.api_key = v;
        }
        if let Some(v) = lookup("RADARR_ROOT_FOLDER") {
            self.movies.root_folder = v;
        }
        if let Some(v) = lookup("RADARR_MONITOR") {
            self.movies.monitor = flag(v);
        }

        if let Some(v) = lookup("SONARR_URL") {
            self.series.url = v.trim_end_matches('/').to_string();
            self.series.enabled = true;
        }
        if let Some(v) = lookup("SONARR_API_KEY") {
            self.series.api_key = v;
        }
        if let Some(v) = lookup("SONARR_ROOT_FOLDER") {
            self.series.root_folder = v;
        }
        if let Some(v) = lookup("SONARR_MONITOR") {
            self.series.monitor = flag(v);
        }

        if let Some(v) = lookup("PLEX_URL") {
            self.library.url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("PLEX_TOKEN") {
            self.library.token = v;
        }
        if !self.library.url.is_empty() && !self.library.token.is_empty() {
            self.library.enabled = true;
        }
        if let Some(v) = lookup("PLEX_MOVIES_SECTION_ID").and_then(|v| v.parse().ok()) {
            self.library.movies_section_id = Some(v);
        }
        if let Some(v) = lookup("PLEX_SHOWS_SECTION_ID").and_then(|v| v.parse().ok()) {
            self.library.shows_section_id = Some(v);
        }

        if let Some(v) = lookup("TRANSMISSION_URL") {
            self.transfer.url = v.trim_end_matches('/').to_string();
            self.transfer.enabled = true;
        }
        if let Some(v) = lookup("TRANSMISSION_USER") {
            self.transfer.username = Some(v);
        }
        if let Some(v) = lookup("TRANSMISSION_PASSWORD") {
            self.transfer.password = Some(v);
        }

        if let Some(v) = lookup("PORT").and_then(|v| v.parse().ok()) {
            self.server.port = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.movies.url.is_empty() {
            anyhow::bail!("Radarr URL cannot be empty");
        }

        if self.series.enabled && self.series.url.is_empty() {
            anyhow::bail!("Sonarr URL cannot be empty when enabled");
        }

        if self.library.enabled && self.library.url.is_empty() {
            anyhow::bail!("Plex URL cannot be empty when enabled");
        }

        if self.transfer.enabled && self.transfer.url.is_empty() {
            anyhow::bail!("Transmission URL cannot be empty when enabled");
        }

        if self.tracking.interval_seconds == 0 {
            anyhow::bail!("Tracking interval must be > 0");
        }

        if self.tracking.bar_width == 0 {
            anyhow::bail!("Progress bar width must be > 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tracking.interval_seconds, 10);
        assert_eq!(config.tracking.max_iterations, 30);
        assert_eq!(config.tracking.bar_width, 20);
        assert_eq!(config.movies.root_folder, "/movies");
        assert_eq!(config.series.root_folder, "/tv");
        assert_eq!(config.server.port, 3001);
        assert!(!config.transfer.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[movies]"));
        assert!(toml_str.contains("[series]"));
        assert!(toml_str.contains("[tracking]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [tracking]
            interval_seconds = 5
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.tracking.interval_seconds, 5);
        assert_eq!(config.tracking.max_iterations, 30);
        assert_eq!(config.movies.url, "http://localhost:7878");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("RADARR_URL", "http://radarr:7878/"),
            ("RADARR_MONITOR", "false"),
            ("PLEX_URL", "http://plex:32400"),
            ("PLEX_TOKEN", "secret"),
            ("PLEX_MOVIES_SECTION_ID", "3"),
            ("TRANSMISSION_URL", "http://tm:9091/transmission/rpc"),
            ("PORT", "4000"),
        ]);

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(ToString::to_string));

        assert_eq!(config.movies.url, "http://radarr:7878");
        assert!(!config.movies.monitor);
        assert!(config.library.enabled);
        assert_eq!(config.library.movies_section_id, Some(3));
        assert!(config.transfer.enabled);
        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.tracking.interval_seconds = 0;
        assert!(config.validate().is_err());
    }
}
