//! Configuration module for edcm-monitor.
//!
//! Handles loading configuration from a TOML file and CLI overrides, validating it, and turning
//! it into the core's runtime [`MonitorConfig`].

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use edcm_core::config::{MonitorConfig, WatchConfig, WatchTarget};
use thiserror::Error;

use crate::config::file::{FileConfig, WatchSection};

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Defaults of the route planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSettings {
    pub default_capacity: u64,
    pub max_markets_per_run: u32,
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub monitor: MonitorConfig,
    /// `None` when periodic progress reports are disabled.
    pub report_interval: Option<Duration>,
    pub route: RouteSettings,
    pub snapshot_path: PathBuf,
}

impl LoadedConfig {
    /// Reject a configuration that would start a pipeline with nothing to poll.
    pub fn ensure_watches(&self) -> Result<(), ConfigError> {
        if self.monitor.watches.is_empty() {
            return Err(ConfigError::ValidationError(
                "nothing to watch: set monitor.journal_dir, pass --journal-dir or add [[watch]] entries"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    journal_dir_override: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, journal_dir_override: Option<PathBuf>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            journal_dir_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// A missing config file is not an error: defaults apply. Watching then needs the journal
    /// directory from the command line, see [`LoadedConfig::ensure_watches`].
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let mut file_config = if self.config_path.exists() {
            let content = std::fs::read_to_string(&self.config_path)?;
            toml::from_str::<FileConfig>(&content)?
        } else {
            tracing::info!(path = ?self.config_path, "Config file not found, using defaults");
            FileConfig::default()
        };

        if let Some(dir) = &self.journal_dir_override {
            file_config.monitor.journal_dir = Some(dir.clone());
        }

        let loaded = build_loaded_config(file_config);
        validate(&loaded)?;
        Ok(loaded)
    }
}

fn build_loaded_config(file_config: FileConfig) -> LoadedConfig {
    let FileConfig {
        monitor: section,
        watch,
        route,
        snapshot,
    } = file_config;

    // An explicit watch list wins; otherwise follow the journal directory.
    let watches = if watch.is_empty() {
        section
            .journal_dir
            .as_ref()
            .map(|dir| MonitorConfig::for_journal_dir(dir).watches)
            .unwrap_or_default()
    } else {
        watch.into_iter().map(convert_watch).collect()
    };

    LoadedConfig {
        monitor: MonitorConfig {
            poll_interval: Duration::from_millis(section.poll_interval_ms),
            workers: section.workers,
            lane_buffer: section.lane_buffer,
            watches,
        },
        report_interval: (section.report_interval_secs > 0)
            .then(|| Duration::from_secs(section.report_interval_secs)),
        route: RouteSettings {
            default_capacity: route.default_capacity,
            max_markets_per_run: route.max_markets_per_run,
        },
        snapshot_path: snapshot.path,
    }
}

fn convert_watch(w: WatchSection) -> WatchConfig {
    let target = if w.latest_journal {
        WatchTarget::LatestJournal(w.path)
    } else {
        WatchTarget::File(w.path)
    };
    WatchConfig {
        target,
        strategy: w.strategy,
    }
}

fn validate(config: &LoadedConfig) -> Result<(), ConfigError> {
    let monitor = &config.monitor;
    if monitor.workers == 0 {
        return Err(ConfigError::ValidationError(
            "monitor.workers must be at least 1".to_string(),
        ));
    }
    if monitor.poll_interval.is_zero() {
        return Err(ConfigError::ValidationError(
            "monitor.poll_interval_ms must be positive".to_string(),
        ));
    }
    if monitor.lane_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "monitor.lane_buffer must be at least 1".to_string(),
        ));
    }
    if config.route.default_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "route.default_capacity must be positive".to_string(),
        ));
    }
    if config.route.max_markets_per_run == 0 {
        return Err(ConfigError::ValidationError(
            "route.max_markets_per_run must be at least 1".to_string(),
        ));
    }
    Ok(())
}
