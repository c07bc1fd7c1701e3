//! TOML file configuration structures.
//!
//! These structs directly map to the `edcm-config.toml` file format. Every section is optional.

use std::path::PathBuf;

use edcm_core::detector::ReadStrategy;
use edcm_sdk::objects::route::DEFAULT_MAX_MARKETS_PER_RUN;
use serde::Deserialize;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub monitor: MonitorSection,
    /// Explicit watch list. When empty, the journal directory defaults apply.
    #[serde(default)]
    pub watch: Vec<WatchSection>,
    #[serde(default)]
    pub route: RouteSection,
    #[serde(default)]
    pub snapshot: SnapshotSection,
}

/// `[monitor]`: the ingestion pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSection {
    /// Directory holding `Journal.*.log` and `Market.json`.
    #[serde(default)]
    pub journal_dir: Option<PathBuf>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_lane_buffer")]
    pub lane_buffer: usize,
    /// Period of the progress summary in the log. `0` disables it.
    #[serde(default = "default_report_interval_secs")]
    pub report_interval_secs: u64,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            journal_dir: None,
            poll_interval_ms: default_poll_interval_ms(),
            workers: default_workers(),
            lane_buffer: default_lane_buffer(),
            report_interval_secs: default_report_interval_secs(),
        }
    }
}

/// `[[watch]]`: one watched file.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// A file, or a directory when `latest_journal` is set.
    pub path: PathBuf,
    pub strategy: ReadStrategy,
    /// Follow the newest `Journal.*.log` in `path` instead of a fixed file.
    #[serde(default)]
    pub latest_journal: bool,
}

/// `[route]`: defaults of the `plan` command.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteSection {
    /// Tons per run when neither the request nor the current ship names one.
    #[serde(default = "default_capacity")]
    pub default_capacity: u64,
    #[serde(default = "default_max_markets_per_run")]
    pub max_markets_per_run: u32,
}

impl Default for RouteSection {
    fn default() -> Self {
        Self {
            default_capacity: default_capacity(),
            max_markets_per_run: default_max_markets_per_run(),
        }
    }
}

/// `[snapshot]`: state persisted between runs.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotSection {
    #[serde(default = "default_snapshot_path")]
    pub path: PathBuf,
}

impl Default for SnapshotSection {
    fn default() -> Self {
        Self {
            path: default_snapshot_path(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_workers() -> usize {
    edcm_core::config::DEFAULT_WORKERS
}

fn default_lane_buffer() -> usize {
    edcm_core::events::DEFAULT_CHANNEL_BUFFER
}

fn default_report_interval_secs() -> u64 {
    60
}

fn default_capacity() -> u64 {
    1232
}

fn default_max_markets_per_run() -> u32 {
    DEFAULT_MAX_MARKETS_PER_RUN
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("./edcm-state.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[monitor]
journal_dir = "/home/cmdr/journals"
poll_interval_ms = 500
workers = 8

[[watch]]
path = "/home/cmdr/journals"
strategy = "append"
latest_journal = true

[[watch]]
path = "/home/cmdr/journals/Market.json"
strategy = "rewrite"

[route]
default_capacity = 784

[snapshot]
path = "/var/lib/edcm/state.json"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.monitor.poll_interval_ms, 500);
        assert_eq!(config.monitor.workers, 8);
        assert_eq!(config.monitor.lane_buffer, 256);
        assert_eq!(config.watch.len(), 2);
        assert!(config.watch[0].latest_journal);
        assert_eq!(config.watch[1].strategy, ReadStrategy::Rewrite);
        assert!(!config.watch[1].latest_journal);
        assert_eq!(config.route.default_capacity, 784);
        assert_eq!(config.route.max_markets_per_run, DEFAULT_MAX_MARKETS_PER_RUN);
        assert_eq!(config.snapshot.path, PathBuf::from("/var/lib/edcm/state.json"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert!(config.monitor.journal_dir.is_none());
        assert_eq!(config.monitor.poll_interval_ms, 1000);
        assert_eq!(config.monitor.report_interval_secs, 60);
        assert!(config.watch.is_empty());
        assert_eq!(config.route.default_capacity, 1232);
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let toml_str = r#"
[[watch]]
path = "Status.json"
strategy = "tail"
"#;
        assert!(toml::from_str::<FileConfig>(toml_str).is_err());
    }
}
