//! Runtime configuration of the ingestion pipeline.
//!
//! These are validated values. Loading them from a file is left to the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::detector::ReadStrategy;
use crate::events::DEFAULT_CHANNEL_BUFFER;

/// Default poll period of the watched files.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Default number of concurrent pool workers.
pub const DEFAULT_WORKERS: usize = 4;

const JOURNAL_PREFIX: &str = "Journal.";
const JOURNAL_SUFFIX: &str = ".log";

/// Validated configuration of the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    /// Concurrency limit of the unordered lane.
    pub workers: usize,
    /// Capacity of each lane's queue.
    pub lane_buffer: usize,
    pub watches: Vec<WatchConfig>,
}

impl MonitorConfig {
    /// Watch the newest journal in `dir` and the `Market.json` next to it.
    pub fn for_journal_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            workers: DEFAULT_WORKERS,
            lane_buffer: DEFAULT_CHANNEL_BUFFER,
            watches: vec![
                WatchConfig {
                    target: WatchTarget::LatestJournal(dir.clone()),
                    strategy: ReadStrategy::Append,
                },
                WatchConfig {
                    target: WatchTarget::File(dir.join("Market.json")),
                    strategy: ReadStrategy::Rewrite,
                },
            ],
        }
    }
}

/// A watched file and how to read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    pub target: WatchTarget,
    pub strategy: ReadStrategy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchTarget {
    /// A fixed path.
    File(PathBuf),
    /// The newest `Journal.*.log` in a directory, re-resolved on every poll.
    LatestJournal(PathBuf),
}

impl WatchTarget {
    /// The configured path: the file itself, or the journal directory.
    pub fn path(&self) -> &Path {
        match self {
            WatchTarget::File(path) | WatchTarget::LatestJournal(path) => path,
        }
    }

    /// The file to read right now. `Ok(None)` when no journal exists yet.
    pub fn resolve(&self) -> std::io::Result<Option<PathBuf>> {
        match self {
            WatchTarget::File(path) => Ok(Some(path.clone())),
            WatchTarget::LatestJournal(dir) => latest_journal(dir),
        }
    }
}

impl std::fmt::Display for WatchTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchTarget::File(path) => write!(f, "{}", path.display()),
            WatchTarget::LatestJournal(dir) => write!(f, "{}/Journal.*.log", dir.display()),
        }
    }
}

/// Newest journal by modification time. Names embed the session start time, so they break ties.
fn latest_journal(dir: &Path) -> std::io::Result<Option<PathBuf>> {
    let mut newest: Option<(std::time::SystemTime, String, PathBuf)> = None;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !(name.starts_with(JOURNAL_PREFIX) && name.ends_with(JOURNAL_SUFFIX)) {
            continue;
        }
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified()?;
        let is_newer = newest
            .as_ref()
            .is_none_or(|(m, n, _)| (modified, name.as_str()) > (*m, n.as_str()));
        if is_newer {
            newest = Some((modified, name, entry.path()));
        }
    }
    Ok(newest.map(|(_, _, path)| path))
}
