//! Dispatcher processor.
//!
//! The Dispatcher is responsible for:
//! - Polling every watched file through the change detector on a fixed interval
//! - Following the newest journal when the game starts a new one, after finishing the old one
//! - Parsing new records into `JournalEvent`s, dropping malformed ones
//! - Queueing one `Job` per matching handler on that handler's lane
//!
//! It never touches domain state. On shutdown it drops the lane senders, which lets both lanes
//! drain their queues and exit.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace, warn};

use super::stats::PipelineStats;
use crate::config::{MonitorConfig, WatchConfig};
use crate::detector::{self, DetectError, Detected, ReadState, ReadStrategy};
use crate::events::{EventOrigin, Job, JournalEvent, LaneSenders};
use crate::handlers::HandlerRegistry;

/// Read position in one watched target.
struct WatchedFile {
    config: WatchConfig,
    /// File currently read for this target.
    current: Option<Arc<Path>>,
    state: ReadState,
    /// Records read from `current` so far.
    seq: u64,
}

pub struct Dispatcher {
    config: MonitorConfig,
    registry: Arc<HandlerRegistry>,
    stats: Arc<PipelineStats>,
    files: Vec<WatchedFile>,
}

impl Dispatcher {
    pub fn new(
        config: MonitorConfig,
        registry: Arc<HandlerRegistry>,
        stats: Arc<PipelineStats>,
    ) -> Self {
        let files = config
            .watches
            .iter()
            .cloned()
            .map(|config| WatchedFile {
                config,
                current: None,
                state: ReadState::default(),
                seq: 0,
            })
            .collect();
        Self {
            config,
            registry,
            stats,
            files,
        }
    }

    /// Run the Dispatcher until shutdown is signaled.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>, lanes: LaneSenders) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            files = self.files.len(),
            handled_types = ?self.registry.event_types(),
            "Dispatcher started"
        );

        if !*shutdown_rx.borrow() {
            loop {
                tokio::select! {
                    biased;

                    // Shutdown has highest priority.
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!("Dispatcher received shutdown signal");
                            break;
                        }
                    }

                    _ = ticker.tick() => {
                        self.poll_once(&lanes).await;
                    }
                }
            }
        }

        drop(lanes);
        info!("Dispatcher shutdown complete");
    }

    // -- Private helpers ----------------------------------------------------

    /// One pass over all watched files, in configuration order.
    async fn poll_once(&mut self, lanes: &LaneSenders) {
        for index in 0..self.files.len() {
            let file = &self.files[index];
            let config = file.config.clone();
            let current = file.current.clone();
            let state = file.state.clone();

            let polled = tokio::task::spawn_blocking(move || {
                poll_blocking(&config, current.as_deref(), &state)
            })
            .await;

            let Polled {
                tail,
                path,
                detected,
            } = match polled {
                Ok(Ok(Some(polled))) => polled,
                Ok(Ok(None)) => continue,
                Ok(Err(e)) if e.is_not_found() => {
                    // Market.json only appears after the first market visit.
                    self.stats.read_failed();
                    debug!(error = %e, "Watched file not present yet");
                    continue;
                }
                Ok(Err(e)) => {
                    self.stats.read_failed();
                    warn!(error = %e, "Failed to read watched file, retrying next poll");
                    continue;
                }
                Err(e) => {
                    self.stats.read_failed();
                    error!(error = %e, "File read task failed");
                    continue;
                }
            };

            if let Some(tail) = tail {
                self.dispatch_content(index, &tail.content, lanes).await;
            }

            let file = &mut self.files[index];
            if file.current.as_deref() != Some(path.as_path()) {
                info!(path = %path.display(), strategy = %file.config.strategy, "Watching file");
                file.current = Some(Arc::from(path.as_path()));
                file.seq = 0;
            }
            let Detected { content, state } = detected;
            file.state = state;
            self.dispatch_content(index, &content, lanes).await;
        }
    }

    /// Frame content read from the current file of `files[index]` and dispatch every record.
    async fn dispatch_content(&mut self, index: usize, content: &str, lanes: &LaneSenders) {
        if content.is_empty() {
            return;
        }
        let file = &mut self.files[index];
        let Some(origin_path) = file.current.clone() else {
            return;
        };
        let records = frame(file.config.strategy, content);
        let first_seq = file.seq;
        file.seq += records.len() as u64;
        for (offset, record) in records.into_iter().enumerate() {
            let origin = EventOrigin::new(Arc::clone(&origin_path), first_seq + offset as u64);
            self.dispatch(record, origin, lanes).await;
        }
    }

    async fn dispatch(&self, record: &str, origin: EventOrigin, lanes: &LaneSenders) {
        let event = match JournalEvent::parse(record, origin) {
            Ok(event) => event,
            Err(e) => {
                self.stats.record_dropped();
                warn!(error = %e, "Dropping malformed record");
                return;
            }
        };
        self.stats.record_parsed();

        let handlers = self.registry.handlers_for(&event.event_type);
        if handlers.is_empty() {
            trace!(event_type = %event.event_type, "No handler");
            return;
        }

        let event = Arc::new(event);
        for handler in handlers {
            let lane = handler.lane();
            let job = Job {
                handler: Arc::clone(handler),
                event: Arc::clone(&event),
            };
            debug!(
                event_type = %event.event_type,
                handler = handler.name(),
                %lane,
                seq = event.origin.seq,
                "Queueing job"
            );
            if let Err(e) = lanes.for_lane(lane).send(job).await {
                error!(%lane, error = %e, "Lane closed, job lost");
            }
        }
    }
}

/// Result of polling one target.
struct Polled {
    /// Lines appended to the previous file since the last poll, when the target moved on.
    tail: Option<Detected>,
    path: PathBuf,
    detected: Detected,
}

/// Resolve the target and read what changed. Runs on the blocking pool.
///
/// When the target resolves to a new file, the rest of the previous one is read first so that
/// lines written just before the switch are not lost. Nothing is committed on error; the next
/// poll repeats both reads from the same state.
fn poll_blocking(
    config: &WatchConfig,
    current: Option<&Path>,
    state: &ReadState,
) -> Result<Option<Polled>, DetectError> {
    let resolved = config.target.resolve().map_err(|source| DetectError::Io {
        path: config.target.path().to_path_buf(),
        source,
    })?;
    let Some(path) = resolved else {
        return Ok(None);
    };
    if current == Some(path.as_path()) {
        let detected = detector::detect(config.strategy, &path, state)?;
        return Ok(Some(Polled {
            tail: None,
            path,
            detected,
        }));
    }

    let tail = current.and_then(|previous| {
        match detector::detect(config.strategy, previous, state) {
            Ok(detected) => Some(detected),
            Err(e) => {
                warn!(path = %previous.display(), error = %e, "Could not finish previous file");
                None
            }
        }
    });
    // A new journal starts from the beginning.
    let detected = detector::detect(config.strategy, &path, &ReadState::default())?;
    Ok(Some(Polled {
        tail,
        path,
        detected,
    }))
}

/// Split newly read content into records.
fn frame(strategy: ReadStrategy, content: &str) -> Vec<&str> {
    match strategy {
        ReadStrategy::Append => content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect(),
        ReadStrategy::Rewrite => {
            let whole = content.trim();
            if whole.is_empty() { vec![] } else { vec![whole] }
        }
    }
}
