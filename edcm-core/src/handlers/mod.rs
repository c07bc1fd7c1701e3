//! Event handlers and their registry.
//!
//! A handler declares which event types it can process and which lane it must run on. Handlers
//! decode the generic record into a typed payload and apply it to the stores; nothing else in
//! the pipeline mutates domain state.
//!
//! - `ConstructionDepotHandler`: depot status reports, unordered
//! - `ContributionHandler`: deliveries to a depot, ordered
//! - `CargoHandler`: cargo snapshots, transfers and loadouts, ordered
//! - `DockedHandler`: station names of construction sites from `Docked` and `Location`, unordered
//! - `MarketSnapshotHandler`: market snapshots, unordered

pub mod cargo;
pub mod contribution;
pub mod depot;
pub mod docked;
pub mod market;

pub use cargo::CargoHandler;
pub use contribution::ContributionHandler;
pub use depot::ConstructionDepotHandler;
pub use docked::DockedHandler;
pub use market::MarketSnapshotHandler;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use compact_str::CompactString;
use thiserror::Error;

use crate::events::JournalEvent;
use crate::stores::{CargoInventory, CommodityRegistry, ConstructionSiteStore, MarketStore, StoreError};

/// Execution lane of a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    /// One at a time, in the order events were observed.
    Ordered,
    /// Concurrently, in no particular order.
    Pool,
}

impl std::fmt::Display for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lane::Ordered => write!(f, "ordered"),
            Lane::Pool => write!(f, "pool"),
        }
    }
}

/// Errors a handler reports for one event. They are logged by the lane and never stop it.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The record does not match the payload shape of its event type.
    #[error("failed to decode {event_type} payload: {source}")]
    Decode {
        event_type: CompactString,
        #[source]
        source: serde_json::Error,
    },

    /// The store rejected the update.
    #[error("store rejected update: {0}")]
    Store(#[from] StoreError),
}

impl HandlerError {
    pub(crate) fn decode(event: &JournalEvent, source: serde_json::Error) -> Self {
        HandlerError::Decode {
            event_type: event.event_type.clone(),
            source,
        }
    }
}

/// Something that can process journal events of some types.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Event type tags this handler processes.
    fn event_types(&self) -> &'static [&'static str];

    /// Lane the handler must run on.
    fn lane(&self) -> Lane;

    /// Process one event.
    async fn handle(&self, event: &JournalEvent) -> Result<(), HandlerError>;
}

/// Maps event type tags to the handlers willing to process them.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    by_type: HashMap<CompactString, Vec<Arc<dyn EventHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for every type it declares. A tag may have several handlers.
    pub fn register(&mut self, handler: Arc<dyn EventHandler>) -> &mut Self {
        for event_type in handler.event_types() {
            self.by_type
                .entry(CompactString::from(*event_type))
                .or_default()
                .push(Arc::clone(&handler));
        }
        self
    }

    /// Handlers for a tag, in registration order.
    pub fn handlers_for(&self, event_type: &str) -> &[Arc<dyn EventHandler>] {
        self.by_type
            .get(event_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All registered tags, sorted.
    pub fn event_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.by_type.keys().map(CompactString::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    /// A registry with every built-in handler, wired to the given stores.
    pub fn with_default_handlers(
        commodities: Arc<CommodityRegistry>,
        sites: Arc<ConstructionSiteStore>,
        markets: Arc<MarketStore>,
        cargo: Arc<CargoInventory>,
    ) -> Self {
        let mut registry = Self::new();
        registry
            .register(Arc::new(ConstructionDepotHandler::new(
                Arc::clone(&commodities),
                Arc::clone(&sites),
            )))
            .register(Arc::new(ContributionHandler::new(
                Arc::clone(&commodities),
                Arc::clone(&sites),
                Arc::clone(&cargo),
            )))
            .register(Arc::new(CargoHandler::new(
                Arc::clone(&commodities),
                Arc::clone(&cargo),
            )))
            .register(Arc::new(DockedHandler::new(Arc::clone(&sites))))
            .register(Arc::new(MarketSnapshotHandler::new(commodities, markets)));
        registry
    }
}
