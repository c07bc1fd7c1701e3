//! Journal event records and the channels that carry them to handlers.
//!
//! # Event Flow
//!
//! 1. `Dispatcher` polls watched files through the change detector
//! 2. Each new line (or rewritten file) is parsed into a `JournalEvent`
//! 3. For every handler registered for the event's type, a `Job` is queued on that handler's lane
//! 4. `OrderedLane` runs its jobs one at a time; `WorkerPool` runs its jobs concurrently
//!
//! Records stay schema-free until a handler decodes them into a typed payload.

pub mod channels;
pub mod types;

pub use channels::{
    DEFAULT_CHANNEL_BUFFER, Job, JobReceiver, JobSender, LaneSenders, ordered_lane_channel,
    pool_lane_channel,
};
pub use types::{EventOrigin, JournalEvent, ParseError};
