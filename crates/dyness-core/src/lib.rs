// dyness-core: Polling and aggregation layer between dyness-api and consumers.

pub mod config;
pub mod error;
pub mod poller;
pub mod readings;
pub mod snapshot;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{Credentials, PollerConfig};
pub use error::CoreError;
pub use poller::Poller;
pub use readings::{Reading, ReadingKind, ReadingValue, lookup, registry};
pub use snapshot::Snapshot;

// Re-export the region registry; hosts pick it at configuration time.
pub use dyness_api::Region;
