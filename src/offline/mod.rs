//! Offline capture and remote reconciliation.
//!
//! Progress mutations made while disconnected are queued as snapshots and
//! replayed against the sync endpoint when connectivity returns.

pub mod entry;
pub mod outbox;
pub mod sync;

pub use entry::{OfflineEntry, SyncStatus};
pub use outbox::{OFFLINE_KEY, OfflineOutbox, SyncReport};
pub use sync::{HttpSyncClient, SyncClient};
