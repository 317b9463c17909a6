//! Connectivity capability seam.

use std::sync::Arc;

use tokio::sync::watch;

/// A boolean online/offline signal with change notifications. Gates voice
/// session starts and drives the auto-sync trigger.
pub trait ConnectivityMonitor: Send + Sync {
    fn is_online(&self) -> bool;

    /// Watch for status changes. The receiver's current value is the
    /// status at subscription time.
    fn watch(&self) -> watch::Receiver<bool>;
}

/// A `watch`-backed monitor the host shell (or a test) drives explicitly.
pub struct SharedConnectivity {
    tx: watch::Sender<bool>,
}

impl SharedConnectivity {
    pub fn new(initially_online: bool) -> Arc<Self> {
        let (tx, _rx) = watch::channel(initially_online);
        Arc::new(Self { tx })
    }

    /// Update the status, notifying watchers on an actual change.
    pub fn set_online(&self, online: bool) {
        self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
    }
}

impl ConnectivityMonitor for SharedConnectivity {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn watch(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
