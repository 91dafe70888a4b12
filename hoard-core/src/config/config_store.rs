//! Generic config store with change notification.
//!
//! `ConfigStore<T>` publishes immutable `Arc<T>` snapshots through a
//! `watch` channel so that consumers can react to config changes without
//! polling, and readers never hold a lock while they use a value.

use std::sync::Arc;
use tokio::sync::watch;

/// A shared, versioned configuration store with change notification.
///
/// Subscribers receive a [`ConfigWatcher`] that can `await` the next
/// change and hands back the new snapshot.
pub struct ConfigStore<T> {
    inner: Arc<watch::Sender<Arc<T>>>,
}

/// Receives notifications when a [`ConfigStore`] is updated.
pub struct ConfigWatcher<T> {
    rx: watch::Receiver<Arc<T>>,
}

// -- ConfigStore --------------------------------------------------------

impl<T> ConfigStore<T> {
    /// Create a new `ConfigStore` with the given initial value.
    pub fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(Arc::new(initial));
        Self {
            inner: Arc::new(tx),
        }
    }

    /// Replace the stored value and notify all watchers.
    pub fn update(&self, value: T) {
        self.inner.send_replace(Arc::new(value));
    }

    /// Read the current value.
    pub fn read(&self) -> Arc<T> {
        self.inner.borrow().clone()
    }

    /// Subscribe to change notifications.
    ///
    /// The current value counts as seen; only later updates wake the watcher.
    pub fn subscribe(&self) -> ConfigWatcher<T> {
        ConfigWatcher {
            rx: self.inner.subscribe(),
        }
    }
}

impl<T> Clone for ConfigStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

// -- ConfigWatcher ------------------------------------------------------

impl<T> ConfigWatcher<T> {
    /// The latest value, marking it as seen.
    pub fn current(&mut self) -> Arc<T> {
        self.rx.borrow_and_update().clone()
    }

    /// Wait until the config store is updated and return the new value.
    ///
    /// Returns `Err` once every [`ConfigStore`] handle has been dropped.
    pub async fn changed(&mut self) -> Result<Arc<T>, watch::error::RecvError> {
        self.rx.changed().await?;
        Ok(self.rx.borrow_and_update().clone())
    }
}
