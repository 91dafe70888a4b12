//! Adapter counters.
//!
//! Cheap atomic counters that sit next to the `tracing` events. They are
//! read by the server for the wallet detail endpoint.

use std::sync::atomic::{AtomicU64, Ordering};

use hoard_sdk::objects::api::AdapterCounters;

#[derive(Debug, Default)]
pub struct AdapterMetrics {
    notifications: AtomicU64,
    state_changes: AtomicU64,
    records_emitted: AtomicU64,
    sends_succeeded: AtomicU64,
    sends_failed: AtomicU64,
}

impl AdapterMetrics {
    pub fn notification(&self) {
        self.notifications.fetch_add(1, Ordering::Relaxed);
    }

    pub fn state_changed(&self) {
        self.state_changes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn records_emitted(&self, count: usize) {
        self.records_emitted
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn send_finished(&self, succeeded: bool) {
        let counter = if succeeded {
            &self.sends_succeeded
        } else {
            &self.sends_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> AdapterCounters {
        AdapterCounters {
            notifications: self.notifications.load(Ordering::Relaxed),
            state_changes: self.state_changes.load(Ordering::Relaxed),
            records_emitted: self.records_emitted.load(Ordering::Relaxed),
            sends_succeeded: self.sends_succeeded.load(Ordering::Relaxed),
            sends_failed: self.sends_failed.load(Ordering::Relaxed),
        }
    }
}
