//! Event channel factories and handles.

use super::types::{AdapterEvent, EngineNotification};
use tokio::sync::{broadcast, mpsc};

/// Default buffer size for event channels.
///
/// This provides enough buffer to handle bursts while keeping memory bounded.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for engine notifications. Held by the engine.
pub type EngineNotificationSender = mpsc::Sender<EngineNotification>;
/// Receiver handle for engine notifications. Owned by one adapter.
pub type EngineNotificationReceiver = mpsc::Receiver<EngineNotification>;

/// Sender handle for adapter events.
pub type AdapterEventSender = broadcast::Sender<AdapterEvent>;
/// Receiver handle for adapter events.
pub type AdapterEventReceiver = broadcast::Receiver<AdapterEvent>;

/// Create a new engine notification channel.
///
/// Each engine connection gets its own channel; the receiver goes to the
/// adapter wrapping that engine.
pub fn engine_notification_channel() -> (EngineNotificationSender, EngineNotificationReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Create a new adapter event channel.
///
/// Consumers call `subscribe()` on the returned sender. Slow consumers
/// lag and skip events rather than blocking the adapter.
pub fn adapter_event_channel() -> AdapterEventSender {
    let (tx, _) = broadcast::channel(DEFAULT_CHANNEL_BUFFER);
    tx
}
