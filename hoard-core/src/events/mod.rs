//! Event system.
//!
//! # Event Flow
//!
//! 1. Engine pushes `EngineNotification` -> adapter handler loop
//! 2. Handler loop updates the sync state machine and transaction pool
//! 3. Adapter publishes `AdapterEvent` -> UI layer subscribers
//!
//! Wallet list changes are not events: the registry publishes whole
//! snapshots through a `watch` channel instead.

pub mod channels;
pub mod types;

pub use channels::{
    AdapterEventReceiver, AdapterEventSender, DEFAULT_CHANNEL_BUFFER, EngineNotificationReceiver,
    EngineNotificationSender, adapter_event_channel, engine_notification_channel,
};

pub use types::{AdapterEvent, EngineNotification};
