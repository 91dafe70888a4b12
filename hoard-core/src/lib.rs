#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod config;
pub mod engine;
pub mod events;
pub mod metrics;
pub mod pool;
pub mod sync_state;
pub mod wallets;
