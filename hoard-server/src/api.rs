//! HTTP API handlers.

pub mod wallets;
