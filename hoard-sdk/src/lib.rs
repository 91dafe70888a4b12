//! Shared value types for Hoard.
//!
//! Everything here is plain data: assets, adapter states, transaction
//! records, amount conversion and the HTTP API objects exchanged with the
//! UI layer. Runtime behavior lives in `hoard-core`.

pub mod amount;
pub mod objects;
