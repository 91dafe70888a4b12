pub mod api;
pub mod assets;
pub mod credentials;
pub mod records;
pub mod state;

pub use assets::{Asset, Capability};
pub use credentials::Credentials;
pub use records::{LastBlockInfo, LockInfo, TransactionCursor, TransactionRecord, TransactionType};
pub use state::{AdapterState, SyncError};
