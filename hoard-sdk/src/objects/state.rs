//! Adapter synchronization state.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Why an adapter is not synced.
///
/// A value type so that two states can be compared in full.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum SyncError {
    #[error("no connection")]
    NoConnection,
    #[error("unknown error")]
    Unknown,
    #[error("sync failed: {0}")]
    Failed(String),
}

/// Adapter-visible synchronization state.
///
/// Exactly one state holds at a time. Transitions are driven by engine
/// notifications only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AdapterState {
    NotSynced {
        error: SyncError,
    },
    Syncing {
        /// Percentage, 0 to 100.
        progress: u8,
        #[serde(with = "time::serde::timestamp::option")]
        last_block_date: Option<OffsetDateTime>,
    },
    Synced,
}

impl AdapterState {
    /// State of a freshly constructed adapter.
    pub const INITIAL: AdapterState = AdapterState::Syncing {
        progress: 0,
        last_block_date: None,
    };

    pub fn is_synced(&self) -> bool {
        matches!(self, AdapterState::Synced)
    }
}

impl Default for AdapterState {
    fn default() -> Self {
        Self::INITIAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&AdapterState::INITIAL).unwrap();
        assert_eq!(json, r#"{"state":"syncing","progress":0,"last_block_date":null}"#);

        let json = serde_json::to_string(&AdapterState::NotSynced {
            error: SyncError::Failed("boom".into()),
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"state":"not_synced","error":{"kind":"failed","reason":"boom"}}"#
        );
    }

    #[test]
    fn test_states_compare_by_payload() {
        let a = AdapterState::Syncing {
            progress: 45,
            last_block_date: None,
        };
        let b = AdapterState::Syncing {
            progress: 46,
            last_block_date: None,
        };
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }
}
