//! Per-adapter sync state machine.
//!
//! The state lives in a `watch` channel. Every transition runs its
//! compute-compare-store sequence inside `send_if_modified`, which holds the
//! channel's write lock, so two notifications racing on different threads
//! cannot interleave or emit out of order.

use hoard_sdk::objects::{AdapterState, SyncError};
use tokio::sync::watch;

use crate::engine::EngineStatus;

pub struct SyncStateMachine {
    state: watch::Sender<AdapterState>,
}

impl SyncStateMachine {
    /// Starts in `Syncing(0)`: the engine may already hold cached chain
    /// data from an earlier session.
    pub fn new() -> Self {
        let (state, _) = watch::channel(AdapterState::INITIAL);
        Self { state }
    }

    pub fn state(&self) -> AdapterState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AdapterState> {
        self.state.subscribe()
    }

    /// Apply an engine status. Returns the new state if it changed.
    pub fn apply(&self, status: &EngineStatus) -> Option<AdapterState> {
        self.transition(|previous| next_state(previous, status))
    }

    /// Record an engine failure. Returns the new state if it changed.
    pub fn fail(&self, reason: impl Into<String>) -> Option<AdapterState> {
        let error = SyncError::Failed(reason.into());
        self.transition(move |_| AdapterState::NotSynced { error })
    }

    fn transition(
        &self,
        candidate: impl FnOnce(&AdapterState) -> AdapterState,
    ) -> Option<AdapterState> {
        let mut emitted = None;
        self.state.send_if_modified(|current| {
            let next = candidate(current);
            if next == *current {
                return false;
            }
            *current = next.clone();
            emitted = Some(next);
            true
        });
        emitted
    }
}

impl Default for SyncStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Candidate state for `status`, given the previously emitted state.
fn next_state(previous: &AdapterState, status: &EngineStatus) -> AdapterState {
    match status {
        EngineStatus::Disconnected => AdapterState::NotSynced {
            error: SyncError::NoConnection,
        },
        EngineStatus::Stopped => AdapterState::NotSynced {
            error: SyncError::Unknown,
        },
        EngineStatus::Synced => AdapterState::Synced,
        EngineStatus::Syncing {
            progress,
            last_block_date,
        } => {
            let previous_date = match previous {
                AdapterState::Syncing {
                    last_block_date, ..
                } => *last_block_date,
                _ => None,
            };
            AdapterState::Syncing {
                // `as` saturates and maps NaN to zero.
                progress: (progress * 100.0).clamp(0.0, 100.0) as u8,
                last_block_date: last_block_date.or(previous_date),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn syncing(progress: f64) -> EngineStatus {
        EngineStatus::Syncing {
            progress,
            last_block_date: None,
        }
    }

    #[test]
    fn test_initial_state() {
        let machine = SyncStateMachine::new();
        assert_eq!(machine.state(), AdapterState::INITIAL);
    }

    #[test]
    fn test_duplicate_notification_emits_once() {
        let machine = SyncStateMachine::new();
        assert!(machine.apply(&syncing(0.45)).is_some());
        assert!(machine.apply(&syncing(0.45)).is_none());
        assert!(machine.apply(&syncing(0.46)).is_some());
        assert!(machine.apply(&EngineStatus::Synced).is_some());
        assert!(machine.apply(&EngineStatus::Synced).is_none());
    }

    #[test]
    fn test_initial_progress_is_not_a_change() {
        let machine = SyncStateMachine::new();
        assert!(machine.apply(&syncing(0.0)).is_none());
    }

    #[test]
    fn test_transition_table() {
        let machine = SyncStateMachine::new();

        assert_eq!(
            machine.apply(&EngineStatus::Disconnected),
            Some(AdapterState::NotSynced {
                error: SyncError::NoConnection
            })
        );
        assert_eq!(
            machine.apply(&EngineStatus::Stopped),
            Some(AdapterState::NotSynced {
                error: SyncError::Unknown
            })
        );
        assert_eq!(
            machine.fail("lightwalletd unreachable"),
            Some(AdapterState::NotSynced {
                error: SyncError::Failed("lightwalletd unreachable".into())
            })
        );
        assert_eq!(
            machine.apply(&syncing(1.7)),
            Some(AdapterState::Syncing {
                progress: 100,
                last_block_date: None
            })
        );
        assert_eq!(machine.apply(&EngineStatus::Synced), Some(AdapterState::Synced));
    }

    #[test]
    fn test_last_block_date_is_kept_while_syncing() {
        let machine = SyncStateMachine::new();
        let date = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();

        machine.apply(&EngineStatus::Syncing {
            progress: 0.1,
            last_block_date: Some(date),
        });
        let state = machine.apply(&syncing(0.2));
        assert_eq!(
            state,
            Some(AdapterState::Syncing {
                progress: 20,
                last_block_date: Some(date)
            })
        );
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let machine = SyncStateMachine::new();
        let mut rx = machine.subscribe();

        machine.apply(&syncing(0.0));
        assert!(!rx.has_changed().unwrap());

        machine.apply(&EngineStatus::Synced);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), AdapterState::Synced);
    }
}
