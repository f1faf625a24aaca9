use thiserror::Error;

use super::engine::ChildCollection;
use super::library::RecordState;
use crate::models::ValidationError;
use crate::store::{DecodeError, StoreError};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SyncError {
    /// Rejected locally; the store was never contacted.
    #[error("invalid itinerary: {0}")]
    Validation(#[from] ValidationError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("rejected by store: {0}")]
    RemoteConstraint(String),

    /// The parent row was written but a child collection was not. The remote
    /// copy no longer matches local state; fetch it again before editing.
    #[error("adventure {adventure_id} only partially saved ({collection} failed): {source}")]
    PartialSync {
        adventure_id: String,
        collection: ChildCollection,
        source: StoreError,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("adventure {0} already has a save in progress")]
    Busy(String),

    #[error("adventure {0} not found")]
    NotFound(String),

    #[error("cannot {action} adventure {id} while it is {state}")]
    InvalidTransition {
        id: String,
        action: &'static str,
        state: RecordState,
    },
}

impl SyncError {
    /// Transport failures may succeed when retried by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::Transport(_)
                | SyncError::Busy(_)
                | SyncError::PartialSync {
                    source: StoreError::Transport(_),
                    ..
                }
        )
    }

    /// Whether the local copy must be refreshed from the store before use.
    pub fn requires_resync(&self) -> bool {
        matches!(self, SyncError::PartialSync { .. })
    }
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Transport(msg) => SyncError::Transport(msg),
            StoreError::Constraint(msg) => SyncError::RemoteConstraint(msg),
            StoreError::Corrupt { table, message } => {
                SyncError::Decode(DecodeError::Malformed { table, message })
            }
        }
    }
}
