//! Create, edit, delete and fetch of whole adventures against a `RemoteStore`.

mod engine;
mod error;
mod guard;
mod library;

pub use engine::{ChildCollection, ReplaceStrategy, SyncEngine};
pub use error::SyncError;
pub use guard::{InFlight, InFlightGuard};
pub use library::{AdventureLibrary, RecordState};
