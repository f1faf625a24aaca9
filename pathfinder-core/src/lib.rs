//! PathFinder Core Library
//!
//! Trip planning model and the synchronization of adventures with a remote
//! relational store.

pub mod aggregate;
pub mod itinerary;
pub mod models;
pub mod places;
pub mod store;
pub mod sync;
pub mod viewport;

pub use aggregate::{summarize, Divergence, RouteSummary};
pub use itinerary::{EditableItinerary, ItineraryError, ScheduledStop};
pub use models::{
    validate_stops, Adventure, BudgetTier, Coordinate, Difficulty, Flight, RouteData, Stop,
    ValidationError,
};
pub use places::{CatalogSearch, PlaceCandidate, PlaceSearch, PlaceType, SearchError};
pub use store::{
    Column, ColumnKind, DecodeError, Filter, MemoryStore, RemoteStore, StoreError, StoreOp, Table,
    WireRow,
};
pub use sync::{
    AdventureLibrary, ChildCollection, RecordState, ReplaceStrategy, SyncEngine, SyncError,
};
pub use viewport::{fit, fit_stops, Region, Span};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
