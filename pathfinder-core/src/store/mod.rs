//! The remote relational store the sync engine writes through.
//!
//! Rows cross this boundary as JSON objects keyed by snake_case column
//! names (`WireRow`). `rows` converts them to and from the camelCase model;
//! `schema` describes the four tables so that any backend can bind and
//! check columns the same way.

mod memory;
mod rows;
mod schema;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

pub use memory::MemoryStore;
pub use rows::{
    decode_adventure, decode_badges, decode_flights, decode_stops, encode_adventure,
    encode_badges, encode_flights, encode_stops, row_id, AdventureRow, BadgeRow, DecodeError,
    FlightRow, PlaceRow,
};
pub use schema::{Column, ColumnKind, Table};

/// One row as sent to or received from the store.
pub type WireRow = serde_json::Map<String, Value>;

/// Equality filter on a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, row: &WireRow) -> bool {
        row.get(&self.column) == Some(&self.value)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.column, self.value)
    }
}

/// Store operations, used for fault injection and operation journals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Select,
    Insert,
    Upsert,
    Update,
    Delete,
    Replace,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached or the request did not complete.
    #[error("transport error: {0}")]
    Transport(String),

    /// The store received the request and refused the write.
    #[error("rejected by store: {0}")]
    Constraint(String),

    /// The store returned data that does not fit its own schema.
    #[error("corrupt row in {table}: {message}")]
    Corrupt { table: &'static str, message: String },
}

/// Table-oriented persistence collaborator.
///
/// Implementations must cascade deletes from `adventures` to every child
/// table, assign an `id` (and `created_at`) to inserted rows that lack one,
/// and return child rows ordered by their `position` column.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn select(&self, table: Table, filter: Option<&Filter>)
        -> Result<Vec<WireRow>, StoreError>;

    /// Inserts every row or none of them. Returns the stored rows.
    async fn insert(&self, table: Table, rows: Vec<WireRow>) -> Result<Vec<WireRow>, StoreError>;

    /// Inserts rows, or overwrites the existing row with the same `id`.
    async fn upsert(&self, table: Table, rows: Vec<WireRow>) -> Result<Vec<WireRow>, StoreError>;

    /// Applies `changes` to every matching row and returns the updated rows.
    async fn update(
        &self,
        table: Table,
        filter: &Filter,
        changes: WireRow,
    ) -> Result<Vec<WireRow>, StoreError>;

    /// Returns the number of rows removed.
    async fn delete(&self, table: Table, filter: &Filter) -> Result<u64, StoreError>;

    /// Deletes every matching row and inserts `rows` in one transaction.
    ///
    /// On error nothing has changed.
    async fn replace(
        &self,
        table: Table,
        filter: &Filter,
        rows: Vec<WireRow>,
    ) -> Result<Vec<WireRow>, StoreError>;
}
