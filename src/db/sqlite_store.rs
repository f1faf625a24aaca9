use async_trait::async_trait;
use chrono::Utc;
use pathfinder_core::store::{Column, ColumnKind, Filter, RemoteStore, StoreError, Table, WireRow};
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnection, SqlitePool, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

static NULL: Value = Value::Null;

/// `RemoteStore` backed by the local SQLite database.
///
/// Statements are built from the table schema, so every table goes through
/// the same insert/update/replace code. Multi-row writes run in one
/// transaction.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn store_error(table: Table) -> impl Fn(sqlx::Error) -> StoreError {
    move |e| match e {
        sqlx::Error::Database(db) => StoreError::Constraint(db.message().to_string()),
        e @ (sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_)) => StoreError::Corrupt {
            table: table.name(),
            message: e.to_string(),
        },
        other => StoreError::Transport(other.to_string()),
    }
}

fn unknown_column(table: Table, name: &str) -> StoreError {
    StoreError::Constraint(format!(
        "column \"{}\" of relation \"{}\" does not exist",
        name, table
    ))
}

fn column_list(table: Table) -> String {
    table
        .columns()
        .iter()
        .map(|c| c.name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn bind_value<'q>(
    query: SqliteQuery<'q>,
    table: Table,
    column: &Column,
    value: &Value,
) -> Result<SqliteQuery<'q>, StoreError> {
    let mismatch = || {
        StoreError::Constraint(format!(
            "invalid value {} for column \"{}\" of relation \"{}\"",
            value, column.name, table
        ))
    };

    if value.is_null() {
        return Ok(query.bind(None::<String>));
    }

    Ok(match column.kind {
        ColumnKind::Text | ColumnKind::Timestamp => {
            query.bind(value.as_str().ok_or_else(mismatch)?.to_string())
        }
        ColumnKind::Integer => query.bind(value.as_i64().ok_or_else(mismatch)?),
        ColumnKind::Real => query.bind(value.as_f64().ok_or_else(mismatch)?),
        ColumnKind::Bool => query.bind(value.as_bool().ok_or_else(mismatch)?),
        ColumnKind::TextArray => {
            if !value.is_array() {
                return Err(mismatch());
            }
            query.bind(value.to_string())
        }
    })
}

fn read_row(table: Table, row: &SqliteRow) -> Result<WireRow, StoreError> {
    let corrupt = |message: String| StoreError::Corrupt {
        table: table.name(),
        message,
    };

    let mut out = WireRow::new();
    for column in table.columns() {
        let value = match column.kind {
            ColumnKind::Text | ColumnKind::Timestamp | ColumnKind::TextArray => row
                .try_get::<Option<String>, _>(column.name)
                .map(|v| v.map(Value::String)),
            ColumnKind::Integer => row
                .try_get::<Option<i64>, _>(column.name)
                .map(|v| v.map(Value::from)),
            ColumnKind::Real => row
                .try_get::<Option<f64>, _>(column.name)
                .map(|v| v.map(Value::from)),
            ColumnKind::Bool => row
                .try_get::<Option<bool>, _>(column.name)
                .map(|v| v.map(Value::Bool)),
        }
        .map_err(|e| corrupt(e.to_string()))?;

        let value = match (column.kind, value) {
            (ColumnKind::TextArray, Some(Value::String(raw))) => serde_json::from_str(&raw)
                .map_err(|e| corrupt(format!("{}: {}", column.name, e)))?,
            (_, Some(v)) => v,
            (_, None) => Value::Null,
        };
        out.insert(column.name.to_string(), value);
    }
    Ok(out)
}

/// Rejects unknown columns and fills in `id` and the timestamps.
fn prepare_new(table: Table, mut row: WireRow) -> Result<WireRow, StoreError> {
    if let Some(key) = row.keys().find(|k| table.column(k).is_none()) {
        return Err(unknown_column(table, key));
    }

    if !matches!(row.get("id"), Some(Value::String(_))) {
        row.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
    }
    let now = Utc::now().to_rfc3339();
    if !matches!(row.get("created_at"), Some(Value::String(_))) {
        row.insert("created_at".into(), Value::String(now.clone()));
    }
    if table.has_updated_at() {
        row.insert("updated_at".into(), Value::String(now));
    }
    Ok(row)
}

async fn select_rows(
    conn: &mut SqliteConnection,
    table: Table,
    filter: Option<&Filter>,
) -> Result<Vec<WireRow>, StoreError> {
    let filter_column = filter
        .map(|f| {
            table
                .column(&f.column)
                .ok_or_else(|| unknown_column(table, &f.column))
        })
        .transpose()?;

    let mut sql = format!("SELECT {} FROM {}", column_list(table), table);
    if let Some(column) = filter_column {
        sql.push_str(&format!(" WHERE {} = ?", column.name));
    }
    sql.push_str(if table.is_ordered() {
        " ORDER BY position"
    } else {
        " ORDER BY created_at"
    });

    let mut query = sqlx::query(&sql);
    if let (Some(f), Some(column)) = (filter, filter_column) {
        query = bind_value(query, table, column, &f.value)?;
    }

    let rows = query
        .fetch_all(&mut *conn)
        .await
        .map_err(store_error(table))?;
    rows.iter().map(|r| read_row(table, r)).collect()
}

async fn fetch_by_id(
    conn: &mut SqliteConnection,
    table: Table,
    id: &str,
) -> Result<WireRow, StoreError> {
    select_rows(conn, table, Some(&Filter::eq("id", id)))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::Corrupt {
            table: table.name(),
            message: format!("row {} missing after write", id),
        })
}

async fn write_row(
    conn: &mut SqliteConnection,
    table: Table,
    row: WireRow,
    upsert: bool,
) -> Result<WireRow, StoreError> {
    let row = prepare_new(table, row)?;
    let columns = table.columns();

    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        column_list(table),
        vec!["?"; columns.len()].join(", ")
    );
    if upsert {
        let updates = columns
            .iter()
            .filter(|c| c.name != "id" && c.name != "created_at")
            .map(|c| format!("{} = excluded.{}", c.name, c.name))
            .collect::<Vec<_>>()
            .join(", ");
        sql.push_str(&format!(" ON CONFLICT(id) DO UPDATE SET {}", updates));
    }

    let mut query = sqlx::query(&sql);
    for column in columns {
        query = bind_value(query, table, column, row.get(column.name).unwrap_or(&NULL))?;
    }
    query
        .execute(&mut *conn)
        .await
        .map_err(store_error(table))?;

    let id = row.get("id").and_then(Value::as_str).unwrap_or_default();
    fetch_by_id(conn, table, id).await
}

async fn delete_rows(
    conn: &mut SqliteConnection,
    table: Table,
    filter: &Filter,
) -> Result<u64, StoreError> {
    let column = table
        .column(&filter.column)
        .ok_or_else(|| unknown_column(table, &filter.column))?;

    let sql = format!("DELETE FROM {} WHERE {} = ?", table, column.name);
    let query = bind_value(sqlx::query(&sql), table, column, &filter.value)?;
    let result = query
        .execute(&mut *conn)
        .await
        .map_err(store_error(table))?;
    Ok(result.rows_affected())
}

#[async_trait]
impl RemoteStore for SqliteStore {
    async fn select(
        &self,
        table: Table,
        filter: Option<&Filter>,
    ) -> Result<Vec<WireRow>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(store_error(table))?;
        select_rows(&mut conn, table, filter).await
    }

    async fn insert(&self, table: Table, rows: Vec<WireRow>) -> Result<Vec<WireRow>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_error(table))?;
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            stored.push(write_row(&mut tx, table, row, false).await?);
        }
        tx.commit().await.map_err(store_error(table))?;
        Ok(stored)
    }

    async fn upsert(&self, table: Table, rows: Vec<WireRow>) -> Result<Vec<WireRow>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_error(table))?;
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            stored.push(write_row(&mut tx, table, row, true).await?);
        }
        tx.commit().await.map_err(store_error(table))?;
        Ok(stored)
    }

    async fn update(
        &self,
        table: Table,
        filter: &Filter,
        changes: WireRow,
    ) -> Result<Vec<WireRow>, StoreError> {
        let filter_column = table
            .column(&filter.column)
            .ok_or_else(|| unknown_column(table, &filter.column))?;

        let mut assignments: Vec<(&'static Column, Value)> = Vec::new();
        for (key, value) in changes {
            if key == "id" || key == "created_at" || key == "updated_at" {
                continue;
            }
            let column = table.column(&key).ok_or_else(|| unknown_column(table, &key))?;
            assignments.push((column, value));
        }
        if table.has_updated_at() {
            if let Some(column) = table.column("updated_at") {
                assignments.push((column, Value::String(Utc::now().to_rfc3339())));
            }
        }

        let mut tx = self.pool.begin().await.map_err(store_error(table))?;
        if !assignments.is_empty() {
            let sets = assignments
                .iter()
                .map(|(c, _)| format!("{} = ?", c.name))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "UPDATE {} SET {} WHERE {} = ?",
                table, sets, filter_column.name
            );

            let mut query = sqlx::query(&sql);
            for (column, value) in &assignments {
                query = bind_value(query, table, column, value)?;
            }
            query = bind_value(query, table, filter_column, &filter.value)?;
            query.execute(&mut *tx).await.map_err(store_error(table))?;
        }

        let updated = select_rows(&mut tx, table, Some(filter)).await?;
        tx.commit().await.map_err(store_error(table))?;
        Ok(updated)
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<u64, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(store_error(table))?;
        delete_rows(&mut conn, table, filter).await
    }

    async fn replace(
        &self,
        table: Table,
        filter: &Filter,
        rows: Vec<WireRow>,
    ) -> Result<Vec<WireRow>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_error(table))?;
        let removed = delete_rows(&mut tx, table, filter).await?;

        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            stored.push(write_row(&mut tx, table, row, false).await?);
        }
        tx.commit().await.map_err(store_error(table))?;

        tracing::debug!(
            "Replaced {} {} row(s) with {} where {}",
            removed,
            table,
            stored.len(),
            filter
        );
        Ok(stored)
    }
}
