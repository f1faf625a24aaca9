use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

use super::{Filter, RemoteStore, StoreError, StoreOp, Table, WireRow};

#[derive(Default)]
struct State {
    tables: HashMap<Table, Vec<WireRow>>,
    faults: Vec<(StoreOp, Table, StoreError)>,
    journal: Vec<(StoreOp, Table)>,
}

/// In-process `RemoteStore` with the same constraints as the SQL schema.
///
/// Enforces non-null columns, unique ids and the `adventure_id` foreign key,
/// and cascades parent deletes. Faults can be scheduled per operation and
/// table, and a fixed latency can be added to every call so that concurrent
/// requests actually overlap.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes the next `op` on `table` fail with `error`. Consumed once.
    pub fn fail_next(&self, op: StoreOp, table: Table, error: StoreError) {
        self.lock().faults.push((op, table, error));
    }

    /// Every call received so far, in arrival order.
    pub fn operations(&self) -> Vec<(StoreOp, Table)> {
        self.lock().journal.clone()
    }

    pub fn clear_operations(&self) {
        self.lock().journal.clear();
    }

    pub fn row_count(&self, table: Table) -> usize {
        self.lock().tables.get(&table).map_or(0, Vec::len)
    }

    pub fn rows(&self, table: Table) -> Vec<WireRow> {
        self.lock().tables.get(&table).cloned().unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn enter(&self, op: StoreOp, table: Table) -> Result<(), StoreError> {
        self.lock().journal.push((op, table));

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.lock();
        match state
            .faults
            .iter()
            .position(|(o, t, _)| *o == op && *t == table)
        {
            Some(i) => Err(state.faults.remove(i).2),
            None => Ok(()),
        }
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

fn id_of(row: &WireRow) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

fn stamp_new(table: Table, row: &mut WireRow) {
    if id_of(row).is_none() {
        row.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
    }
    let ts = now();
    if !matches!(row.get("created_at"), Some(Value::String(_))) {
        row.insert("created_at".into(), Value::String(ts.clone()));
    }
    if table.has_updated_at() {
        row.insert("updated_at".into(), Value::String(ts));
    }
}

fn check_row(
    table: Table,
    row: &WireRow,
    tables: &HashMap<Table, Vec<WireRow>>,
) -> Result<(), StoreError> {
    for key in row.keys() {
        if table.column(key).is_none() {
            return Err(StoreError::Constraint(format!(
                "column \"{}\" of relation \"{}\" does not exist",
                key, table
            )));
        }
    }

    for column in table.columns().iter().filter(|c| c.required) {
        if matches!(row.get(column.name), None | Some(Value::Null)) {
            return Err(StoreError::Constraint(format!(
                "null value in column \"{}\" of relation \"{}\" violates not-null constraint",
                column.name, table
            )));
        }
    }

    if table.is_child() {
        let parent = row.get("adventure_id").and_then(Value::as_str);
        let exists = tables
            .get(&Table::Adventures)
            .is_some_and(|rows| rows.iter().any(|r| id_of(r) == parent));
        if !exists {
            return Err(StoreError::Constraint(format!(
                "insert or update on table \"{}\" violates foreign key constraint \"{}_adventure_id_fkey\"",
                table, table
            )));
        }
    }

    Ok(())
}

fn insert_rows(
    tables: &mut HashMap<Table, Vec<WireRow>>,
    table: Table,
    rows: Vec<WireRow>,
) -> Result<Vec<WireRow>, StoreError> {
    let mut stored = Vec::with_capacity(rows.len());
    for mut row in rows {
        stamp_new(table, &mut row);
        check_row(table, &row, tables)?;

        let existing = tables.entry(table).or_default();
        if existing.iter().any(|r| id_of(r) == id_of(&row)) {
            return Err(StoreError::Constraint(format!(
                "duplicate key value violates unique constraint \"{}_pkey\"",
                table
            )));
        }
        existing.push(row.clone());
        stored.push(row);
    }
    Ok(stored)
}

fn sorted(table: Table, mut rows: Vec<WireRow>) -> Vec<WireRow> {
    if table.is_ordered() {
        rows.sort_by_key(|r| r.get("position").and_then(Value::as_i64).unwrap_or(i64::MAX));
    }
    rows
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select(
        &self,
        table: Table,
        filter: Option<&Filter>,
    ) -> Result<Vec<WireRow>, StoreError> {
        self.enter(StoreOp::Select, table).await?;
        let state = self.lock();
        let rows = state
            .tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|r| filter.map_or(true, |f| f.matches(r)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(sorted(table, rows))
    }

    async fn insert(&self, table: Table, rows: Vec<WireRow>) -> Result<Vec<WireRow>, StoreError> {
        self.enter(StoreOp::Insert, table).await?;
        let mut state = self.lock();
        let mut staged = state.tables.clone();
        let stored = insert_rows(&mut staged, table, rows)?;
        state.tables = staged;
        Ok(stored)
    }

    async fn upsert(&self, table: Table, rows: Vec<WireRow>) -> Result<Vec<WireRow>, StoreError> {
        self.enter(StoreOp::Upsert, table).await?;
        let mut state = self.lock();
        let mut staged = state.tables.clone();
        let mut stored = Vec::with_capacity(rows.len());

        for row in rows {
            let position = id_of(&row).and_then(|id| {
                staged
                    .get(&table)
                    .and_then(|existing| existing.iter().position(|r| id_of(r) == Some(id)))
            });

            match position {
                Some(i) => {
                    let mut merged = staged[&table][i].clone();
                    for (key, value) in row {
                        if key != "created_at" {
                            merged.insert(key, value);
                        }
                    }
                    if table.has_updated_at() {
                        merged.insert("updated_at".into(), Value::String(now()));
                    }
                    check_row(table, &merged, &staged)?;
                    if let Some(existing) = staged.get_mut(&table) {
                        existing[i] = merged.clone();
                    }
                    stored.push(merged);
                }
                None => stored.extend(insert_rows(&mut staged, table, vec![row])?),
            }
        }

        state.tables = staged;
        Ok(stored)
    }

    async fn update(
        &self,
        table: Table,
        filter: &Filter,
        changes: WireRow,
    ) -> Result<Vec<WireRow>, StoreError> {
        self.enter(StoreOp::Update, table).await?;
        let mut state = self.lock();
        let mut staged = state.tables.clone();
        let mut updated = Vec::new();

        let count = staged.get(&table).map_or(0, Vec::len);
        for i in 0..count {
            if !filter.matches(&staged[&table][i]) {
                continue;
            }
            let mut row = staged[&table][i].clone();
            for (key, value) in &changes {
                if key != "id" && key != "created_at" {
                    row.insert(key.clone(), value.clone());
                }
            }
            if table.has_updated_at() {
                row.insert("updated_at".into(), Value::String(now()));
            }
            check_row(table, &row, &staged)?;
            if let Some(existing) = staged.get_mut(&table) {
                existing[i] = row.clone();
            }
            updated.push(row);
        }

        state.tables = staged;
        Ok(updated)
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<u64, StoreError> {
        self.enter(StoreOp::Delete, table).await?;
        let mut state = self.lock();

        let rows = state.tables.entry(table).or_default();
        let removed: Vec<WireRow> = rows.iter().filter(|r| filter.matches(r)).cloned().collect();
        rows.retain(|r| !filter.matches(r));

        if table == Table::Adventures {
            let parents: HashSet<&str> = removed.iter().filter_map(id_of).collect();
            for child in Table::CHILDREN {
                if let Some(rows) = state.tables.get_mut(&child) {
                    rows.retain(|r| {
                        r.get("adventure_id")
                            .and_then(Value::as_str)
                            .map_or(true, |p| !parents.contains(p))
                    });
                }
            }
        }

        Ok(removed.len() as u64)
    }

    async fn replace(
        &self,
        table: Table,
        filter: &Filter,
        rows: Vec<WireRow>,
    ) -> Result<Vec<WireRow>, StoreError> {
        self.enter(StoreOp::Replace, table).await?;
        let mut state = self.lock();
        let mut staged = state.tables.clone();
        staged.entry(table).or_default().retain(|r| !filter.matches(r));
        let stored = insert_rows(&mut staged, table, rows)?;
        state.tables = staged;
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> WireRow {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn adventure_row(id: &str) -> WireRow {
        row(json!({
            "id": id, "name": "Trip", "description": "", "duration": "", "difficulty": "Easy",
            "budget": "€€", "image": "airplane.departure", "color_hex": "#FF6B35",
            "destinations": [], "highlights": [], "total_cost": 0, "total_nights": 0
        }))
    }

    fn badge_row(adventure_id: &str, position: i64, emoji: &str) -> WireRow {
        row(json!({"adventure_id": adventure_id, "position": position, "badge_emoji": emoji}))
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamps() {
        let store = MemoryStore::new();
        let stored = store
            .insert(Table::Adventures, vec![adventure_row("a1")])
            .await
            .unwrap();
        assert!(stored[0].contains_key("created_at"));
        assert!(stored[0].contains_key("updated_at"));

        let badges = store
            .insert(Table::AdventureBadges, vec![badge_row("a1", 0, "🗼")])
            .await
            .unwrap();
        assert!(id_of(&badges[0]).is_some());
    }

    #[tokio::test]
    async fn test_insert_rejects_null_column() {
        let store = MemoryStore::new();
        let mut parent = adventure_row("a1");
        parent.insert("name".into(), Value::Null);

        let err = store.insert(Table::Adventures, vec![parent]).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint(ref m) if m.contains("\"name\"")));
        assert_eq!(store.row_count(Table::Adventures), 0);
    }

    #[tokio::test]
    async fn test_insert_rejects_unknown_column() {
        let store = MemoryStore::new();
        let mut parent = adventure_row("a1");
        parent.insert("colorHex".into(), json!("#000000"));
        assert!(store.insert(Table::Adventures, vec![parent]).await.is_err());
    }

    #[tokio::test]
    async fn test_insert_requires_parent() {
        let store = MemoryStore::new();
        let err = store
            .insert(Table::AdventureBadges, vec![badge_row("missing", 0, "🗼")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(ref m) if m.contains("foreign key")));
    }

    #[tokio::test]
    async fn test_insert_is_all_or_nothing() {
        let store = MemoryStore::new();
        store.insert(Table::Adventures, vec![adventure_row("a1")]).await.unwrap();

        let rows = vec![badge_row("a1", 0, "🗼"), badge_row("missing", 1, "🍝")];
        assert!(store.insert(Table::AdventureBadges, rows).await.is_err());
        assert_eq!(store.row_count(Table::AdventureBadges), 0);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let store = MemoryStore::new();
        store.insert(Table::Adventures, vec![adventure_row("a1")]).await.unwrap();
        assert!(store.insert(Table::Adventures, vec![adventure_row("a1")]).await.is_err());
    }

    #[tokio::test]
    async fn test_select_orders_children_by_position() {
        let store = MemoryStore::new();
        store.insert(Table::Adventures, vec![adventure_row("a1")]).await.unwrap();
        store
            .insert(
                Table::AdventureBadges,
                vec![badge_row("a1", 1, "second"), badge_row("a1", 0, "first")],
            )
            .await
            .unwrap();

        let rows = store
            .select(Table::AdventureBadges, Some(&Filter::eq("adventure_id", "a1")))
            .await
            .unwrap();
        assert_eq!(rows[0]["badge_emoji"], json!("first"));
        assert_eq!(rows[1]["badge_emoji"], json!("second"));
    }

    #[tokio::test]
    async fn test_update_keeps_identity() {
        let store = MemoryStore::new();
        let created = store
            .insert(Table::Adventures, vec![adventure_row("a1")])
            .await
            .unwrap();

        let mut changes = adventure_row("other");
        changes.insert("name".into(), json!("Renamed"));
        let updated = store
            .update(Table::Adventures, &Filter::eq("id", "a1"), changes)
            .await
            .unwrap();

        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["id"], json!("a1"));
        assert_eq!(updated[0]["name"], json!("Renamed"));
        assert_eq!(updated[0]["created_at"], created[0]["created_at"]);
    }

    #[tokio::test]
    async fn test_update_missing_row_returns_empty() {
        let store = MemoryStore::new();
        let updated = store
            .update(Table::Adventures, &Filter::eq("id", "nope"), adventure_row("nope"))
            .await
            .unwrap();
        assert!(updated.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_overwrites() {
        let store = MemoryStore::new();
        store.upsert(Table::Adventures, vec![adventure_row("a1")]).await.unwrap();

        let mut again = adventure_row("a1");
        again.insert("name".into(), json!("Second"));
        store.upsert(Table::Adventures, vec![again]).await.unwrap();

        let rows = store.rows(Table::Adventures);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], json!("Second"));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_children() {
        let store = MemoryStore::new();
        store
            .insert(Table::Adventures, vec![adventure_row("a1"), adventure_row("a2")])
            .await
            .unwrap();
        store
            .insert(
                Table::AdventureBadges,
                vec![badge_row("a1", 0, "🗼"), badge_row("a2", 0, "🍝")],
            )
            .await
            .unwrap();

        let removed = store
            .delete(Table::Adventures, &Filter::eq("id", "a1"))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.row_count(Table::Adventures), 1);
        let badges = store.rows(Table::AdventureBadges);
        assert_eq!(badges.len(), 1);
        assert_eq!(badges[0]["adventure_id"], json!("a2"));

        let again = store
            .delete(Table::Adventures, &Filter::eq("id", "a1"))
            .await
            .unwrap();
        assert_eq!(again, 0);
    }

    #[tokio::test]
    async fn test_replace_swaps_collection() {
        let store = MemoryStore::new();
        store.insert(Table::Adventures, vec![adventure_row("a1")]).await.unwrap();
        store
            .insert(Table::AdventureBadges, vec![badge_row("a1", 0, "old")])
            .await
            .unwrap();

        store
            .replace(
                Table::AdventureBadges,
                &Filter::eq("adventure_id", "a1"),
                vec![badge_row("a1", 0, "new")],
            )
            .await
            .unwrap();

        let rows = store.rows(Table::AdventureBadges);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["badge_emoji"], json!("new"));
    }

    #[tokio::test]
    async fn test_failed_replace_changes_nothing() {
        let store = MemoryStore::new();
        store.insert(Table::Adventures, vec![adventure_row("a1")]).await.unwrap();
        store
            .insert(Table::AdventureBadges, vec![badge_row("a1", 0, "old")])
            .await
            .unwrap();

        let result = store
            .replace(
                Table::AdventureBadges,
                &Filter::eq("adventure_id", "a1"),
                vec![badge_row("missing", 0, "new")],
            )
            .await;
        assert!(result.is_err());

        let rows = store.rows(Table::AdventureBadges);
        assert_eq!(rows[0]["badge_emoji"], json!("old"));
    }

    #[tokio::test]
    async fn test_fault_is_consumed_once() {
        let store = MemoryStore::new();
        store.fail_next(
            StoreOp::Insert,
            Table::Adventures,
            StoreError::Transport("offline".into()),
        );

        let err = store
            .insert(Table::Adventures, vec![adventure_row("a1")])
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Transport("offline".into()));
        assert_eq!(store.row_count(Table::Adventures), 0);

        store.insert(Table::Adventures, vec![adventure_row("a1")]).await.unwrap();
        assert_eq!(
            store.operations(),
            vec![
                (StoreOp::Insert, Table::Adventures),
                (StoreOp::Insert, Table::Adventures)
            ]
        );
    }
}
