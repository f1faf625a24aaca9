use futures::future::join3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::error::SyncError;
use super::guard::InFlight;
use crate::aggregate;
use crate::models::{validate_stops, Adventure, RouteData};
use crate::store::{
    decode_adventure, decode_badges, decode_flights, decode_stops, encode_adventure,
    encode_badges, encode_flights, encode_stops, row_id, Filter, RemoteStore, StoreError, Table,
    WireRow,
};

/// How an edit replaces a child collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplaceStrategy {
    /// Delete and re-insert inside one store transaction.
    #[default]
    Atomic,
    /// Separate delete and insert calls. An insert failure leaves the
    /// collection empty remotely.
    DeleteThenInsert,
}

impl fmt::Display for ReplaceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplaceStrategy::Atomic => write!(f, "atomic"),
            ReplaceStrategy::DeleteThenInsert => write!(f, "delete-then-insert"),
        }
    }
}

impl FromStr for ReplaceStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "atomic" => Ok(ReplaceStrategy::Atomic),
            "delete-then-insert" => Ok(ReplaceStrategy::DeleteThenInsert),
            _ => Err(format!(
                "Invalid replace strategy '{}'. Valid options: atomic, delete-then-insert",
                s
            )),
        }
    }
}

/// One of the three child collections of an adventure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildCollection {
    Flights,
    Stops,
    Badges,
}

impl ChildCollection {
    pub fn table(&self) -> Table {
        match self {
            ChildCollection::Flights => Table::AdventureFlights,
            ChildCollection::Stops => Table::AdventurePlaces,
            ChildCollection::Badges => Table::AdventureBadges,
        }
    }
}

impl fmt::Display for ChildCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildCollection::Flights => write!(f, "flights"),
            ChildCollection::Stops => write!(f, "stops"),
            ChildCollection::Badges => write!(f, "badges"),
        }
    }
}

struct ChildRows {
    flights: Vec<WireRow>,
    stops: Vec<WireRow>,
    badges: Vec<WireRow>,
}

impl ChildRows {
    /// Child ids are dropped: every write replaces the whole collection and
    /// the store assigns fresh ids, so a copy under a new parent never
    /// collides with the rows it was exported from.
    fn encode(adventure_id: &str, route: &RouteData) -> Self {
        Self {
            flights: without_ids(encode_flights(adventure_id, &route.flights)),
            stops: without_ids(encode_stops(adventure_id, &route.stops)),
            badges: without_ids(encode_badges(adventure_id, &route.badges)),
        }
    }
}

fn without_ids(mut rows: Vec<WireRow>) -> Vec<WireRow> {
    for row in &mut rows {
        row.remove("id");
    }
    rows
}

type ChildResults = (
    Result<Vec<WireRow>, StoreError>,
    Result<Vec<WireRow>, StoreError>,
    Result<Vec<WireRow>, StoreError>,
);

/// Writes whole adventures to a `RemoteStore`.
///
/// Child collections are always written as complete replacements. The three
/// collections of one adventure are written concurrently; within a collection
/// the delete always precedes the insert. Writes for the same adventure id
/// never overlap: a second one fails with `SyncError::Busy`.
pub struct SyncEngine {
    store: Arc<dyn RemoteStore>,
    strategy: ReplaceStrategy,
    user_id: Option<String>,
    in_flight: InFlight,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            strategy: ReplaceStrategy::default(),
            user_id: None,
            in_flight: InFlight::new(),
        }
    }

    pub fn with_strategy(mut self, strategy: ReplaceStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Attributes adventures written without an owner to `user_id`.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn strategy(&self) -> ReplaceStrategy {
        self.strategy
    }

    pub fn is_busy(&self, adventure_id: &str) -> bool {
        self.in_flight.is_busy(adventure_id)
    }

    /// Inserts a new adventure and its children.
    ///
    /// The returned adventure carries store-assigned ids and timestamps.
    pub async fn create(&self, adventure: Adventure) -> Result<Adventure, SyncError> {
        validate_stops(&adventure.route.stops)?;
        let _guard = self.in_flight.acquire(&adventure.id)?;
        let adventure = self.prepare(adventure);

        tracing::info!("Creating adventure {} ({})", adventure.id, adventure.name);
        let parent = self
            .store
            .insert(Table::Adventures, vec![encode_adventure(&adventure)])
            .await
            .map_err(|e| {
                tracing::warn!("Failed to insert adventure {}: {}", adventure.id, e);
                SyncError::from(e)
            })?
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::NotFound(adventure.id.clone()))?;
        let id = row_id(Table::Adventures, &parent)?;

        let children = ChildRows::encode(&id, &adventure.route);
        let results = join3(
            self.insert_children(ChildCollection::Flights, children.flights),
            self.insert_children(ChildCollection::Stops, children.stops),
            self.insert_children(ChildCollection::Badges, children.badges),
        )
        .await;

        let adventure = assemble(&id, parent, results)?;
        tracing::info!(
            "Created adventure {} with {} stop(s)",
            id,
            adventure.route.stops.len()
        );
        Ok(adventure)
    }

    /// Updates the parent row and replaces all three child collections.
    pub async fn edit(&self, adventure_id: &str, updated: Adventure) -> Result<Adventure, SyncError> {
        validate_stops(&updated.route.stops)?;
        let _guard = self.in_flight.acquire(adventure_id)?;
        let mut updated = self.prepare(updated);
        updated.id = adventure_id.to_string();

        tracing::info!(
            "Editing adventure {} ({} strategy)",
            adventure_id,
            self.strategy
        );
        let mut changes = encode_adventure(&updated);
        changes.remove("id");
        let parent = self
            .store
            .update(Table::Adventures, &Filter::eq("id", adventure_id), changes)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::NotFound(adventure_id.to_string()))?;

        let results = self.replace_all(adventure_id, &updated.route).await;
        let adventure = assemble(adventure_id, parent, results)?;
        tracing::info!("Saved adventure {}", adventure_id);
        Ok(adventure)
    }

    /// Upserts the parent and replaces every child collection.
    ///
    /// Works whether or not the adventure already exists remotely.
    pub async fn save(&self, adventure: Adventure) -> Result<Adventure, SyncError> {
        validate_stops(&adventure.route.stops)?;
        let _guard = self.in_flight.acquire(&adventure.id)?;
        let adventure = self.prepare(adventure);

        tracing::info!("Saving adventure {} ({})", adventure.id, adventure.name);
        let parent = self
            .store
            .upsert(Table::Adventures, vec![encode_adventure(&adventure)])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::NotFound(adventure.id.clone()))?;
        let id = row_id(Table::Adventures, &parent)?;

        let results = self.replace_all(&id, &adventure.route).await;
        assemble(&id, parent, results)
    }

    /// Deletes an adventure. Children go with it through the store's cascade.
    ///
    /// Returns `false` when no such adventure existed.
    pub async fn delete(&self, adventure_id: &str) -> Result<bool, SyncError> {
        let _guard = self.in_flight.acquire(adventure_id)?;

        tracing::info!("Deleting adventure {}", adventure_id);
        let removed = self
            .store
            .delete(Table::Adventures, &Filter::eq("id", adventure_id))
            .await?;
        if removed == 0 {
            tracing::debug!("Adventure {} was already gone", adventure_id);
        }
        Ok(removed > 0)
    }

    /// Reads one adventure with all of its children.
    pub async fn fetch_full(&self, adventure_id: &str) -> Result<Adventure, SyncError> {
        tracing::debug!("Fetching adventure {}", adventure_id);
        let parent = self
            .store
            .select(Table::Adventures, Some(&Filter::eq("id", adventure_id)))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::NotFound(adventure_id.to_string()))?;

        let by_parent = Filter::eq("adventure_id", adventure_id);
        let (flights, stops, badges) = join3(
            self.store.select(Table::AdventureFlights, Some(&by_parent)),
            self.store.select(Table::AdventurePlaces, Some(&by_parent)),
            self.store.select(Table::AdventureBadges, Some(&by_parent)),
        )
        .await;

        let route = RouteData {
            flights: decode_flights(flights?)?,
            stops: decode_stops(stops?)?,
            badges: decode_badges(badges?)?,
            ..RouteData::default()
        };
        Ok(decode_adventure(parent, route)?)
    }

    /// Reads every adventure, oldest first.
    pub async fn fetch_all(&self) -> Result<Vec<Adventure>, SyncError> {
        let (parents, flights, stops, badges) = futures::future::join4(
            self.store.select(Table::Adventures, None),
            self.store.select(Table::AdventureFlights, None),
            self.store.select(Table::AdventurePlaces, None),
            self.store.select(Table::AdventureBadges, None),
        )
        .await;

        let mut flights = group_by_parent(flights?);
        let mut stops = group_by_parent(stops?);
        let mut badges = group_by_parent(badges?);

        let mut adventures = parents?
            .into_iter()
            .map(|parent| -> Result<Adventure, SyncError> {
                let id = row_id(Table::Adventures, &parent)?;
                let route = RouteData {
                    flights: decode_flights(flights.remove(&id).unwrap_or_default())?,
                    stops: decode_stops(stops.remove(&id).unwrap_or_default())?,
                    badges: decode_badges(badges.remove(&id).unwrap_or_default())?,
                    ..RouteData::default()
                };
                Ok(decode_adventure(parent, route)?)
            })
            .collect::<Result<Vec<_>, _>>()?;

        adventures.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        tracing::debug!("Fetched {} adventure(s)", adventures.len());
        Ok(adventures)
    }

    fn prepare(&self, mut adventure: Adventure) -> Adventure {
        adventure.route.total_nights = aggregate::total_nights(&adventure.route.stops);
        if adventure.user_id.is_none() {
            adventure.user_id = self.user_id.clone();
        }
        adventure
    }

    async fn insert_children(
        &self,
        collection: ChildCollection,
        rows: Vec<WireRow>,
    ) -> Result<Vec<WireRow>, StoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!("Inserting {} {} row(s)", rows.len(), collection);
        self.store.insert(collection.table(), rows).await
    }

    async fn replace_children(
        &self,
        collection: ChildCollection,
        adventure_id: &str,
        rows: Vec<WireRow>,
    ) -> Result<Vec<WireRow>, StoreError> {
        let by_parent = Filter::eq("adventure_id", adventure_id);
        tracing::debug!(
            "Replacing {} of {} with {} row(s)",
            collection,
            adventure_id,
            rows.len()
        );

        match self.strategy {
            ReplaceStrategy::Atomic => {
                self.store
                    .replace(collection.table(), &by_parent, rows)
                    .await
            }
            ReplaceStrategy::DeleteThenInsert => {
                self.store.delete(collection.table(), &by_parent).await?;
                self.insert_children(collection, rows).await
            }
        }
    }

    async fn replace_all(&self, adventure_id: &str, route: &RouteData) -> ChildResults {
        let children = ChildRows::encode(adventure_id, route);
        join3(
            self.replace_children(ChildCollection::Flights, adventure_id, children.flights),
            self.replace_children(ChildCollection::Stops, adventure_id, children.stops),
            self.replace_children(ChildCollection::Badges, adventure_id, children.badges),
        )
        .await
    }
}

fn group_by_parent(rows: Vec<WireRow>) -> HashMap<String, Vec<WireRow>> {
    let mut grouped: HashMap<String, Vec<WireRow>> = HashMap::new();
    for row in rows {
        let parent = row
            .get("adventure_id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        grouped.entry(parent).or_default().push(row);
    }
    grouped
}

/// Turns the written parent row and child results into an adventure, or a
/// `PartialSync` naming the first collection that failed.
fn assemble(adventure_id: &str, parent: WireRow, results: ChildResults) -> Result<Adventure, SyncError> {
    let partial = |collection: ChildCollection, source: StoreError| {
        tracing::warn!(
            "Adventure {} partially saved: {} failed: {}",
            adventure_id,
            collection,
            source
        );
        SyncError::PartialSync {
            adventure_id: adventure_id.to_string(),
            collection,
            source,
        }
    };

    let (flights, stops, badges) = results;
    let flights = flights.map_err(|e| partial(ChildCollection::Flights, e))?;
    let stops = stops.map_err(|e| partial(ChildCollection::Stops, e))?;
    let badges = badges.map_err(|e| partial(ChildCollection::Badges, e))?;

    let route = RouteData {
        flights: decode_flights(flights)?,
        stops: decode_stops(stops)?,
        badges: decode_badges(badges)?,
        ..RouteData::default()
    };
    Ok(decode_adventure(parent, route)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, Flight, Stop, ValidationError};
    use crate::store::{MemoryStore, StoreOp};
    use std::time::Duration;

    fn europe() -> Adventure {
        Adventure::new("European Adventure")
            .with_duration_label("12 days")
            .with_stops(vec![
                Stop::new("Paris", Coordinate::new(48.8566, 2.3522))
                    .with_nights(3)
                    .with_hotel("Le Marais", 150)
                    .as_start_point(),
                Stop::new("Rome", Coordinate::new(41.9028, 12.4964)).with_nights(4),
                Stop::new("Barcelona", Coordinate::new(41.3874, 2.1686)).with_nights(3),
                Stop::new("Amsterdam", Coordinate::new(52.3676, 4.9041)).with_nights(2),
            ])
            .with_flights(vec![Flight::new("Paris → Rome", "Mar 3", "2h", "€89")])
            .with_badges(vec!["🗼".into(), "🍝".into()])
            .with_total_cost(2400)
    }

    fn engine(store: &Arc<MemoryStore>) -> SyncEngine {
        SyncEngine::new(store.clone())
    }

    fn names(adventure: &Adventure) -> Vec<&str> {
        adventure.route.stops.iter().map(|s| s.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_create_then_fetch_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(&store);
        let submitted = europe();

        let created = engine.create(submitted.clone()).await.unwrap();
        assert!(created.is_saved());
        assert!(created.route.stops.iter().all(|s| s.id.is_some()));
        assert_eq!(created.route.total_nights, 12);

        let fetched = engine.fetch_full(&created.id).await.unwrap();
        assert_eq!(names(&fetched), vec!["Paris", "Rome", "Barcelona", "Amsterdam"]);
        for (got, want) in fetched.route.stops.iter().zip(&submitted.route.stops) {
            assert_eq!(got.nights, want.nights);
            assert_eq!(got.is_start_point, want.is_start_point);
            assert_eq!(got.hotel_name, want.hotel_name);
            assert_eq!(got.coordinate, want.coordinate);
        }
        assert_eq!(fetched.route.flights[0].route_label, "Paris → Rome");
        assert_eq!(fetched.route.badges, vec!["🗼".to_string(), "🍝".to_string()]);
        assert_eq!(fetched.route.total_cost, 2400);
        assert_eq!(fetched.duration_label, "12 days");
    }

    #[tokio::test]
    async fn test_create_stamps_user_and_nights() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(&store).with_user_id("traveler");

        let mut adventure = europe();
        adventure.route.total_nights = 99;
        let created = engine.create(adventure).await.unwrap();

        assert_eq!(created.user_id.as_deref(), Some("traveler"));
        assert_eq!(created.route.total_nights, 12);
    }

    #[tokio::test]
    async fn test_invalid_stops_never_reach_store() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(&store);
        let adventure = Adventure::new("Broken").with_stops(vec![
            Stop::new("A", Coordinate::new(0.0, 0.0)).as_start_point(),
            Stop::new("B", Coordinate::new(1.0, 1.0)).as_start_point(),
        ]);

        let err = engine.create(adventure).await.unwrap_err();
        assert_eq!(
            err,
            SyncError::Validation(ValidationError::MultipleStartPoints { count: 2 })
        );
        assert!(store.operations().is_empty());
    }

    #[tokio::test]
    async fn test_create_parent_failure_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(&store);
        store.fail_next(
            StoreOp::Insert,
            Table::Adventures,
            StoreError::Transport("offline".into()),
        );

        let err = engine.create(europe()).await.unwrap_err();
        assert_eq!(err, SyncError::Transport("offline".into()));
        assert_eq!(store.row_count(Table::Adventures), 0);
        assert_eq!(store.row_count(Table::AdventurePlaces), 0);
    }

    #[tokio::test]
    async fn test_create_child_failure_is_partial() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(&store);
        store.fail_next(
            StoreOp::Insert,
            Table::AdventureBadges,
            StoreError::Constraint("badge_emoji".into()),
        );

        let adventure = europe();
        let id = adventure.id.clone();
        let err = engine.create(adventure).await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::PartialSync { collection: ChildCollection::Badges, .. }
        ));
        assert!(err.requires_resync());

        let fetched = engine.fetch_full(&id).await.unwrap();
        assert!(fetched.route.badges.is_empty());
        assert_eq!(fetched.route.stops.len(), 4);
    }

    #[tokio::test]
    async fn test_edit_replaces_children() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(&store);
        let created = engine.create(europe()).await.unwrap();

        let mut updated = created.clone();
        updated.name = "Shorter Trip".into();
        updated.route.stops.truncate(2);
        updated.route.stops.reverse();
        updated.route.badges.clear();

        let saved = engine.edit(&created.id, updated).await.unwrap();
        assert_eq!(saved.id, created.id);
        assert_eq!(saved.name, "Shorter Trip");
        assert_eq!(saved.route.total_nights, 7);
        assert_eq!(saved.created_at, created.created_at);

        let fetched = engine.fetch_full(&created.id).await.unwrap();
        assert_eq!(names(&fetched), vec!["Rome", "Paris"]);
        assert!(fetched.route.badges.is_empty());
        assert_eq!(store.row_count(Table::AdventurePlaces), 2);
    }

    #[tokio::test]
    async fn test_edit_unknown_adventure() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(&store);
        let err = engine.edit("missing", europe()).await.unwrap_err();
        assert_eq!(err, SyncError::NotFound("missing".into()));
    }

    #[tokio::test]
    async fn test_delete_then_insert_failure_leaves_empty_collection() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(&store).with_strategy(ReplaceStrategy::DeleteThenInsert);
        let created = engine.create(europe()).await.unwrap();

        store.fail_next(
            StoreOp::Insert,
            Table::AdventurePlaces,
            StoreError::Transport("connection reset".into()),
        );
        let err = engine.edit(&created.id, created.clone()).await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::PartialSync { collection: ChildCollection::Stops, .. }
        ));

        let fetched = engine.fetch_full(&created.id).await.unwrap();
        assert!(fetched.route.stops.is_empty());
        assert_eq!(fetched.route.flights.len(), 1);
    }

    #[tokio::test]
    async fn test_atomic_replace_failure_keeps_old_collection() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(&store);
        let created = engine.create(europe()).await.unwrap();

        store.fail_next(
            StoreOp::Replace,
            Table::AdventurePlaces,
            StoreError::Transport("connection reset".into()),
        );
        let mut updated = created.clone();
        updated.route.stops.truncate(1);
        let err = engine.edit(&created.id, updated).await.unwrap_err();
        assert!(err.requires_resync());

        let fetched = engine.fetch_full(&created.id).await.unwrap();
        assert_eq!(fetched.route.stops.len(), 4);
    }

    #[tokio::test]
    async fn test_edit_orders_parent_delete_insert() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(&store).with_strategy(ReplaceStrategy::DeleteThenInsert);
        let created = engine.create(europe()).await.unwrap();
        store.clear_operations();

        engine.edit(&created.id, created.clone()).await.unwrap();
        let ops = store.operations();
        let at = |op: StoreOp, table: Table| {
            ops.iter().position(|o| *o == (op, table)).unwrap()
        };

        let update = at(StoreOp::Update, Table::Adventures);
        for table in Table::CHILDREN {
            let delete = at(StoreOp::Delete, table);
            let insert = at(StoreOp::Insert, table);
            assert!(update < delete, "{} deleted before parent update", table);
            assert!(delete < insert, "{} inserted before delete", table);
        }
    }

    #[tokio::test]
    async fn test_concurrent_save_for_same_id_is_rejected() {
        let store = Arc::new(MemoryStore::new().with_latency(Duration::from_millis(20)));
        let engine = engine(&store);
        let adventure = europe();

        let (first, second) = tokio::join!(
            engine.create(adventure.clone()),
            engine.create(adventure.clone())
        );
        assert!(first.is_ok());
        assert_eq!(second.unwrap_err(), SyncError::Busy(adventure.id.clone()));
        assert!(!engine.is_busy(&adventure.id));
        assert_eq!(store.row_count(Table::Adventures), 1);
    }

    #[tokio::test]
    async fn test_different_ids_may_save_concurrently() {
        let store = Arc::new(MemoryStore::new().with_latency(Duration::from_millis(5)));
        let engine = engine(&store);

        let (a, b) = tokio::join!(engine.create(europe()), engine.create(europe()));
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(store.row_count(Table::Adventures), 2);
    }

    #[tokio::test]
    async fn test_delete_twice_is_a_clean_noop() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(&store);
        let doomed = engine.create(europe()).await.unwrap();
        let kept = engine.create(europe()).await.unwrap();

        assert!(engine.delete(&doomed.id).await.unwrap());
        assert!(!engine.delete(&doomed.id).await.unwrap());

        assert_eq!(
            engine.fetch_full(&doomed.id).await.unwrap_err(),
            SyncError::NotFound(doomed.id.clone())
        );
        let survivor = engine.fetch_full(&kept.id).await.unwrap();
        assert_eq!(survivor.route.stops.len(), 4);
        assert_eq!(store.row_count(Table::AdventurePlaces), 4);
    }

    #[tokio::test]
    async fn test_fetch_all_hydrates_each_adventure() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(&store);
        let first = engine.create(europe()).await.unwrap();
        let second = engine
            .create(Adventure::new("Weekend").with_stops(vec![Stop::new(
                "Lisbon",
                Coordinate::new(38.72, -9.14),
            )]))
            .await
            .unwrap();

        let all = engine.fetch_all().await.unwrap();
        assert_eq!(all.len(), 2);
        let by_id = |id: &str| all.iter().find(|a| a.id == id).unwrap();
        assert_eq!(by_id(&first.id).route.stops.len(), 4);
        assert_eq!(names(by_id(&second.id)), vec!["Lisbon"]);
    }

    #[tokio::test]
    async fn test_save_upserts() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(&store);
        let adventure = europe().with_id("imported");

        let saved = engine.save(adventure.clone()).await.unwrap();
        assert_eq!(saved.id, "imported");

        let mut again = adventure;
        again.route.stops.truncate(1);
        engine.save(again).await.unwrap();

        assert_eq!(store.row_count(Table::Adventures), 1);
        let fetched = engine.fetch_full("imported").await.unwrap();
        assert_eq!(names(&fetched), vec!["Paris"]);
    }

    #[tokio::test]
    async fn test_save_copy_under_new_id_keeps_both() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(&store);
        let original = engine.create(europe()).await.unwrap();

        let copy = engine
            .save(original.clone().with_id("copy"))
            .await
            .unwrap();

        assert_eq!(names(&copy), names(&original));
        assert_eq!(copy.route.flights.len(), 1);
        assert_ne!(copy.route.stops[0].id, original.route.stops[0].id);

        let fetched = engine.fetch_full(&original.id).await.unwrap();
        assert_eq!(fetched.route.stops.len(), 4);
        assert_eq!(fetched.route.flights.len(), 1);
        assert_eq!(store.row_count(Table::AdventurePlaces), 8);
        assert_eq!(store.row_count(Table::AdventureFlights), 2);
    }

    #[test]
    fn test_replace_strategy_parsing() {
        assert_eq!(
            "delete-then-insert".parse::<ReplaceStrategy>().unwrap(),
            ReplaceStrategy::DeleteThenInsert
        );
        assert_eq!(
            "ATOMIC".parse::<ReplaceStrategy>().unwrap(),
            ReplaceStrategy::Atomic
        );
        assert!("eventual".parse::<ReplaceStrategy>().is_err());
        assert_eq!(ReplaceStrategy::DeleteThenInsert.to_string(), "delete-then-insert");
    }
}
