use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use super::engine::SyncEngine;
use super::error::SyncError;
use crate::itinerary::EditableItinerary;
use crate::models::Adventure;

/// Lifecycle of one adventure as seen by the client.
///
/// `Unsaved -> Saving -> Saved <-> Editing -> Saving -> Saved -> Deleting -> Deleted`.
/// `OutOfSync` follows a partial save and lasts until the record is resynced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordState {
    Unsaved,
    Saving,
    Saved,
    Editing,
    Deleting,
    Deleted,
    OutOfSync,
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordState::Unsaved => write!(f, "unsaved"),
            RecordState::Saving => write!(f, "saving"),
            RecordState::Saved => write!(f, "saved"),
            RecordState::Editing => write!(f, "editing"),
            RecordState::Deleting => write!(f, "deleting"),
            RecordState::Deleted => write!(f, "deleted"),
            RecordState::OutOfSync => write!(f, "out of sync"),
        }
    }
}

/// The local list of adventures, kept in step with the store.
///
/// The list only changes after a remote call has completed successfully.
/// A failed call leaves the local copy as it was; a partial save marks the
/// record `OutOfSync` instead.
pub struct AdventureLibrary {
    engine: SyncEngine,
    adventures: Vec<Adventure>,
    states: HashMap<String, RecordState>,
}

impl AdventureLibrary {
    pub fn new(engine: SyncEngine) -> Self {
        Self {
            engine,
            adventures: Vec::new(),
            states: HashMap::new(),
        }
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn adventures(&self) -> &[Adventure] {
        &self.adventures
    }

    pub fn get(&self, id: &str) -> Option<&Adventure> {
        self.adventures.iter().find(|a| a.id == id)
    }

    /// `Unsaved` for ids the library has never seen.
    pub fn state(&self, id: &str) -> RecordState {
        self.states
            .get(id)
            .copied()
            .unwrap_or(RecordState::Unsaved)
    }

    /// Replaces the local list with everything in the store.
    pub async fn load(&mut self) -> Result<usize, SyncError> {
        let adventures = self.engine.fetch_all().await?;
        self.states = adventures
            .iter()
            .map(|a| (a.id.clone(), RecordState::Saved))
            .collect();
        self.adventures = adventures;
        tracing::debug!("Loaded {} adventure(s)", self.adventures.len());
        Ok(self.adventures.len())
    }

    pub async fn create(&mut self, adventure: Adventure) -> Result<Adventure, SyncError> {
        let id = adventure.id.clone();
        self.expect_state(&id, "create", &[RecordState::Unsaved])?;

        self.set_state(&id, RecordState::Saving);
        match self.engine.create(adventure).await {
            Ok(saved) => {
                self.adventures.push(saved.clone());
                self.set_state(&id, RecordState::Saved);
                Ok(saved)
            }
            Err(e) => {
                let state = if e.requires_resync() {
                    RecordState::OutOfSync
                } else {
                    RecordState::Unsaved
                };
                self.set_state(&id, state);
                Err(e)
            }
        }
    }

    /// Starts editing the stops of a saved adventure.
    ///
    /// The returned itinerary works on a copy; nothing changes locally until
    /// `save_edit` succeeds.
    pub fn begin_edit(&mut self, id: &str) -> Result<EditableItinerary, SyncError> {
        self.expect_state(id, "edit", &[RecordState::Saved])?;
        let adventure = self
            .get(id)
            .ok_or_else(|| SyncError::NotFound(id.to_string()))?;
        let itinerary = EditableItinerary::from_stops(adventure.route.stops.clone())?;
        self.set_state(id, RecordState::Editing);
        Ok(itinerary)
    }

    pub fn cancel_edit(&mut self, id: &str) -> Result<(), SyncError> {
        self.expect_state(id, "cancel editing", &[RecordState::Editing])?;
        self.set_state(id, RecordState::Saved);
        Ok(())
    }

    /// Writes the edited stops as the adventure's new stop collection.
    pub async fn save_edit(
        &mut self,
        id: &str,
        itinerary: EditableItinerary,
    ) -> Result<Adventure, SyncError> {
        self.expect_state(id, "save", &[RecordState::Editing])?;
        let mut updated = self
            .get(id)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(id.to_string()))?;
        updated.route.stops = itinerary.into_stops();
        self.write(id, updated, RecordState::Editing).await
    }

    /// Writes a whole modified copy of a saved adventure.
    pub async fn update(&mut self, adventure: Adventure) -> Result<Adventure, SyncError> {
        let id = adventure.id.clone();
        self.expect_state(&id, "update", &[RecordState::Saved])?;
        if self.get(&id).is_none() {
            return Err(SyncError::NotFound(id));
        }
        self.write(&id, adventure, RecordState::Saved).await
    }

    pub async fn delete(&mut self, id: &str) -> Result<bool, SyncError> {
        let previous = self.state(id);
        self.expect_state(
            id,
            "delete",
            &[RecordState::Saved, RecordState::OutOfSync],
        )?;

        self.set_state(id, RecordState::Deleting);
        match self.engine.delete(id).await {
            Ok(removed) => {
                self.adventures.retain(|a| a.id != id);
                self.set_state(id, RecordState::Deleted);
                Ok(removed)
            }
            Err(e) => {
                self.set_state(id, previous);
                Err(e)
            }
        }
    }

    /// Re-reads one adventure from the store and replaces the local copy.
    pub async fn resync(&mut self, id: &str) -> Result<Adventure, SyncError> {
        self.expect_state(
            id,
            "resync",
            &[RecordState::Saved, RecordState::OutOfSync],
        )?;

        match self.engine.fetch_full(id).await {
            Ok(fresh) => {
                self.put(fresh.clone());
                self.set_state(id, RecordState::Saved);
                tracing::info!("Resynced adventure {}", id);
                Ok(fresh)
            }
            Err(SyncError::NotFound(missing)) => {
                self.adventures.retain(|a| a.id != id);
                self.set_state(id, RecordState::Deleted);
                Err(SyncError::NotFound(missing))
            }
            Err(e) => Err(e),
        }
    }

    async fn write(
        &mut self,
        id: &str,
        updated: Adventure,
        on_failure: RecordState,
    ) -> Result<Adventure, SyncError> {
        self.set_state(id, RecordState::Saving);
        match self.engine.edit(id, updated).await {
            Ok(saved) => {
                self.put(saved.clone());
                self.set_state(id, RecordState::Saved);
                Ok(saved)
            }
            Err(e) => {
                let state = if e.requires_resync() {
                    RecordState::OutOfSync
                } else {
                    on_failure
                };
                self.set_state(id, state);
                Err(e)
            }
        }
    }

    fn put(&mut self, adventure: Adventure) {
        match self.adventures.iter_mut().find(|a| a.id == adventure.id) {
            Some(existing) => *existing = adventure,
            None => self.adventures.push(adventure),
        }
    }

    fn expect_state(
        &self,
        id: &str,
        action: &'static str,
        allowed: &[RecordState],
    ) -> Result<(), SyncError> {
        let state = self.state(id);
        if allowed.contains(&state) {
            Ok(())
        } else {
            Err(SyncError::InvalidTransition {
                id: id.to_string(),
                action,
                state,
            })
        }
    }

    fn set_state(&mut self, id: &str, state: RecordState) {
        tracing::debug!("Adventure {} is now {}", id, state);
        self.states.insert(id.to_string(), state);
    }
}
