use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use super::error::SyncError;

/// Set of adventure ids with a write in progress.
///
/// A second write for an id that is already held is rejected with
/// `SyncError::Busy`; it is never queued behind or interleaved with the first.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    ids: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, id: &str) -> Result<InFlightGuard, SyncError> {
        if !lock(&self.ids).insert(id.to_string()) {
            return Err(SyncError::Busy(id.to_string()));
        }
        Ok(InFlightGuard {
            ids: Arc::clone(&self.ids),
            id: id.to_string(),
        })
    }

    pub fn is_busy(&self, id: &str) -> bool {
        lock(&self.ids).contains(id)
    }
}

fn lock(ids: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    ids.lock().unwrap_or_else(|e| e.into_inner())
}

/// Releases the id when dropped, including when the owning future is dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    ids: Arc<Mutex<HashSet<String>>>,
    id: String,
}

impl InFlightGuard {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.ids).remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_rejected() {
        let in_flight = InFlight::new();
        let guard = in_flight.acquire("a1").unwrap();
        assert_eq!(guard.id(), "a1");
        assert!(in_flight.is_busy("a1"));

        assert_eq!(
            in_flight.acquire("a1").unwrap_err(),
            SyncError::Busy("a1".into())
        );
        assert!(in_flight.acquire("a2").is_ok());
    }

    #[test]
    fn test_drop_releases() {
        let in_flight = InFlight::new();
        {
            let _guard = in_flight.acquire("a1").unwrap();
        }
        assert!(!in_flight.is_busy("a1"));
        assert!(in_flight.acquire("a1").is_ok());
    }

    #[test]
    fn test_clones_share_state() {
        let in_flight = InFlight::new();
        let other = in_flight.clone();
        let _guard = in_flight.acquire("a1").unwrap();
        assert!(other.is_busy("a1"));
    }
}
