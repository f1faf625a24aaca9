//! In-memory editing of an adventure's ordered stop list.
//!
//! Every operation keeps the "at most one start point" invariant. Nothing here
//! touches the remote store; the edited stops are handed to
//! `SyncEngine::edit` as a complete replacement collection.

use serde::Serialize;
use thiserror::Error;

use crate::aggregate;
use crate::models::{validate_stops, Stop, ValidationError};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ItineraryError {
    #[error("stop index {index} is out of bounds (itinerary has {len} stops)")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: i64 },
}

/// Position of one stop on the trip calendar. Derived, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduledStop {
    pub index: usize,
    /// 1-based day of arrival.
    pub arrival_day: i64,
    /// Day the traveler moves on (arrival + nights).
    pub departure_day: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EditableItinerary {
    stops: Vec<Stop>,
}

impl EditableItinerary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing stop list, rejecting one that already breaks an invariant.
    pub fn from_stops(stops: Vec<Stop>) -> Result<Self, ValidationError> {
        validate_stops(&stops)?;
        Ok(Self { stops })
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn into_stops(self) -> Vec<Stop> {
        self.stops
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Stop> {
        self.stops.get(index)
    }

    /// Inserts `stop` right after `index`, clamped to the end of the list.
    ///
    /// Returns the position the stop landed at. The new stop never becomes
    /// the start point, even if it was built as one.
    pub fn insert_after(&mut self, index: usize, mut stop: Stop) -> usize {
        stop.is_start_point = false;
        let at = index.saturating_add(1).min(self.stops.len());
        self.stops.insert(at, stop);
        at
    }

    pub fn append(&mut self, mut stop: Stop) -> usize {
        stop.is_start_point = false;
        self.stops.push(stop);
        self.stops.len() - 1
    }

    /// Removes a stop. Removing the start point leaves the itinerary without one.
    pub fn remove_at(&mut self, index: usize) -> Result<Stop, ItineraryError> {
        self.check_index(index)?;
        Ok(self.stops.remove(index))
    }

    pub fn set_nights(&mut self, index: usize, nights: i32) -> Result<(), ItineraryError> {
        self.check_index(index)?;
        if nights < 1 {
            return Err(ItineraryError::InvalidValue {
                field: "nights",
                value: i64::from(nights),
            });
        }
        self.stops[index].nights = nights;
        Ok(())
    }

    /// Marks or unmarks the start point.
    ///
    /// Marking clears the flag on every other stop first; unmarking only
    /// touches `index`.
    pub fn set_start_point(&mut self, index: usize, is_start: bool) -> Result<(), ItineraryError> {
        self.check_index(index)?;
        if is_start {
            for stop in &mut self.stops {
                stop.is_start_point = false;
            }
        }
        self.stops[index].is_start_point = is_start;
        Ok(())
    }

    pub fn set_hotel(
        &mut self,
        index: usize,
        hotel_name: impl Into<String>,
        price_per_night: i32,
    ) -> Result<(), ItineraryError> {
        self.check_index(index)?;
        if price_per_night < 0 {
            return Err(ItineraryError::InvalidValue {
                field: "price per night",
                value: i64::from(price_per_night),
            });
        }
        let stop = &mut self.stops[index];
        stop.hotel_name = hotel_name.into();
        stop.price_per_night = price_per_night;
        Ok(())
    }

    /// Moves the stop at `from` so it ends up at `to`; everything else keeps
    /// its relative order.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), ItineraryError> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from != to {
            let stop = self.stops.remove(from);
            self.stops.insert(to, stop);
        }
        Ok(())
    }

    pub fn start_point(&self) -> Option<usize> {
        self.stops.iter().position(|s| s.is_start_point)
    }

    pub fn total_nights(&self) -> i64 {
        aggregate::total_nights(&self.stops)
    }

    pub fn schedule(&self) -> Vec<ScheduledStop> {
        let mut day = 1;
        self.stops
            .iter()
            .enumerate()
            .map(|(index, stop)| {
                let arrival_day = day;
                day += i64::from(stop.nights);
                ScheduledStop {
                    index,
                    arrival_day,
                    departure_day: day,
                }
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_stops(&self.stops)
    }

    fn check_index(&self, index: usize) -> Result<(), ItineraryError> {
        if index < self.stops.len() {
            Ok(())
        } else {
            Err(ItineraryError::IndexOutOfBounds {
                index,
                len: self.stops.len(),
            })
        }
    }
}
