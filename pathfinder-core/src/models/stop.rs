use serde::{Deserialize, Serialize};
use std::fmt;

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// One destination of an itinerary.
///
/// Stops are ordered within their adventure; the position in the list is the
/// itinerary order and is the only ordering information that is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    /// Assigned by the store on save; `None` for stops that were never saved.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub coordinate: Coordinate,
    pub nights: i32,
    #[serde(default)]
    pub is_start_point: bool,
    #[serde(default)]
    pub hotel_name: String,
    #[serde(default)]
    pub price_per_night: i32,
}

impl Stop {
    pub fn new(name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            id: None,
            name: name.into(),
            coordinate,
            nights: 1,
            is_start_point: false,
            hotel_name: String::new(),
            price_per_night: 0,
        }
    }

    /// The stop the editor inserts when the user asks for a new destination.
    pub fn placeholder() -> Self {
        Self::new("New Destination", Coordinate::new(50.0, 10.0))
            .with_nights(2)
            .with_hotel("New Hotel", 100)
    }

    pub fn with_nights(mut self, nights: i32) -> Self {
        self.nights = nights;
        self
    }

    pub fn with_hotel(mut self, hotel_name: impl Into<String>, price_per_night: i32) -> Self {
        self.hotel_name = hotel_name.into();
        self.price_per_night = price_per_night;
        self
    }

    pub fn as_start_point(mut self) -> Self {
        self.is_start_point = true;
        self
    }

    /// Lodging cost for the whole stay at this stop.
    pub fn lodging_cost(&self) -> i64 {
        i64::from(self.price_per_night) * i64::from(self.nights)
    }
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nights = if self.nights == 1 { "night" } else { "nights" };
        write!(f, "{} ({} {})", self.name, self.nights, nights)?;
        if !self.hotel_name.is_empty() {
            write!(f, " - {}, {}/night", self.hotel_name, self.price_per_night)?;
        }
        if self.is_start_point {
            write!(f, " [start]")?;
        }
        Ok(())
    }
}
