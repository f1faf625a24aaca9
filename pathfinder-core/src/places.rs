//! Free-text place lookup.
//!
//! The core only consumes `PlaceSearch::search`. `CatalogSearch` answers from
//! a fixed list of well-known cities and countries so the application works
//! without a geocoding service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Coordinate, Stop};

/// Maximum number of candidates returned by `CatalogSearch`.
pub const MAX_RESULTS: usize = 10;

/// Classification used for iconography only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceType {
    City,
    Country,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceCandidate {
    pub display_name: String,
    /// Country (for cities) or continent (for countries), used for matching and display.
    #[serde(default)]
    pub region: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub place_type: Option<PlaceType>,
}

impl PlaceCandidate {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }

    /// Turns the candidate into a stop for the itinerary editor.
    pub fn to_stop(&self, nights: i32) -> Stop {
        Stop::new(self.display_name.clone(), self.coordinate()).with_nights(nights)
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("place search unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<PlaceCandidate>, SearchError>;
}

/// Offline search over a static catalog.
#[derive(Debug, Clone)]
pub struct CatalogSearch {
    entries: Vec<PlaceCandidate>,
}

impl CatalogSearch {
    pub fn new() -> Self {
        Self::with_entries(builtin_catalog())
    }

    pub fn with_entries(entries: Vec<PlaceCandidate>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CatalogSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaceSearch for CatalogSearch {
    async fn search(&self, query: &str) -> Result<Vec<PlaceCandidate>, SearchError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .entries
            .iter()
            .filter(|p| {
                p.display_name.to_lowercase().contains(&needle)
                    || p.region.to_lowercase().contains(&needle)
            })
            .take(MAX_RESULTS)
            .cloned()
            .collect())
    }
}

fn place(name: &str, region: &str, lat: f64, lon: f64, place_type: PlaceType) -> PlaceCandidate {
    PlaceCandidate {
        display_name: name.to_string(),
        region: region.to_string(),
        lat,
        lon,
        place_type: Some(place_type),
    }
}

fn builtin_catalog() -> Vec<PlaceCandidate> {
    use PlaceType::{City, Country};

    vec![
        place("Berlin", "Germany", 52.5200, 13.4050, City),
        place("Munich", "Germany", 48.1351, 11.5820, City),
        place("Paris", "France", 48.8566, 2.3522, City),
        place("London", "United Kingdom", 51.5074, -0.1278, City),
        place("Rome", "Italy", 41.9028, 12.4964, City),
        place("Madrid", "Spain", 40.4168, -3.7038, City),
        place("Barcelona", "Spain", 41.3874, 2.1686, City),
        place("Amsterdam", "Netherlands", 52.3676, 4.9041, City),
        place("Vienna", "Austria", 48.2082, 16.3738, City),
        place("Zurich", "Switzerland", 47.3769, 8.5417, City),
        place("Prague", "Czechia", 50.0755, 14.4378, City),
        place("Budapest", "Hungary", 47.4979, 19.0402, City),
        place("Warsaw", "Poland", 52.2297, 21.0122, City),
        place("Copenhagen", "Denmark", 55.6761, 12.5683, City),
        place("Stockholm", "Sweden", 59.3293, 18.0686, City),
        place("Oslo", "Norway", 59.9139, 10.7522, City),
        place("Helsinki", "Finland", 60.1699, 24.9384, City),
        place("Dublin", "Ireland", 53.3498, -6.2603, City),
        place("Lisbon", "Portugal", 38.7223, -9.1393, City),
        place("Athens", "Greece", 37.9838, 23.7275, City),
        place("Istanbul", "Turkey", 41.0082, 28.9784, City),
        place("Tokyo", "Japan", 35.6762, 139.6503, City),
        place("Seoul", "South Korea", 37.5665, 126.9780, City),
        place("Beijing", "China", 39.9042, 116.4074, City),
        place("Bangkok", "Thailand", 13.7563, 100.5018, City),
        place("Singapore", "Singapore", 1.3521, 103.8198, City),
        place("Kuala Lumpur", "Malaysia", 3.1390, 101.6869, City),
        place("Mumbai", "India", 19.0760, 72.8777, City),
        place("New York", "USA", 40.7128, -74.0060, City),
        place("Los Angeles", "USA", 34.0522, -118.2437, City),
        place("Las Vegas", "USA", 36.1699, -115.1398, City),
        place("San Francisco", "USA", 37.7749, -122.4194, City),
        place("Chicago", "USA", 41.8781, -87.6298, City),
        place("Toronto", "Canada", 43.6532, -79.3832, City),
        place("Vancouver", "Canada", 49.2827, -123.1207, City),
        place("Mexico City", "Mexico", 19.4326, -99.1332, City),
        place("São Paulo", "Brazil", -23.5505, -46.6333, City),
        place("Buenos Aires", "Argentina", -34.6037, -58.3816, City),
        place("Lima", "Peru", -12.0464, -77.0428, City),
        place("Cairo", "Egypt", 30.0444, 31.2357, City),
        place("Cape Town", "South Africa", -33.9249, 18.4241, City),
        place("Nairobi", "Kenya", -1.2921, 36.8219, City),
        place("Marrakesh", "Morocco", 31.6295, -7.9811, City),
        place("Sydney", "Australia", -33.8688, 151.2093, City),
        place("Melbourne", "Australia", -37.8136, 144.9631, City),
        place("Auckland", "New Zealand", -36.8485, 174.7633, City),
        place("France", "Europe", 46.2276, 2.2137, Country),
        place("Italy", "Europe", 41.8719, 12.5674, Country),
        place("Spain", "Europe", 40.4637, -3.7492, Country),
        place("Germany", "Europe", 51.1657, 10.4515, Country),
        place("Japan", "Asia", 36.2048, 138.2529, Country),
        place("Thailand", "Asia", 15.8700, 100.9925, Country),
        place("USA", "North America", 37.0902, -95.7129, Country),
        place("Australia", "Oceania", -25.2744, 133.7751, Country),
    ]
}
