//! Typed wire rows and the mapping between them and the model.
//!
//! Decoding is strict: a required column that is missing or null fails with
//! `DecodeError` instead of falling back to a default value.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::{Table, WireRow};
use crate::models::{Adventure, Coordinate, Flight, RouteData, Stop};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed {table} row: {message}")]
    Malformed {
        table: &'static str,
        message: String,
    },

    #[error("{table} row is missing `{field}`")]
    MissingField {
        table: &'static str,
        field: &'static str,
    },

    #[error("{table} row has an invalid `{field}`: {value}")]
    InvalidField {
        table: &'static str,
        field: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdventureRow {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub name: String,
    pub description: String,
    pub duration: String,
    pub difficulty: String,
    pub budget: String,
    pub image: String,
    pub color_hex: String,
    pub destinations: Vec<String>,
    pub highlights: Vec<String>,
    pub total_cost: i64,
    pub total_nights: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub adventure_id: String,
    pub position: i64,
    pub route: String,
    pub date: String,
    pub duration: String,
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub adventure_id: String,
    pub position: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub nights: i32,
    pub is_start_point: bool,
    pub hotel_name: String,
    pub price_per_night: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub adventure_id: String,
    pub position: i64,
    pub badge_emoji: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

fn to_row<T: Serialize>(value: &T) -> WireRow {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => WireRow::new(),
    }
}

fn from_row<T: DeserializeOwned>(table: Table, row: WireRow) -> Result<T, DecodeError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| DecodeError::Malformed {
        table: table.name(),
        message: e.to_string(),
    })
}

fn parse_timestamp(
    table: Table,
    field: &'static str,
    value: Option<String>,
) -> Result<Option<DateTime<Utc>>, DecodeError> {
    value
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| DecodeError::InvalidField {
                    table: table.name(),
                    field,
                    value: raw,
                })
        })
        .transpose()
}

fn require_id(table: Table, id: Option<String>) -> Result<String, DecodeError> {
    id.ok_or(DecodeError::MissingField {
        table: table.name(),
        field: "id",
    })
}

/// Reads the `id` column of a row returned by the store.
pub fn row_id(table: Table, row: &WireRow) -> Result<String, DecodeError> {
    match row.get("id") {
        Some(Value::String(id)) => Ok(id.clone()),
        Some(other) => Err(DecodeError::InvalidField {
            table: table.name(),
            field: "id",
            value: other.to_string(),
        }),
        None => Err(DecodeError::MissingField {
            table: table.name(),
            field: "id",
        }),
    }
}

/// Parent row for an adventure. Timestamps are left for the store to assign.
pub fn encode_adventure(adventure: &Adventure) -> WireRow {
    to_row(&AdventureRow {
        id: adventure.id.clone(),
        user_id: adventure.user_id.clone(),
        name: adventure.name.clone(),
        description: adventure.description.clone(),
        duration: adventure.duration_label.clone(),
        difficulty: adventure.difficulty.to_string(),
        budget: adventure.budget_tier.to_string(),
        image: adventure.image.clone(),
        color_hex: adventure.color_hex.clone(),
        destinations: adventure.destinations.clone(),
        highlights: adventure.highlights.clone(),
        total_cost: adventure.route.total_cost,
        total_nights: adventure.route.total_nights,
        created_at: None,
        updated_at: None,
    })
}

pub fn encode_flights(adventure_id: &str, flights: &[Flight]) -> Vec<WireRow> {
    flights
        .iter()
        .enumerate()
        .map(|(position, flight)| {
            to_row(&FlightRow {
                id: flight.id.clone(),
                adventure_id: adventure_id.to_string(),
                position: position as i64,
                route: flight.route_label.clone(),
                date: flight.date.clone(),
                duration: flight.duration.clone(),
                price: flight.price.clone(),
                created_at: None,
            })
        })
        .collect()
}

pub fn encode_stops(adventure_id: &str, stops: &[Stop]) -> Vec<WireRow> {
    stops
        .iter()
        .enumerate()
        .map(|(position, stop)| {
            to_row(&PlaceRow {
                id: stop.id.clone(),
                adventure_id: adventure_id.to_string(),
                position: position as i64,
                name: stop.name.clone(),
                latitude: stop.coordinate.lat,
                longitude: stop.coordinate.lon,
                nights: stop.nights,
                is_start_point: stop.is_start_point,
                hotel_name: stop.hotel_name.clone(),
                price_per_night: stop.price_per_night,
                created_at: None,
            })
        })
        .collect()
}

pub fn encode_badges(adventure_id: &str, badges: &[String]) -> Vec<WireRow> {
    badges
        .iter()
        .enumerate()
        .map(|(position, badge)| {
            to_row(&BadgeRow {
                id: None,
                adventure_id: adventure_id.to_string(),
                position: position as i64,
                badge_emoji: badge.clone(),
                created_at: None,
            })
        })
        .collect()
}

/// Builds an adventure from its parent row and already-decoded children.
pub fn decode_adventure(row: WireRow, route: RouteData) -> Result<Adventure, DecodeError> {
    let table = Table::Adventures;
    let row: AdventureRow = from_row(table, row)?;

    let difficulty = row
        .difficulty
        .parse()
        .map_err(|_| DecodeError::InvalidField {
            table: table.name(),
            field: "difficulty",
            value: row.difficulty.clone(),
        })?;
    let budget_tier = row.budget.parse().map_err(|_| DecodeError::InvalidField {
        table: table.name(),
        field: "budget",
        value: row.budget.clone(),
    })?;

    Ok(Adventure {
        id: row.id,
        user_id: row.user_id,
        name: row.name,
        description: row.description,
        duration_label: row.duration,
        difficulty,
        budget_tier,
        image: row.image,
        color_hex: row.color_hex,
        destinations: row.destinations,
        highlights: row.highlights,
        route: RouteData {
            total_cost: row.total_cost,
            total_nights: row.total_nights,
            ..route
        },
        created_at: parse_timestamp(table, "created_at", row.created_at)?,
        updated_at: parse_timestamp(table, "updated_at", row.updated_at)?,
    })
}

pub fn decode_flights(rows: Vec<WireRow>) -> Result<Vec<Flight>, DecodeError> {
    let table = Table::AdventureFlights;
    let mut rows = rows
        .into_iter()
        .map(|row| from_row::<FlightRow>(table, row))
        .collect::<Result<Vec<_>, _>>()?;
    rows.sort_by_key(|r| r.position);

    rows.into_iter()
        .map(|r| {
            Ok(Flight {
                id: Some(require_id(table, r.id)?),
                route_label: r.route,
                date: r.date,
                duration: r.duration,
                price: r.price,
            })
        })
        .collect()
}

pub fn decode_stops(rows: Vec<WireRow>) -> Result<Vec<Stop>, DecodeError> {
    let table = Table::AdventurePlaces;
    let mut rows = rows
        .into_iter()
        .map(|row| from_row::<PlaceRow>(table, row))
        .collect::<Result<Vec<_>, _>>()?;
    rows.sort_by_key(|r| r.position);

    rows.into_iter()
        .map(|r| {
            Ok(Stop {
                id: Some(require_id(table, r.id)?),
                name: r.name,
                coordinate: Coordinate::new(r.latitude, r.longitude),
                nights: r.nights,
                is_start_point: r.is_start_point,
                hotel_name: r.hotel_name,
                price_per_night: r.price_per_night,
            })
        })
        .collect()
}

pub fn decode_badges(rows: Vec<WireRow>) -> Result<Vec<String>, DecodeError> {
    let table = Table::AdventureBadges;
    let mut rows = rows
        .into_iter()
        .map(|row| from_row::<BadgeRow>(table, row))
        .collect::<Result<Vec<_>, _>>()?;
    rows.sort_by_key(|r| r.position);
    Ok(rows.into_iter().map(|r| r.badge_emoji).collect())
}
