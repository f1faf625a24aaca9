//! Fits a map viewport around a set of coordinates.

use serde::Serialize;

use crate::models::{Coordinate, Stop};

/// Multiplier applied to the coordinate range to leave a margin around the points.
pub const PADDING_FACTOR: f64 = 1.5;
/// Smallest span on either axis, in degrees.
pub const MIN_SPAN_DEGREES: f64 = 5.0;

/// Width and height of a viewport in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Span {
    pub lat_delta: f64,
    pub lon_delta: f64,
}

/// A map viewport: center point plus full span on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Region {
    pub center: Coordinate,
    pub span: Span,
}

impl Region {
    pub fn contains(&self, coordinate: Coordinate) -> bool {
        const EPSILON: f64 = 1e-9;
        (coordinate.lat - self.center.lat).abs() <= self.span.lat_delta / 2.0 + EPSILON
            && (coordinate.lon - self.center.lon).abs() <= self.span.lon_delta / 2.0 + EPSILON
    }
}

/// Computes the viewport that contains every coordinate.
///
/// Returns `None` for an empty input. A single point (or identical points)
/// gets the minimum span on both axes.
pub fn fit<I>(coordinates: I) -> Option<Region>
where
    I: IntoIterator<Item = Coordinate>,
{
    let mut coordinates = coordinates.into_iter();
    let first = coordinates.next()?;

    let (mut min_lat, mut max_lat) = (first.lat, first.lat);
    let (mut min_lon, mut max_lon) = (first.lon, first.lon);
    for c in coordinates {
        min_lat = min_lat.min(c.lat);
        max_lat = max_lat.max(c.lat);
        min_lon = min_lon.min(c.lon);
        max_lon = max_lon.max(c.lon);
    }

    Some(Region {
        center: Coordinate::new((max_lat + min_lat) / 2.0, (max_lon + min_lon) / 2.0),
        span: Span {
            lat_delta: ((max_lat - min_lat) * PADDING_FACTOR).max(MIN_SPAN_DEGREES),
            lon_delta: ((max_lon - min_lon) * PADDING_FACTOR).max(MIN_SPAN_DEGREES),
        },
    })
}

pub fn fit_stops(stops: &[Stop]) -> Option<Region> {
    fit(stops.iter().map(|s| s.coordinate))
}
