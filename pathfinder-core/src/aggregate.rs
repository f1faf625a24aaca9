//! Derived totals over a stop collection.
//!
//! Nothing here is cached. `RouteData` keeps its own stored `total_cost` and
//! `total_nights`; `summarize` compares those against what the stops say and
//! reports any divergence instead of reconciling it.

use serde::Serialize;

use crate::models::{RouteData, Stop};

/// Sum of nights across all stops.
pub fn total_nights(stops: &[Stop]) -> i64 {
    stops.iter().map(|s| i64::from(s.nights)).sum()
}

/// Sum of `price_per_night * nights` across all stops.
pub fn lodging_cost(stops: &[Stop]) -> i64 {
    stops.iter().map(Stop::lodging_cost).sum()
}

/// A mismatch between stored aggregates and live stop data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Divergence {
    /// Stored night count differs from the sum over stops.
    Nights { stored: i64, derived: i64 },
    /// Stored total cost does not even cover lodging.
    CostBelowLodging { stored: i64, lodging: i64 },
}

/// Stored and derived aggregates of one route, side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    pub stop_count: usize,
    pub stored_nights: i64,
    pub derived_nights: i64,
    pub stored_total_cost: i64,
    pub lodging_cost: i64,
}

impl RouteSummary {
    pub fn divergences(&self) -> Vec<Divergence> {
        let mut found = Vec::new();
        if self.stored_nights != self.derived_nights {
            found.push(Divergence::Nights {
                stored: self.stored_nights,
                derived: self.derived_nights,
            });
        }
        if self.stored_total_cost < self.lodging_cost {
            found.push(Divergence::CostBelowLodging {
                stored: self.stored_total_cost,
                lodging: self.lodging_cost,
            });
        }
        found
    }

    pub fn is_consistent(&self) -> bool {
        self.divergences().is_empty()
    }
}

pub fn summarize(route: &RouteData) -> RouteSummary {
    RouteSummary {
        stop_count: route.stops.len(),
        stored_nights: route.total_nights,
        derived_nights: total_nights(&route.stops),
        stored_total_cost: route.total_cost,
        lodging_cost: lodging_cost(&route.stops),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;

    fn stop(nights: i32, price: i32) -> Stop {
        Stop::new("S", Coordinate::new(0.0, 0.0))
            .with_nights(nights)
            .with_hotel("H", price)
    }

    #[test]
    fn test_total_nights_example_itinerary() {
        let stops = vec![
            stop(3, 0).as_start_point(),
            stop(4, 0),
            stop(3, 0),
            stop(2, 0),
        ];
        assert_eq!(total_nights(&stops), 12);
    }

    #[test]
    fn test_empty_totals() {
        assert_eq!(total_nights(&[]), 0);
        assert_eq!(lodging_cost(&[]), 0);
    }

    #[test]
    fn test_lodging_cost() {
        let stops = vec![stop(3, 100), stop(2, 80)];
        assert_eq!(lodging_cost(&stops), 460);
    }

    #[test]
    fn test_summary_consistent() {
        let route = RouteData {
            stops: vec![stop(3, 100), stop(2, 80)],
            total_nights: 5,
            total_cost: 1200,
            ..RouteData::default()
        };
        let summary = summarize(&route);
        assert_eq!(summary.stop_count, 2);
        assert!(summary.is_consistent());
    }

    #[test]
    fn test_summary_flags_divergence_without_fixing_it() {
        let route = RouteData {
            stops: vec![stop(3, 100), stop(2, 80)],
            total_nights: 7,
            total_cost: 300,
            ..RouteData::default()
        };
        let summary = summarize(&route);
        assert_eq!(
            summary.divergences(),
            vec![
                Divergence::Nights {
                    stored: 7,
                    derived: 5
                },
                Divergence::CostBelowLodging {
                    stored: 300,
                    lodging: 460
                },
            ]
        );
        assert_eq!(route.total_nights, 7);
    }
}
