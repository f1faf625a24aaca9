use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator used in flight route labels ("Paris → Rome").
pub const ROUTE_SEPARATOR: &str = " → ";

/// A flight belonging to an adventure.
///
/// All fields are display strings. `price` in particular is kept opaque
/// ("€89", "from 120 EUR"); nothing in the core does arithmetic on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    #[serde(default)]
    pub id: Option<String>,
    pub route_label: String,
    pub date: String,
    pub duration: String,
    pub price: String,
}

impl Flight {
    pub fn new(
        route_label: impl Into<String>,
        date: impl Into<String>,
        duration: impl Into<String>,
        price: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            route_label: route_label.into(),
            date: date.into(),
            duration: duration.into(),
            price: price.into(),
        }
    }

    /// Builds a route label from origin and destination names.
    pub fn route_between(from: &str, to: &str) -> String {
        format!("{}{}{}", from, ROUTE_SEPARATOR, to)
    }

    /// Splits the route label into origin and destination, if it has both.
    pub fn endpoints(&self) -> Option<(&str, &str)> {
        self.route_label
            .split_once(ROUTE_SEPARATOR)
            .map(|(from, to)| (from.trim(), to.trim()))
    }
}

impl fmt::Display for Flight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on {} ({}, {})",
            self.route_label, self.date, self.duration, self.price
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_between_and_endpoints() {
        let label = Flight::route_between("Paris", "Rome");
        assert_eq!(label, "Paris → Rome");

        let flight = Flight::new(label, "2025-06-01", "2h 05m", "€89");
        assert_eq!(flight.endpoints(), Some(("Paris", "Rome")));
    }

    #[test]
    fn test_endpoints_missing_separator() {
        let flight = Flight::new("Paris-Rome", "2025-06-01", "2h", "€89");
        assert_eq!(flight.endpoints(), None);
    }

    #[test]
    fn test_flight_display() {
        let flight = Flight::new("Paris → Rome", "2025-06-01", "2h 05m", "€89");
        assert_eq!(
            format!("{}", flight),
            "Paris → Rome on 2025-06-01 (2h 05m, €89)"
        );
    }
}
