use thiserror::Error;

use super::stop::Stop;

/// A stop collection that breaks one of the itinerary invariants.
///
/// Raised before anything is sent to the remote store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("only one stop may be the start point, found {count}")]
    MultipleStartPoints { count: usize },

    #[error("stop {index} must stay at least 1 night, got {nights}")]
    InvalidNights { index: usize, nights: i32 },

    #[error("stop {index} has a negative price per night: {price}")]
    NegativePrice { index: usize, price: i32 },
}

/// Checks the structural invariants every stop collection must hold.
pub fn validate_stops(stops: &[Stop]) -> Result<(), ValidationError> {
    let start_points = stops.iter().filter(|s| s.is_start_point).count();
    if start_points > 1 {
        return Err(ValidationError::MultipleStartPoints {
            count: start_points,
        });
    }

    for (index, stop) in stops.iter().enumerate() {
        if stop.nights < 1 {
            return Err(ValidationError::InvalidNights {
                index,
                nights: stop.nights,
            });
        }
        if stop.price_per_night < 0 {
            return Err(ValidationError::NegativePrice {
                index,
                price: stop.price_per_night,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;

    fn stop(name: &str) -> Stop {
        Stop::new(name, Coordinate::new(0.0, 0.0))
    }

    #[test]
    fn test_valid_stops() {
        let stops = vec![stop("A").as_start_point(), stop("B").with_nights(3)];
        assert!(validate_stops(&stops).is_ok());
        assert!(validate_stops(&[]).is_ok());
    }

    #[test]
    fn test_two_start_points_rejected() {
        let stops = vec![stop("A").as_start_point(), stop("B").as_start_point()];
        assert_eq!(
            validate_stops(&stops),
            Err(ValidationError::MultipleStartPoints { count: 2 })
        );
    }

    #[test]
    fn test_zero_nights_rejected() {
        let stops = vec![stop("A"), stop("B").with_nights(0)];
        assert_eq!(
            validate_stops(&stops),
            Err(ValidationError::InvalidNights {
                index: 1,
                nights: 0
            })
        );
    }

    #[test]
    fn test_negative_price_rejected() {
        let stops = vec![stop("A").with_hotel("H", -5)];
        let err = validate_stops(&stops).unwrap_err();
        assert_eq!(err, ValidationError::NegativePrice { index: 0, price: -5 });
        assert!(err.to_string().contains("negative price"));
    }
}
