mod adventure;
mod flight;
mod stop;
mod validation;

pub use adventure::{Adventure, BudgetTier, Difficulty, RouteData};
pub use flight::Flight;
pub use stop::{Coordinate, Stop};
pub use validation::{validate_stops, ValidationError};
