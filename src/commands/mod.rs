mod adventure;
mod badge;
mod config_cmd;
mod flight;
mod place;
mod stop;

pub use adventure::AdventureCommand;
pub use badge::BadgeCommand;
pub use config_cmd::ConfigCommand;
pub use flight::FlightCommand;
pub use place::PlaceCommand;
pub use stop::StopCommand;

use clap::ValueEnum;
use pathfinder_core::AdventureLibrary;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Finds an adventure by id, falling back to a case-insensitive name match.
fn resolve(
    library: &AdventureLibrary,
    identifier: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let adventures = library.adventures();
    adventures
        .iter()
        .find(|a| a.id == identifier)
        .or_else(|| {
            adventures
                .iter()
                .find(|a| a.name.eq_ignore_ascii_case(identifier))
        })
        .map(|a| a.id.clone())
        .ok_or_else(|| format!("Adventure not found: {}", identifier).into())
}

/// Command-line positions are 1-based.
fn to_index(position: usize) -> Result<usize, Box<dyn std::error::Error>> {
    position
        .checked_sub(1)
        .ok_or_else(|| "Positions start at 1".into())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let cut: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
