use clap::{Args, Subcommand};
use pathfinder_core::{Adventure, AdventureLibrary, Flight};

use super::{resolve, to_index};

#[derive(Args)]
pub struct FlightCommand {
    #[command(subcommand)]
    pub command: FlightSubcommand,
}

#[derive(Subcommand)]
pub enum FlightSubcommand {
    /// Add a flight leg
    Add {
        /// Adventure ID or name
        identifier: String,

        /// Departure city
        #[arg(long)]
        from: String,

        /// Arrival city
        #[arg(long)]
        to: String,

        /// Date label, e.g. "Mar 15"
        #[arg(long)]
        date: String,

        /// Duration label, e.g. "2h 15m"
        #[arg(long)]
        duration: String,

        /// Price label, e.g. "€89"
        #[arg(long)]
        price: String,
    },

    /// Remove the flight at a position
    Remove {
        /// Adventure ID or name
        identifier: String,

        /// Position of the flight (1-based)
        position: usize,
    },
}

impl FlightCommand {
    pub async fn run(
        &self,
        library: &mut AdventureLibrary,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            FlightSubcommand::Add {
                identifier,
                from,
                to,
                date,
                duration,
                price,
            } => {
                let flight = Flight::new(
                    Flight::route_between(from, to),
                    date.as_str(),
                    duration.as_str(),
                    price.as_str(),
                );
                let label = flight.to_string();
                add_flight(library, identifier, flight).await?;
                println!("Added flight: {}", label);
                Ok(())
            }

            FlightSubcommand::Remove {
                identifier,
                position,
            } => {
                let id = resolve(library, identifier)?;
                let index = to_index(*position)?;
                let mut adventure = library
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| format!("Adventure not found: {}", identifier))?;

                if index >= adventure.route.flights.len() {
                    return Err(format!(
                        "No flight at position {} ({} flight(s))",
                        position,
                        adventure.route.flights.len()
                    )
                    .into());
                }
                let removed = adventure.route.flights.remove(index);
                library.update(adventure).await?;
                println!("Removed flight: {}", removed);
                Ok(())
            }
        }
    }
}

/// Appends a flight and saves the adventure. Local state only changes once
/// the store accepted the write.
async fn add_flight(
    library: &mut AdventureLibrary,
    identifier: &str,
    flight: Flight,
) -> Result<Adventure, Box<dyn std::error::Error>> {
    let id = resolve(library, identifier)?;
    let mut adventure = library
        .get(&id)
        .cloned()
        .ok_or_else(|| format!("Adventure not found: {}", identifier))?;

    adventure.route.flights.push(flight);
    Ok(library.update(adventure).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathfinder_core::{MemoryStore, StoreError, StoreOp, SyncEngine, Table};
    use std::sync::Arc;

    async fn library_with_trip(store: &Arc<MemoryStore>) -> AdventureLibrary {
        let mut library = AdventureLibrary::new(SyncEngine::new(store.clone()));
        library
            .create(Adventure::new("Alps").with_id("alps"))
            .await
            .unwrap();
        library
    }

    fn leg() -> Flight {
        Flight::new(Flight::route_between("Zurich", "Vienna"), "Jun 2", "1h 20m", "€70")
    }

    #[tokio::test]
    async fn test_add_flight_saves() {
        let store = Arc::new(MemoryStore::new());
        let mut library = library_with_trip(&store).await;

        let saved = add_flight(&mut library, "Alps", leg()).await.unwrap();
        assert_eq!(saved.route.flights.len(), 1);
        assert_eq!(store.row_count(Table::AdventureFlights), 1);
    }

    #[tokio::test]
    async fn test_add_flight_failed_save_leaves_library_unchanged() {
        let store = Arc::new(MemoryStore::new());
        let mut library = library_with_trip(&store).await;
        store.fail_next(
            StoreOp::Update,
            Table::Adventures,
            StoreError::Transport("offline".into()),
        );

        assert!(add_flight(&mut library, "alps", leg()).await.is_err());
        assert!(library.get("alps").unwrap().route.flights.is_empty());
        assert_eq!(store.row_count(Table::AdventureFlights), 0);
    }
}
