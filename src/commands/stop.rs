use clap::{Args, Subcommand};
use pathfinder_core::{
    Adventure, AdventureLibrary, Coordinate, EditableItinerary, ItineraryError, PlaceSearch, Stop,
};

use super::{resolve, to_index, OutputFormat};

#[derive(Args)]
pub struct StopCommand {
    #[command(subcommand)]
    pub command: StopSubcommand,
}

#[derive(Subcommand)]
pub enum StopSubcommand {
    /// List the stops of an adventure with their days
    List {
        /// Adventure ID or name
        identifier: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a stop (a placeholder destination unless a place is given)
    Add {
        /// Adventure ID or name
        identifier: String,

        /// Look the stop up in the place catalog
        #[arg(long, conflicts_with_all = ["name", "lat", "lon"])]
        place: Option<String>,

        /// Stop name (requires --lat and --lon)
        #[arg(long, requires_all = ["lat", "lon"])]
        name: Option<String>,

        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, allow_negative_numbers = true)]
        lon: Option<f64>,

        #[arg(long)]
        nights: Option<i32>,

        #[arg(long)]
        hotel: Option<String>,

        /// Price per night
        #[arg(long, requires = "hotel")]
        price: Option<i32>,

        /// Insert after this position instead of appending
        #[arg(long)]
        after: Option<usize>,
    },

    /// Remove the stop at a position
    Remove {
        /// Adventure ID or name
        identifier: String,

        /// Position of the stop (1-based)
        position: usize,
    },

    /// Set the number of nights at a stop
    Nights {
        /// Adventure ID or name
        identifier: String,

        /// Position of the stop (1-based)
        position: usize,

        nights: i32,
    },

    /// Make a stop the start point
    Start {
        /// Adventure ID or name
        identifier: String,

        /// Position of the stop (1-based)
        position: usize,

        /// Unmark the stop instead
        #[arg(long)]
        clear: bool,
    },

    /// Move a stop to another position
    Move {
        /// Adventure ID or name
        identifier: String,

        /// Current position (1-based)
        from: usize,

        /// New position (1-based)
        to: usize,
    },

    /// Set the hotel and nightly price of a stop
    Hotel {
        /// Adventure ID or name
        identifier: String,

        /// Position of the stop (1-based)
        position: usize,

        name: String,

        price: i32,
    },
}

impl StopCommand {
    pub async fn run(
        &self,
        library: &mut AdventureLibrary,
        places: &dyn PlaceSearch,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            StopSubcommand::List { identifier, format } => {
                let id = resolve(library, identifier)?;
                let stops = library
                    .get(&id)
                    .map(|a| a.route.stops.clone())
                    .unwrap_or_default();
                let itinerary = EditableItinerary::from_stops(stops)?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(itinerary.stops())?);
                    }
                    OutputFormat::Text => print_itinerary(&itinerary),
                }
                Ok(())
            }

            StopSubcommand::Add {
                identifier,
                place,
                name,
                lat,
                lon,
                nights,
                hotel,
                price,
                after,
            } => {
                let id = resolve(library, identifier)?;

                let mut stop = if let Some(query) = place {
                    let candidate = places
                        .search(query)
                        .await?
                        .into_iter()
                        .next()
                        .ok_or_else(|| format!("No place matches '{}'", query))?;
                    candidate.to_stop(2)
                } else if let (Some(name), Some(lat), Some(lon)) = (name, lat, lon) {
                    Stop::new(name.clone(), Coordinate::new(*lat, *lon)).with_nights(2)
                } else {
                    Stop::placeholder()
                };
                if let Some(nights) = nights {
                    stop = stop.with_nights(*nights);
                }
                if let Some(hotel) = hotel {
                    stop = stop.with_hotel(hotel.clone(), price.unwrap_or(0));
                }

                let after = after.map(to_index).transpose()?;
                let saved = edit_stops(library, &id, |itinerary| {
                    match after {
                        Some(index) => itinerary.insert_after(index, stop),
                        None => itinerary.append(stop),
                    };
                    Ok(())
                })
                .await?;
                report(&saved);
                Ok(())
            }

            StopSubcommand::Remove {
                identifier,
                position,
            } => {
                let id = resolve(library, identifier)?;
                let index = to_index(*position)?;
                let saved = edit_stops(library, &id, |itinerary| {
                    itinerary.remove_at(index).map(|_| ())
                })
                .await?;
                report(&saved);
                Ok(())
            }

            StopSubcommand::Nights {
                identifier,
                position,
                nights,
            } => {
                let id = resolve(library, identifier)?;
                let index = to_index(*position)?;
                let saved = edit_stops(library, &id, |itinerary| {
                    itinerary.set_nights(index, *nights)
                })
                .await?;
                report(&saved);
                Ok(())
            }

            StopSubcommand::Start {
                identifier,
                position,
                clear,
            } => {
                let id = resolve(library, identifier)?;
                let index = to_index(*position)?;
                let saved = edit_stops(library, &id, |itinerary| {
                    itinerary.set_start_point(index, !clear)
                })
                .await?;
                report(&saved);
                Ok(())
            }

            StopSubcommand::Move {
                identifier,
                from,
                to,
            } => {
                let id = resolve(library, identifier)?;
                let from = to_index(*from)?;
                let to = to_index(*to)?;
                let saved =
                    edit_stops(library, &id, |itinerary| itinerary.reorder(from, to)).await?;
                report(&saved);
                Ok(())
            }

            StopSubcommand::Hotel {
                identifier,
                position,
                name,
                price,
            } => {
                let id = resolve(library, identifier)?;
                let index = to_index(*position)?;
                let saved = edit_stops(library, &id, |itinerary| {
                    itinerary.set_hotel(index, name.clone(), *price)
                })
                .await?;
                report(&saved);
                Ok(())
            }
        }
    }
}

/// Runs one itinerary edit and saves the result, or abandons the edit on error.
async fn edit_stops<F>(
    library: &mut AdventureLibrary,
    id: &str,
    edit: F,
) -> Result<Adventure, Box<dyn std::error::Error>>
where
    F: FnOnce(&mut EditableItinerary) -> Result<(), ItineraryError>,
{
    let mut itinerary = library.begin_edit(id)?;
    if let Err(e) = edit(&mut itinerary) {
        library.cancel_edit(id)?;
        return Err(e.into());
    }
    Ok(library.save_edit(id, itinerary).await?)
}

fn report(adventure: &Adventure) {
    println!("Updated stops of {}:", adventure.name);
    match EditableItinerary::from_stops(adventure.route.stops.clone()) {
        Ok(itinerary) => print_itinerary(&itinerary),
        Err(e) => println!("{}", e),
    }
}

fn print_itinerary(itinerary: &EditableItinerary) {
    if itinerary.is_empty() {
        println!("No stops");
        return;
    }

    for (slot, stop) in itinerary.schedule().iter().zip(itinerary.stops()) {
        let days = if slot.departure_day - slot.arrival_day > 1 {
            format!("days {}-{}", slot.arrival_day, slot.departure_day - 1)
        } else {
            format!("day {}", slot.arrival_day)
        };
        println!("  {}. {:<10} {}", slot.index + 1, days, stop);
    }
    println!("\nTotal: {} nights", itinerary.total_nights());
}
