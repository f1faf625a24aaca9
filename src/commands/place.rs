use clap::{Args, Subcommand};
use pathfinder_core::{PlaceSearch, PlaceType};

use super::{truncate, OutputFormat};

#[derive(Args)]
pub struct PlaceCommand {
    #[command(subcommand)]
    pub command: PlaceSubcommand,
}

#[derive(Subcommand)]
pub enum PlaceSubcommand {
    /// Search for a city or country by name
    Search {
        /// Free-text query
        query: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl PlaceCommand {
    pub async fn run(&self, places: &dyn PlaceSearch) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            PlaceSubcommand::Search { query, format } => {
                let results = places.search(query).await?;
                if results.is_empty() {
                    println!("No places found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&results)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<24}  {:<20}  {:<8}  COORDINATES", "NAME", "REGION", "TYPE");
                        println!("{}", "-".repeat(76));
                        for place in &results {
                            let kind = match place.place_type {
                                Some(PlaceType::City) => "city",
                                Some(PlaceType::Country) => "country",
                                Some(PlaceType::Other) | None => "-",
                            };
                            println!(
                                "{:<24}  {:<20}  {:<8}  {}",
                                truncate(&place.display_name, 24),
                                truncate(&place.region, 20),
                                kind,
                                place.coordinate()
                            );
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
