use clap::{Args, Subcommand};
use pathfinder_core::aggregate::lodging_cost;
use pathfinder_core::{
    fit_stops, summarize, Adventure, AdventureLibrary, BudgetTier, Difficulty, Divergence,
};
use serde::Deserialize;
use std::io::{self, Write};
use std::path::PathBuf;

use super::{resolve, truncate, OutputFormat};

#[derive(Args)]
pub struct AdventureCommand {
    #[command(subcommand)]
    pub command: AdventureSubcommand,
}

#[derive(Subcommand)]
pub enum AdventureSubcommand {
    /// List all adventures
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show an adventure's details
    Show {
        /// Adventure ID or name
        identifier: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create a new adventure
    Create {
        /// Name of the adventure
        name: String,

        #[arg(long)]
        description: Option<String>,

        /// Duration label, e.g. "14 days"
        #[arg(long)]
        duration: Option<String>,

        /// easy, medium or hard
        #[arg(long)]
        difficulty: Option<Difficulty>,

        /// €, €€ or €€€ ($ forms accepted)
        #[arg(long)]
        budget: Option<BudgetTier>,

        /// Icon name
        #[arg(long)]
        image: Option<String>,

        /// Accent color, e.g. "#4ECDC4"
        #[arg(long)]
        color: Option<String>,

        /// Destination (can be repeated)
        #[arg(long = "destination", value_name = "NAME")]
        destinations: Vec<String>,

        /// Highlight (can be repeated)
        #[arg(long = "highlight", value_name = "TEXT")]
        highlights: Vec<String>,

        /// Badge emoji (can be repeated)
        #[arg(long = "badge", value_name = "EMOJI")]
        badges: Vec<String>,

        /// Total trip cost including flights
        #[arg(long, default_value_t = 0)]
        total_cost: i64,
    },

    /// Delete an adventure and everything in it
    Delete {
        /// Adventure ID or name
        identifier: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Import adventures from a JSON file (one adventure or an array)
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },

    /// Show the map viewport that fits every stop
    Map {
        /// Adventure ID or name
        identifier: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImportFile {
    Many(Vec<Adventure>),
    One(Box<Adventure>),
}

impl ImportFile {
    fn into_adventures(self) -> Vec<Adventure> {
        match self {
            ImportFile::Many(adventures) => adventures,
            ImportFile::One(adventure) => vec![*adventure],
        }
    }
}

impl AdventureCommand {
    pub async fn run(
        &self,
        library: &mut AdventureLibrary,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            AdventureSubcommand::List { format } => {
                let adventures = library.adventures();
                if adventures.is_empty() {
                    println!("No adventures found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(adventures)?);
                    }
                    OutputFormat::Text => {
                        println!(
                            "{:<36}  {:<30}  {:<6}  {:>6}  BUDGET",
                            "ID", "NAME", "STOPS", "NIGHTS"
                        );
                        println!("{}", "-".repeat(92));
                        for adventure in adventures {
                            println!(
                                "{:<36}  {:<30}  {:<6}  {:>6}  {}",
                                adventure.id,
                                truncate(&adventure.name, 30),
                                adventure.route.stops.len(),
                                adventure.route.total_nights,
                                adventure.budget_tier
                            );
                        }
                        println!("\nTotal: {} adventure(s)", adventures.len());
                    }
                }
                Ok(())
            }

            AdventureSubcommand::Show { identifier, format } => {
                let id = resolve(library, identifier)?;
                let adventure = library.resync(&id).await?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&adventure)?);
                    }
                    OutputFormat::Text => {
                        print!("{}", adventure);
                        println!("Lodging: {}", lodging_cost(&adventure.route.stops));
                        for divergence in summarize(&adventure.route).divergences() {
                            match divergence {
                                Divergence::Nights { stored, derived } => println!(
                                    "Note: {} nights stored, but the stops add up to {}",
                                    stored, derived
                                ),
                                Divergence::CostBelowLodging { stored, lodging } => println!(
                                    "Note: total cost {} is below the lodging cost {}",
                                    stored, lodging
                                ),
                            }
                        }
                    }
                }
                Ok(())
            }

            AdventureSubcommand::Create {
                name,
                description,
                duration,
                difficulty,
                budget,
                image,
                color,
                destinations,
                highlights,
                badges,
                total_cost,
            } => {
                if name.trim().is_empty() {
                    return Err("Adventure name cannot be empty".into());
                }

                let mut adventure = Adventure::new(name.trim())
                    .with_destinations(destinations.clone())
                    .with_highlights(highlights.clone())
                    .with_badges(badges.clone())
                    .with_total_cost(*total_cost);

                if let Some(description) = description {
                    adventure = adventure.with_description(description);
                }
                if let Some(duration) = duration {
                    adventure = adventure.with_duration_label(duration);
                }
                if let Some(difficulty) = difficulty {
                    adventure = adventure.with_difficulty(*difficulty);
                }
                if let Some(budget) = budget {
                    adventure = adventure.with_budget_tier(*budget);
                }
                if let Some(image) = image {
                    adventure.image = image.clone();
                }
                if let Some(color) = color {
                    adventure.color_hex = color.clone();
                }

                let created = library.create(adventure).await?;
                println!("Created adventure:");
                print!("{}", created);
                Ok(())
            }

            AdventureSubcommand::Delete { identifier, force } => {
                let id = resolve(library, identifier)?;
                let name = library
                    .get(&id)
                    .map(|a| a.name.clone())
                    .unwrap_or_default();

                if !force {
                    print!("Delete adventure '{}'? [y/N] ", name);
                    io::stdout().flush()?;

                    let mut input = String::new();
                    io::stdin().read_line(&mut input)?;

                    if !input.trim().eq_ignore_ascii_case("y") {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }

                if library.delete(&id).await? {
                    println!("Deleted adventure: {}", name);
                } else {
                    println!("Adventure '{}' was already deleted", name);
                }
                Ok(())
            }

            AdventureSubcommand::Import { file } => {
                let contents = std::fs::read_to_string(file)
                    .map_err(|e| format!("Failed to read '{}': {}", file.display(), e))?;
                let parsed: ImportFile = serde_json::from_str(&contents)
                    .map_err(|e| format!("Failed to parse '{}': {}", file.display(), e))?;

                let adventures = parsed.into_adventures();
                let count = adventures.len();
                for adventure in adventures {
                    let saved = library.engine().save(adventure).await?;
                    println!("Imported: {} ({})", saved.name, saved.id);
                }
                library.load().await?;
                println!("\nTotal: {} adventure(s) imported", count);
                Ok(())
            }

            AdventureSubcommand::Map { identifier, format } => {
                let id = resolve(library, identifier)?;
                let adventure = library
                    .get(&id)
                    .ok_or_else(|| format!("Adventure not found: {}", identifier))?;
                let region = fit_stops(&adventure.route.stops)
                    .ok_or_else(|| format!("'{}' has no stops to show", adventure.name))?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&region)?);
                    }
                    OutputFormat::Text => {
                        println!("Center: {}", region.center);
                        println!(
                            "Span: {:.2}° lat x {:.2}° lon",
                            region.span.lat_delta, region.span.lon_delta
                        );
                    }
                }
                Ok(())
            }
        }
    }
}
