use clap::{Args, Subcommand};
use pathfinder_core::AdventureLibrary;

use super::resolve;

#[derive(Args)]
pub struct BadgeCommand {
    #[command(subcommand)]
    pub command: BadgeSubcommand,
}

#[derive(Subcommand)]
pub enum BadgeSubcommand {
    /// Add a badge
    Add {
        /// Adventure ID or name
        identifier: String,

        /// Badge emoji
        badge: String,
    },

    /// Remove a badge
    Remove {
        /// Adventure ID or name
        identifier: String,

        /// Badge emoji
        badge: String,
    },
}

impl BadgeCommand {
    pub async fn run(
        &self,
        library: &mut AdventureLibrary,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let (identifier, badge) = match &self.command {
            BadgeSubcommand::Add { identifier, badge }
            | BadgeSubcommand::Remove { identifier, badge } => (identifier, badge.trim()),
        };
        if badge.is_empty() {
            return Err("Badge cannot be empty".into());
        }

        let id = resolve(library, identifier)?;
        let mut adventure = library
            .get(&id)
            .cloned()
            .ok_or_else(|| format!("Adventure not found: {}", identifier))?;
        let badges = &mut adventure.route.badges;

        match &self.command {
            BadgeSubcommand::Add { .. } => {
                if badges.iter().any(|b| b == badge) {
                    println!("{} already has badge {}", adventure.name, badge);
                    return Ok(());
                }
                badges.push(badge.to_string());
            }
            BadgeSubcommand::Remove { .. } => {
                let before = badges.len();
                badges.retain(|b| b != badge);
                if badges.len() == before {
                    return Err(format!("{} has no badge {}", adventure.name, badge).into());
                }
            }
        }

        let saved = library.update(adventure).await?;
        println!("Badges of {}: {}", saved.name, saved.route.badges.join(" "));
        Ok(())
    }
}
