use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::flight::Flight;
use super::stop::Stop;

pub const DEFAULT_IMAGE: &str = "airplane.departure";
pub const DEFAULT_COLOR_HEX: &str = "#FF6B35";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(format!(
                "Invalid difficulty '{}'. Valid options: easy, medium, hard",
                s
            )),
        }
    }
}

/// Price band of an adventure, shown as one to three euro signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BudgetTier {
    #[serde(rename = "€")]
    Low,
    #[default]
    #[serde(rename = "€€")]
    Medium,
    #[serde(rename = "€€€")]
    High,
}

impl fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetTier::Low => write!(f, "€"),
            BudgetTier::Medium => write!(f, "€€"),
            BudgetTier::High => write!(f, "€€€"),
        }
    }
}

impl FromStr for BudgetTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "€" | "$" => Ok(BudgetTier::Low),
            "€€" | "$$" => Ok(BudgetTier::Medium),
            "€€€" | "$$$" => Ok(BudgetTier::High),
            _ => Err(format!(
                "Invalid budget '{}'. Valid options: €, €€, €€€ (or $, $$, $$$)",
                s
            )),
        }
    }
}

/// Child collections and stored aggregates of an adventure.
///
/// `total_cost` and `total_nights` are persisted snapshots. They are not
/// derived from `stops` on read; see `aggregate::summarize` for comparing
/// them with the live stop data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteData {
    #[serde(default)]
    pub flights: Vec<Flight>,
    #[serde(default)]
    pub stops: Vec<Stop>,
    #[serde(default)]
    pub badges: Vec<String>,
    #[serde(default)]
    pub total_cost: i64,
    #[serde(default)]
    pub total_nights: i64,
}

/// A complete trip plan. Owns its route data; children never outlive it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Adventure {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration_label: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub budget_tier: BudgetTier,
    #[serde(default = "default_image")]
    pub image: String,
    #[serde(default = "default_color_hex")]
    pub color_hex: String,
    #[serde(default)]
    pub destinations: Vec<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub route: RouteData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_image() -> String {
    DEFAULT_IMAGE.to_string()
}

fn default_color_hex() -> String {
    DEFAULT_COLOR_HEX.to_string()
}

impl Adventure {
    /// Creates an unsaved adventure with a client-generated identity.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: None,
            name: name.into(),
            description: String::new(),
            duration_label: String::new(),
            difficulty: Difficulty::default(),
            budget_tier: BudgetTier::default(),
            image: default_image(),
            color_hex: default_color_hex(),
            destinations: Vec::new(),
            highlights: Vec::new(),
            route: RouteData::default(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_duration_label(mut self, duration_label: impl Into<String>) -> Self {
        self.duration_label = duration_label.into();
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_budget_tier(mut self, budget_tier: BudgetTier) -> Self {
        self.budget_tier = budget_tier;
        self
    }

    pub fn with_destinations(mut self, destinations: Vec<String>) -> Self {
        self.destinations = destinations;
        self
    }

    pub fn with_highlights(mut self, highlights: Vec<String>) -> Self {
        self.highlights = highlights;
        self
    }

    pub fn with_stops(mut self, stops: Vec<Stop>) -> Self {
        self.route.stops = stops;
        self
    }

    pub fn with_flights(mut self, flights: Vec<Flight>) -> Self {
        self.route.flights = flights;
        self
    }

    pub fn with_badges(mut self, badges: Vec<String>) -> Self {
        self.route.badges = badges;
        self
    }

    pub fn with_total_cost(mut self, total_cost: i64) -> Self {
        self.route.total_cost = total_cost;
        self
    }

    /// Whether the store has ever acknowledged this adventure.
    pub fn is_saved(&self) -> bool {
        self.created_at.is_some()
    }
}

impl fmt::Display for Adventure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "=".repeat(self.name.chars().count()))?;
        writeln!(f, "ID: {}", self.id)?;
        if !self.duration_label.is_empty() {
            writeln!(f, "Duration: {}", self.duration_label)?;
        }
        writeln!(f, "Difficulty: {}", self.difficulty)?;
        writeln!(f, "Budget: {}", self.budget_tier)?;

        if !self.description.is_empty() {
            writeln!(f, "\n{}", self.description)?;
        }

        if !self.destinations.is_empty() {
            writeln!(f, "\nDestinations: {}", self.destinations.join(", "))?;
        }
        if !self.highlights.is_empty() {
            writeln!(f, "Highlights: {}", self.highlights.join(", "))?;
        }

        if !self.route.stops.is_empty() {
            writeln!(f, "\nStops:")?;
            for (i, stop) in self.route.stops.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, stop)?;
            }
        }

        if !self.route.flights.is_empty() {
            writeln!(f, "\nFlights:")?;
            for flight in &self.route.flights {
                writeln!(f, "  - {}", flight)?;
            }
        }

        if !self.route.badges.is_empty() {
            writeln!(f, "\nBadges: {}", self.route.badges.join(" "))?;
        }

        writeln!(
            f,
            "\nTotal: {} nights, {}",
            self.route.total_nights, self.route.total_cost
        )?;

        Ok(())
    }
}
