use std::fmt;

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
    Bool,
    /// JSON array of strings, stored as text by SQL backends.
    TextArray,
    /// RFC 3339 timestamp, assigned by the store.
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    /// Must be present and non-null on write (`id` excepted, the store assigns it).
    pub required: bool,
}

const fn col(name: &'static str, kind: ColumnKind, required: bool) -> Column {
    Column {
        name,
        kind,
        required,
    }
}

const ADVENTURES: &[Column] = &[
    col("id", ColumnKind::Text, true),
    col("user_id", ColumnKind::Text, false),
    col("name", ColumnKind::Text, true),
    col("description", ColumnKind::Text, true),
    col("duration", ColumnKind::Text, true),
    col("difficulty", ColumnKind::Text, true),
    col("budget", ColumnKind::Text, true),
    col("image", ColumnKind::Text, true),
    col("color_hex", ColumnKind::Text, true),
    col("destinations", ColumnKind::TextArray, true),
    col("highlights", ColumnKind::TextArray, true),
    col("total_cost", ColumnKind::Integer, true),
    col("total_nights", ColumnKind::Integer, true),
    col("created_at", ColumnKind::Timestamp, false),
    col("updated_at", ColumnKind::Timestamp, false),
];

const FLIGHTS: &[Column] = &[
    col("id", ColumnKind::Text, true),
    col("adventure_id", ColumnKind::Text, true),
    col("position", ColumnKind::Integer, true),
    col("route", ColumnKind::Text, true),
    col("date", ColumnKind::Text, true),
    col("duration", ColumnKind::Text, true),
    col("price", ColumnKind::Text, true),
    col("created_at", ColumnKind::Timestamp, false),
];

const PLACES: &[Column] = &[
    col("id", ColumnKind::Text, true),
    col("adventure_id", ColumnKind::Text, true),
    col("position", ColumnKind::Integer, true),
    col("name", ColumnKind::Text, true),
    col("latitude", ColumnKind::Real, true),
    col("longitude", ColumnKind::Real, true),
    col("nights", ColumnKind::Integer, true),
    col("is_start_point", ColumnKind::Bool, true),
    col("hotel_name", ColumnKind::Text, true),
    col("price_per_night", ColumnKind::Integer, true),
    col("created_at", ColumnKind::Timestamp, false),
];

const BADGES: &[Column] = &[
    col("id", ColumnKind::Text, true),
    col("adventure_id", ColumnKind::Text, true),
    col("position", ColumnKind::Integer, true),
    col("badge_emoji", ColumnKind::Text, true),
    col("created_at", ColumnKind::Timestamp, false),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Adventures,
    AdventureFlights,
    AdventurePlaces,
    AdventureBadges,
}

impl Table {
    pub const CHILDREN: [Table; 3] = [
        Table::AdventureFlights,
        Table::AdventurePlaces,
        Table::AdventureBadges,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Adventures => "adventures",
            Table::AdventureFlights => "adventure_flights",
            Table::AdventurePlaces => "adventure_places",
            Table::AdventureBadges => "adventure_badges",
        }
    }

    pub fn columns(&self) -> &'static [Column] {
        match self {
            Table::Adventures => ADVENTURES,
            Table::AdventureFlights => FLIGHTS,
            Table::AdventurePlaces => PLACES,
            Table::AdventureBadges => BADGES,
        }
    }

    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns().iter().find(|c| c.name == name)
    }

    /// Child tables reference `adventures(id)` through `adventure_id`.
    pub fn is_child(&self) -> bool {
        !matches!(self, Table::Adventures)
    }

    /// Child rows are ordered by their `position` column.
    pub fn is_ordered(&self) -> bool {
        self.is_child()
    }

    pub fn has_updated_at(&self) -> bool {
        matches!(self, Table::Adventures)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
