use serde::{Deserialize, Serialize};

/// The two kinds of things a user can bookmark.
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Event,
    Place,
}

impl ItemKind {
    /// Path segment used by the item's own endpoints (`/api/events/...`)
    pub fn collection(&self) -> &'static str {
        match self {
            ItemKind::Event => "events",
            ItemKind::Place => "places",
        }
    }

    /// Path segment of the user's saved list (`/api/user/saved-events`)
    pub fn saved_collection(&self) -> &'static str {
        match self {
            ItemKind::Event => "saved-events",
            ItemKind::Place => "saved-places",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Event => write!(f, "event"),
            ItemKind::Place => write!(f, "place"),
        }
    }
}

impl std::str::FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "event" | "events" => Ok(ItemKind::Event),
            "place" | "places" | "venue" | "venues" => Ok(ItemKind::Place),
            other => Err(format!("unknown item kind '{}' (expected event or place)", other)),
        }
    }
}

/// Identity of a bookmarkable item. Equality is (id, kind).
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SavableItem {
    pub id: i64,
    pub kind: ItemKind,
}

impl SavableItem {
    pub fn new(id: i64, kind: ItemKind) -> Self {
        Self { id, kind }
    }
}

/// Minimal shape of an entry in a saved list; only the id matters for membership.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ItemRef {
    pub id: i64,
}
