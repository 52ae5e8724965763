//! Data models for Gatherly entities.
//!
//! - `Event`, `Place`: browsable and bookmarkable items
//! - `ItemKind`, `SavableItem`: identity of a bookmark
//! - `Preferences`, `LocationPreference`: recommendation settings
//! - `HistoryEntry` with `EducationFields` / `WorkFields`: profile history

pub mod event;
pub mod history;
pub mod item;
pub mod preferences;

pub use event::{Event, Place};
pub use history::{date_span, Education, EducationFields, HistoryEntry, HistoryKind, Work, WorkFields};
pub use item::{ItemKind, SavableItem};
pub use preferences::{LocationPreference, Preferences};
