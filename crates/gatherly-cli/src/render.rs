//! Plain-text rendering of fetched collections.

use gatherly_core::models::date_span;
use gatherly_core::{Education, Event, Notice, Place, Preferences, SaveState, Work};

/// Width of the name column in list output
const NAME_WIDTH: usize = 32;

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional string, returning a default if None
pub fn format_optional(value: &Option<String>, default: &str) -> String {
    value.as_deref().unwrap_or(default).to_string()
}

pub fn events(events: &[Event], saved: impl Fn(i64) -> bool) -> String {
    if events.is_empty() {
        return "No events.".to_string();
    }
    events
        .iter()
        .map(|e| {
            format!(
                "{} {:>6}  {:<width$}  {:<12}  {}",
                if saved(e.id) { "*" } else { " " },
                e.id,
                truncate_string(&e.name, NAME_WIDTH),
                e.formatted_date(),
                format_optional(&e.venue, ""),
                width = NAME_WIDTH
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn places(places: &[Place], saved: impl Fn(i64) -> bool) -> String {
    if places.is_empty() {
        return "No places.".to_string();
    }
    places
        .iter()
        .map(|p| {
            format!(
                "{} {:>6}  {:<width$}  {}",
                if saved(p.id) { "*" } else { " " },
                p.id,
                truncate_string(&p.name, NAME_WIDTH),
                p.display_location(),
                width = NAME_WIDTH
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn preferences(prefs: &Preferences) -> String {
    if prefs.is_empty() {
        return "No preferences set.".to_string();
    }
    let mut lines = Vec::new();
    let categories: Vec<String> = prefs.categories.iter().map(|c| c.to_string()).collect();
    lines.push(format!("categories: {}", categories.join(", ")));
    lines.push("locations:".to_string());
    for l in &prefs.locations {
        lines.push(format!("  {} ({}, {})", l.name, l.latitude, l.longitude));
    }
    for (key, value) in &prefs.extra {
        lines.push(format!("{}: {}", key, value));
    }
    lines.join("\n")
}

pub fn education(records: &[Education]) -> String {
    if records.is_empty() {
        return "No education history.".to_string();
    }
    records
        .iter()
        .map(|r| {
            let f = &r.fields;
            format!(
                "{:>6}  {:<width$}  {}  {}",
                r.id,
                truncate_string(&format_optional(&f.school, "-"), NAME_WIDTH),
                format_optional(&f.degree, ""),
                date_span(&f.start_date, &f.end_date),
                width = NAME_WIDTH
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn work(records: &[Work]) -> String {
    if records.is_empty() {
        return "No work history.".to_string();
    }
    records
        .iter()
        .map(|r| {
            let f = &r.fields;
            format!(
                "{:>6}  {:<width$}  {}  {}",
                r.id,
                truncate_string(&format_optional(&f.company, "-"), NAME_WIDTH),
                format_optional(&f.title, ""),
                date_span(&f.start_date, &f.end_date),
                width = NAME_WIDTH
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn save_state(state: SaveState) -> &'static str {
    match state {
        SaveState::Saved => "saved",
        SaveState::Unsaved => "not saved",
        SaveState::SavePending => "saving...",
        SaveState::UnsavePending => "removing...",
    }
}

pub fn notice(notice: &Notice) -> String {
    match notice {
        Notice::Success(msg) => format!("✓ {}", msg),
        Notice::Failure(msg) => format!("✗ {}", msg),
        Notice::LoginRequired => "Sign in first: gatherly login <token> <user-id>".to_string(),
    }
}
