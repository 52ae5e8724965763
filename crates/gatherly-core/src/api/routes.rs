//! Endpoint paths and the cache keys of the queries they back.

use crate::cache::QueryKey;
use crate::models::ItemKind;

pub const PREFERENCES: &str = "/api/user/preferences";
pub const RECOMMENDED_EVENTS: &str = "/api/events/recommended";
pub const EVENTS: &str = "/api/events";
pub const PLACES: &str = "/api/places";

/// `POST` saves, `DELETE` unsaves
pub fn save_item(kind: ItemKind, id: i64) -> String {
    format!("/api/{}/{}/save", kind.collection(), id)
}

pub fn saved_list(kind: ItemKind) -> String {
    format!("/api/user/{}", kind.saved_collection())
}

pub fn user_history(resource: &str, user_id: i64) -> String {
    format!("/api/users/{}/{}", user_id, resource)
}

pub fn history_collection(resource: &str) -> String {
    format!("/api/{}", resource)
}

pub fn history_item(resource: &str, id: i64) -> String {
    format!("/api/{}/{}", resource, id)
}

pub fn saved_list_key(kind: ItemKind) -> QueryKey {
    QueryKey::new(["user", kind.saved_collection()])
}

pub fn preferences_key() -> QueryKey {
    QueryKey::new(["user", "preferences"])
}

pub fn recommended_events_key() -> QueryKey {
    QueryKey::new(["events", "recommended"])
}

pub fn events_key() -> QueryKey {
    QueryKey::new(["events"])
}

pub fn places_key() -> QueryKey {
    QueryKey::new(["places"])
}

pub fn user_history_key(resource: &str, user_id: i64) -> QueryKey {
    QueryKey::new(["users".to_string(), user_id.to_string(), resource.to_string()])
}

pub fn history_item_key(resource: &str, id: i64) -> QueryKey {
    QueryKey::new([resource.to_string(), id.to_string()])
}
