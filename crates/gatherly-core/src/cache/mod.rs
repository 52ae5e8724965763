//! In-memory query cache.
//!
//! `QueryCache` keeps the latest server response per `QueryKey`. Entries go
//! stale after a configurable age or when a mutation invalidates them by key
//! prefix; the next `fetch` then goes back to the server. Nothing is written
//! to disk, the cache lives as long as the process.
//!
//! Keys used by the managers:
//! - `user/saved-events`, `user/saved-places`
//! - `user/preferences`, `events/recommended`
//! - `users/{id}/education`, `education/{id}` (and the same for `work`)

pub mod key;
pub mod manager;

pub use key::QueryKey;
pub use manager::{CachedData, QueryCache};
