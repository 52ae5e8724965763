//! Gatherly core - API client, query cache, saved items, preferences and
//! profile history for the Gatherly events app.
//!
//! `Gatherly` wires the pieces together around one shared `QueryCache` and
//! one `SessionHandle`:
//!
//! ```no_run
//! # async fn demo() -> Result<(), gatherly_core::Error> {
//! use gatherly_core::{ClientOptions, Gatherly, ItemKind, Notifier, SessionData};
//!
//! let (notifier, mut notices) = Notifier::channel(32);
//! let app = Gatherly::new(ClientOptions::default(), notifier)?;
//! app.sign_in(SessionData::new("token", 3, None));
//!
//! app.saved().refresh_all().await?;
//! app.saved().toggle_save(42, ItemKind::Event).await?;
//! while let Ok(notice) = notices.try_recv() {
//!     println!("{:?}", notice);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod cache;
pub mod error;
pub mod history;
pub mod models;
pub mod notify;
pub mod preferences;
pub mod saved;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

pub use api::{ApiClient, ApiError, Transport};
pub use auth::{Session, SessionData, SessionHandle};
pub use cache::{QueryCache, QueryKey};
pub use error::{Error, Result};
pub use history::HistoryManager;
pub use models::{
    Education, EducationFields, Event, HistoryEntry, ItemKind, LocationPreference, Place,
    Preferences, SavableItem, Work, WorkFields,
};
pub use notify::{Notice, Notifier};
pub use preferences::PreferenceManager;
pub use saved::{SaveState, SavedItems};

use api::routes;

/// Default API location for local development
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Age after which cached responses are refetched on the next read.
pub const DEFAULT_STALE_MINUTES: i64 = 5;

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout: Duration,
    pub stale_after: chrono::Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            stale_after: chrono::Duration::minutes(DEFAULT_STALE_MINUTES),
        }
    }
}

pub struct Gatherly {
    api: ApiClient,
    cache: Arc<QueryCache>,
    session: SessionHandle,
    saved: SavedItems,
    preferences: PreferenceManager,
    education: HistoryManager<EducationFields>,
    work: HistoryManager<WorkFields>,
}

impl Gatherly {
    /// Client talking HTTP to `options.base_url`
    pub fn new(options: ClientOptions, notifier: Notifier) -> Result<Self> {
        let session = SessionHandle::new();
        let api = ApiClient::new(&options.base_url, options.timeout, session)?;
        Ok(Self::with_client(api, Arc::new(QueryCache::new(options.stale_after)), notifier))
    }

    /// Assemble from an existing client and cache (custom transports, tests).
    pub fn with_client(api: ApiClient, cache: Arc<QueryCache>, notifier: Notifier) -> Self {
        let session = api.session().clone();
        Self {
            saved: SavedItems::new(api.clone(), Arc::clone(&cache), notifier.clone()),
            preferences: PreferenceManager::new(api.clone(), Arc::clone(&cache), notifier.clone()),
            education: HistoryManager::new(api.clone(), Arc::clone(&cache), notifier.clone()),
            work: HistoryManager::new(api.clone(), Arc::clone(&cache), notifier),
            api,
            cache,
            session,
        }
    }

    pub fn sign_in(&self, data: SessionData) {
        // Anything cached belonged to whoever was signed in before
        self.cache.clear();
        self.session.set(data);
    }

    /// Ends the session and drops every cached response, saved lists included.
    pub fn sign_out(&self) {
        self.session.clear();
        self.cache.clear();
        info!("Query cache cleared on sign-out");
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn saved(&self) -> &SavedItems {
        &self.saved
    }

    pub fn preferences(&self) -> &PreferenceManager {
        &self.preferences
    }

    pub fn education(&self) -> &HistoryManager<EducationFields> {
        &self.education
    }

    pub fn work(&self) -> &HistoryManager<WorkFields> {
        &self.work
    }

    /// All browsable events.
    pub async fn events(&self) -> Result<Vec<Event>> {
        let events = self
            .cache
            .fetch(&routes::events_key(), || self.api.fetch_events())
            .await?;
        Ok(events)
    }

    /// All browsable places (venues).
    pub async fn places(&self) -> Result<Vec<Place>> {
        let places = self
            .cache
            .fetch(&routes::places_key(), || self.api.fetch_places())
            .await?;
        Ok(places)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockResponse, MockTransport};
    use reqwest::Method;
    use serde_json::json;

    fn app() -> (Arc<MockTransport>, Gatherly) {
        let transport = Arc::new(MockTransport::new());
        let api = ApiClient::with_transport(transport.clone(), SessionHandle::new());
        let app = Gatherly::with_client(api, Arc::new(QueryCache::default()), Notifier::disabled());
        (transport, app)
    }

    #[tokio::test]
    async fn test_sign_out_clears_saved_sets() {
        let (transport, app) = app();
        transport.respond(
            Method::GET,
            "/api/user/saved-events",
            MockResponse::json(json!([{"id": 42, "name": "Jazz Night"}])),
        );

        app.sign_in(SessionData::new("tok", 3, None));
        app.saved().refresh(ItemKind::Event).await.expect("load");
        assert!(app.saved().is_item_saved(42, ItemKind::Event));

        app.sign_out();
        assert!(!app.is_authenticated());
        assert!(app.cache().is_empty());

        // A new user never sees the previous user's list
        app.sign_in(SessionData::new("tok2", 5, None));
        assert!(!app.saved().is_item_saved(42, ItemKind::Event));
    }

    #[tokio::test]
    async fn test_browse_events_and_places_cached() {
        let (transport, app) = app();
        transport.respond(Method::GET, "/api/events", MockResponse::json(json!([{"id": 1, "name": "Gig"}])));
        transport.respond(Method::GET, "/api/places", MockResponse::json(json!([{"id": 2, "name": "Hall"}])));

        assert_eq!(app.events().await.expect("events").len(), 1);
        assert_eq!(app.events().await.expect("events").len(), 1);
        assert_eq!(app.places().await.expect("places")[0].name, "Hall");
        assert_eq!(transport.count(Method::GET, "/api/events"), 1);
    }

    #[tokio::test]
    async fn test_managers_share_session() {
        let (transport, app) = app();
        transport.respond(Method::POST, "/api/events/1/save", MockResponse::json(json!({})));
        transport.respond(Method::GET, "/api/user/saved-events", MockResponse::json(json!([{"id": 1, "name": "Gig"}])));

        assert!(matches!(
            app.saved().save(1, ItemKind::Event).await,
            Err(Error::AuthenticationRequired)
        ));

        app.sign_in(SessionData::new("tok", 3, None));
        app.saved().save(1, ItemKind::Event).await.expect("save after sign-in");
        assert_eq!(transport.requests()[0].token.as_deref(), Some("tok"));
    }
}
