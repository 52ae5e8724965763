//! Recommendation preferences.
//!
//! The server only accepts the whole mapping, so every change is a
//! read-modify-write: take the last-read snapshot, apply the change, `PUT`
//! the result. Two updates racing from the same client can lose one of the
//! changes (last write wins over a stale base). The server contract has no
//! version precondition, so this is left as is.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::{routes, ApiClient};
use crate::auth::SessionHandle;
use crate::cache::QueryCache;
use crate::error::{Error, Result};
use crate::models::{Event, LocationPreference, Preferences};
use crate::notify::{Notice, Notifier};

#[derive(Clone)]
pub struct PreferenceManager {
    api: ApiClient,
    cache: Arc<QueryCache>,
    session: SessionHandle,
    notifier: Notifier,
}

impl PreferenceManager {
    pub fn new(api: ApiClient, cache: Arc<QueryCache>, notifier: Notifier) -> Self {
        let session = api.session().clone();
        Self {
            api,
            cache,
            session,
            notifier,
        }
    }

    /// Cached preferences; empty when signed out or not loaded yet.
    pub fn preferences(&self) -> Preferences {
        if !self.session.is_authenticated() {
            return Preferences::default();
        }
        self.cache
            .get::<Value>(&routes::preferences_key())
            .and_then(|value| Preferences::from_value(value).ok())
            .unwrap_or_default()
    }

    /// Preferences through the cache, fetching when missing or stale.
    pub async fn load(&self) -> Result<Preferences> {
        if !self.session.is_authenticated() {
            return Ok(Preferences::default());
        }
        let value: Value = self
            .cache
            .fetch(&routes::preferences_key(), || self.api.fetch_preferences())
            .await?;
        Preferences::from_value(value).map_err(|e| Error::Api(e.into()))
    }

    /// Replace `key` with `value` and write the whole mapping back.
    pub async fn set_preference(&self, key: &str, value: Value) -> Result<Preferences> {
        self.modify(|prefs| {
            *prefs = prefs.with_value(key, value).map_err(Error::InvalidPreference)?;
            Ok(true)
        })
        .await
    }

    /// No request is sent when the category is already present.
    pub async fn add_category_preference(&self, category_id: i64) -> Result<Preferences> {
        self.modify(|prefs| {
            let added = prefs.add_category(category_id);
            if !added {
                debug!(category_id = category_id, "Category already preferred");
            }
            Ok(added)
        })
        .await
    }

    /// Persists even when the category was absent.
    pub async fn remove_category_preference(&self, category_id: i64) -> Result<Preferences> {
        self.modify(|prefs| {
            prefs.remove_category(category_id);
            Ok(true)
        })
        .await
    }

    /// No request is sent when a location with the same coordinates exists.
    pub async fn add_location_preference(&self, location: LocationPreference) -> Result<Preferences> {
        self.modify(|prefs| {
            let added = prefs.add_location(location);
            if !added {
                debug!("Location already preferred");
            }
            Ok(added)
        })
        .await
    }

    /// Removes every location named `name`; nothing matching is not an error.
    pub async fn remove_location_preference(&self, name: &str) -> Result<Preferences> {
        self.modify(|prefs| {
            let removed = prefs.remove_locations_named(name);
            debug!(name = name, removed = removed, "Removing preferred locations");
            Ok(true)
        })
        .await
    }

    /// Events the server recommends from the current preferences.
    pub async fn recommended_events(&self) -> Result<Vec<Event>> {
        let events = self
            .cache
            .fetch(&routes::recommended_events_key(), || {
                self.api.fetch_recommended_events()
            })
            .await?;
        Ok(events)
    }

    fn require_session(&self) -> Result<()> {
        if self.session.is_authenticated() {
            return Ok(());
        }
        self.notifier.notify(Notice::LoginRequired);
        Err(Error::AuthenticationRequired)
    }

    /// Read-modify-write around `change`, which returns false when there is
    /// nothing to write. Every failure after the session check becomes a
    /// `Notice::Failure`.
    async fn modify<M>(&self, change: M) -> Result<Preferences>
    where
        M: FnOnce(&mut Preferences) -> Result<bool>,
    {
        self.require_session()?;
        let result = self.apply(change).await;
        if let Err(ref e) = result {
            warn!(error = %e, "Preference update failed");
            self.notifier
                .failure(format!("Could not update preferences: {}", e.user_message()));
        }
        result
    }

    async fn apply<M>(&self, change: M) -> Result<Preferences>
    where
        M: FnOnce(&mut Preferences) -> Result<bool>,
    {
        let mut prefs = self.load().await?;
        if !change(&mut prefs)? {
            return Ok(prefs);
        }
        self.persist(prefs).await
    }

    async fn persist(&self, prefs: Preferences) -> Result<Preferences> {
        self.api.update_preferences(&prefs).await?;

        info!(
            categories = prefs.categories.len(),
            locations = prefs.locations.len(),
            "Preferences updated"
        );
        self.cache.invalidate(&routes::preferences_key());
        self.cache.invalidate(&routes::recommended_events_key());
        self.notifier.success("Preferences updated");

        match self.load().await {
            Ok(fresh) => Ok(fresh),
            Err(e) => {
                warn!(error = %e, "Refetch after preference update failed");
                Ok(prefs)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::auth::SessionData;
    use crate::testing::{MockResponse, MockTransport};
    use reqwest::Method;
    use serde_json::json;
    use tokio::sync::mpsc;

    const PREFS: &str = "/api/user/preferences";
    const RECOMMENDED: &str = "/api/events/recommended";

    fn manager(signed_in: bool) -> (Arc<MockTransport>, Arc<QueryCache>, PreferenceManager) {
        let transport = Arc::new(MockTransport::new());
        let session = SessionHandle::new();
        if signed_in {
            session.set(SessionData::new("tok", 3, None));
        }
        let api = ApiClient::with_transport(transport.clone(), session);
        let cache = Arc::new(QueryCache::default());
        let manager = PreferenceManager::new(api, Arc::clone(&cache), Notifier::disabled());
        (transport, cache, manager)
    }

    fn notifying_manager() -> (Arc<MockTransport>, mpsc::Receiver<Notice>, PreferenceManager) {
        let transport = Arc::new(MockTransport::new());
        let session = SessionHandle::new();
        session.set(SessionData::new("tok", 3, None));
        let api = ApiClient::with_transport(transport.clone(), session);
        let (notifier, rx) = Notifier::channel(8);
        let manager = PreferenceManager::new(api, Arc::new(QueryCache::default()), notifier);
        (transport, rx, manager)
    }

    fn drain(rx: &mut mpsc::Receiver<Notice>) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(notice) = rx.try_recv() {
            notices.push(notice);
        }
        notices
    }

    fn is_failure(notice: &Notice) -> bool {
        matches!(notice, Notice::Failure(_))
    }

    #[tokio::test]
    async fn test_preferences_empty_when_signed_out() {
        let (transport, _, prefs) = manager(false);
        assert!(prefs.preferences().is_empty());
        assert!(prefs.load().await.expect("no error").is_empty());
        assert!(transport.requests().is_empty());

        let err = prefs.add_category_preference(1).await.unwrap_err();
        assert!(matches!(err, Error::AuthenticationRequired));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_preferences_empty_before_load() {
        let (_, _, prefs) = manager(true);
        assert_eq!(prefs.preferences(), Preferences::default());
    }

    #[tokio::test]
    async fn test_add_category_is_idempotent() {
        let (transport, _, prefs) = manager(true);
        transport.respond(Method::GET, PREFS, MockResponse::json(json!({"categories": [1]})));
        transport.respond(Method::GET, PREFS, MockResponse::json(json!({"categories": [1, 2]})));
        transport.respond(Method::PUT, PREFS, MockResponse::json(json!({"categories": [1, 2]})));

        let once = prefs.add_category_preference(2).await.expect("first add");
        let twice = prefs.add_category_preference(2).await.expect("second add");

        assert_eq!(once.categories, vec![1, 2]);
        assert_eq!(twice.categories, once.categories);
        // Second add found the category and did not write
        assert_eq!(transport.count(Method::PUT, PREFS), 1);
        assert_eq!(transport.last_body(Method::PUT, PREFS), Some(json!({"categories": [1, 2], "locations": []})));
    }

    #[tokio::test]
    async fn test_update_sends_full_mapping_and_invalidates_recommendations() {
        let (transport, cache, prefs) = manager(true);
        transport.respond(
            Method::GET,
            PREFS,
            MockResponse::json(json!({"categories": [4], "radiusKm": 10})),
        );
        transport.respond(Method::PUT, PREFS, MockResponse::json(json!({})));
        transport.respond(Method::GET, RECOMMENDED, MockResponse::json(json!([{"id": 1, "name": "Gig"}])));

        let recommended = prefs.recommended_events().await.expect("recommendations");
        assert_eq!(recommended.len(), 1);

        prefs.set_preference("radiusKm", json!(25)).await.expect("update");

        let body = transport.last_body(Method::PUT, PREFS).expect("PUT body");
        assert_eq!(body, json!({"categories": [4], "locations": [], "radiusKm": 25}));
        assert!(!cache.is_fresh(&routes::recommended_events_key()));

        prefs.recommended_events().await.expect("recommendations");
        assert_eq!(transport.count(Method::GET, RECOMMENDED), 2);
    }

    #[tokio::test]
    async fn test_set_preference_rejects_malformed_known_key() {
        let (transport, _, prefs) = manager(true);
        transport.respond(Method::GET, PREFS, MockResponse::json(json!(null)));

        let err = prefs.set_preference("locations", json!(42)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidPreference(_)));
        assert_eq!(transport.count(Method::PUT, PREFS), 0);
    }

    #[tokio::test]
    async fn test_add_location_rejects_same_coordinates() {
        let (transport, _, prefs) = manager(true);
        transport.respond(
            Method::GET,
            PREFS,
            MockResponse::json(json!({
                "locations": [{"latitude": "46.78", "longitude": "-92.10", "name": "Duluth"}]
            })),
        );

        let result = prefs
            .add_location_preference(LocationPreference::new("46.78", "-92.10", "Home"))
            .await
            .expect("duplicate is a no-op");

        assert_eq!(result.locations.len(), 1);
        assert_eq!(result.locations[0].name, "Duluth");
        assert_eq!(transport.count(Method::PUT, PREFS), 0);
    }

    #[tokio::test]
    async fn test_remove_location_removes_all_matches() {
        let (transport, _, prefs) = manager(true);
        transport.respond(
            Method::GET,
            PREFS,
            MockResponse::json(json!({
                "locations": [
                    {"latitude": "1", "longitude": "1", "name": "Cabin"},
                    {"latitude": "2", "longitude": "2", "name": "Office"},
                    {"latitude": "3", "longitude": "3", "name": "Cabin"}
                ]
            })),
        );
        transport.respond(Method::PUT, PREFS, MockResponse::json(json!({})));

        prefs.remove_location_preference("Cabin").await.expect("remove");
        let body = transport.last_body(Method::PUT, PREFS).expect("PUT body");
        assert_eq!(body["locations"], json!([{"latitude": "2", "longitude": "2", "name": "Office"}]));

        // Nothing left to match: still fine
        prefs.remove_location_preference("Nowhere").await.expect("no-op remove");
    }

    #[tokio::test]
    async fn test_remove_category_persists_when_absent() {
        let (transport, _, prefs) = manager(true);
        transport.respond(Method::GET, PREFS, MockResponse::json(json!({"categories": [1]})));
        transport.respond(Method::PUT, PREFS, MockResponse::json(json!({})));

        prefs.remove_category_preference(99).await.expect("remove");
        assert_eq!(transport.count(Method::PUT, PREFS), 1);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_cache() {
        let (transport, cache, prefs) = manager(true);
        transport.respond(Method::GET, PREFS, MockResponse::json(json!({"categories": []})));
        transport.respond(Method::PUT, PREFS, MockResponse::status(500));

        let err = prefs.add_category_preference(3).await.unwrap_err();
        assert!(matches!(err, Error::Api(_)));
        assert!(cache.is_fresh(&routes::preferences_key()));
        assert!(prefs.preferences().categories.is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_notifies() {
        let (transport, mut rx, prefs) = notifying_manager();
        transport.respond(Method::GET, PREFS, MockResponse::json(json!({"categories": []})));
        transport.respond(Method::PUT, PREFS, MockResponse::status(500));

        assert!(prefs.set_preference("radiusKm", json!(5)).await.is_err());
        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 1);
        assert!(is_failure(&notices[0]));
    }

    #[tokio::test]
    async fn test_failed_read_before_write_notifies() {
        let (transport, mut rx, prefs) = notifying_manager();
        transport.respond(Method::GET, PREFS, MockResponse::status(500));

        let err = prefs.add_category_preference(3).await.unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::Rejected { status: 500, .. })));
        assert_eq!(transport.count(Method::PUT, PREFS), 0);

        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 1);
        assert!(is_failure(&notices[0]));
    }

    #[tokio::test]
    async fn test_invalid_value_notifies() {
        let (transport, mut rx, prefs) = notifying_manager();
        transport.respond(Method::GET, PREFS, MockResponse::json(json!(null)));

        assert!(prefs.set_preference("categories", json!("all")).await.is_err());
        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 1);
        assert!(is_failure(&notices[0]));
    }

    #[tokio::test]
    async fn test_signed_out_mutation_prompts_login_only() {
        let transport = Arc::new(MockTransport::new());
        let api = ApiClient::with_transport(transport.clone(), SessionHandle::new());
        let (notifier, mut rx) = Notifier::channel(8);
        let prefs = PreferenceManager::new(api, Arc::new(QueryCache::default()), notifier);

        assert!(prefs.remove_category_preference(1).await.is_err());
        assert_eq!(drain(&mut rx), vec![Notice::LoginRequired]);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_successful_write_notifies_success() {
        let (transport, mut rx, prefs) = notifying_manager();
        transport.respond(Method::GET, PREFS, MockResponse::json(json!({"categories": []})));
        transport.respond(Method::PUT, PREFS, MockResponse::json(json!({})));

        prefs.add_category_preference(3).await.expect("add");
        assert_eq!(drain(&mut rx), vec![Notice::Success("Preferences updated".to_string())]);
    }
}
