//! Profile history (education and work) per user.
//!
//! Reads go through the query cache; each mutation invalidates exactly the
//! detail and list entries it can have changed. Lists are keyed by owner, so
//! a change to one user's history never disturbs another user's cached list.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::api::{routes, ApiClient, ApiError};
use crate::cache::QueryCache;
use crate::models::history::NewHistoryEntry;
use crate::models::{HistoryEntry, HistoryKind};
use crate::notify::Notifier;

#[derive(Clone)]
pub struct HistoryManager<F> {
    api: ApiClient,
    cache: Arc<QueryCache>,
    notifier: Notifier,
    _kind: PhantomData<fn() -> F>,
}

impl<F: HistoryKind> HistoryManager<F> {
    pub fn new(api: ApiClient, cache: Arc<QueryCache>, notifier: Notifier) -> Self {
        Self {
            api,
            cache,
            notifier,
            _kind: PhantomData,
        }
    }

    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<HistoryEntry<F>>, ApiError> {
        let path = routes::user_history(F::RESOURCE, user_id);
        self.cache
            .fetch(&routes::user_history_key(F::RESOURCE, user_id), || self.api.get(&path))
            .await
    }

    /// `ApiError::NotFound` when the record does not exist.
    pub async fn get_by_id(&self, id: i64) -> Result<HistoryEntry<F>, ApiError> {
        let path = routes::history_item(F::RESOURCE, id);
        self.cache
            .fetch(&routes::history_item_key(F::RESOURCE, id), || self.api.get(&path))
            .await
    }

    pub async fn create(&self, user_id: i64, fields: &F) -> Result<HistoryEntry<F>, ApiError> {
        let body = NewHistoryEntry { user_id, fields };
        let value = self.report(self.api.post(&routes::history_collection(F::RESOURCE), &body).await)?;

        // The record exists server-side from here on, even if the body is unusable
        self.cache.invalidate(&routes::user_history_key(F::RESOURCE, user_id));
        let created = self.report(Self::decode(value))?;

        info!(resource = F::RESOURCE, id = created.id, user_id = created.user_id, "History record created");
        if created.user_id != user_id {
            self.cache
                .invalidate(&routes::user_history_key(F::RESOURCE, created.user_id));
        }
        Ok(created)
    }

    /// Partial update; only the given fields are sent.
    pub async fn update<P: Serialize>(&self, id: i64, partial: &P) -> Result<HistoryEntry<F>, ApiError> {
        let detail = routes::history_item_key(F::RESOURCE, id);
        let known_owner = self.cache.get::<HistoryEntry<F>>(&detail).map(|entry| entry.user_id);
        let value = self.report(self.api.put(&routes::history_item(F::RESOURCE, id), partial).await)?;

        self.cache.invalidate(&detail);
        if let Some(owner) = known_owner {
            self.cache.invalidate(&routes::user_history_key(F::RESOURCE, owner));
        }
        let updated = self.report(Self::decode(value))?;

        info!(resource = F::RESOURCE, id = id, user_id = updated.user_id, "History record updated");
        if known_owner != Some(updated.user_id) {
            self.cache
                .invalidate(&routes::user_history_key(F::RESOURCE, updated.user_id));
        }
        Ok(updated)
    }

    /// The delete response has no usable body, so the owner is passed in.
    pub async fn delete(&self, id: i64, user_id: i64) -> Result<(), ApiError> {
        self.report(self.api.delete(&routes::history_item(F::RESOURCE, id)).await)?;

        info!(resource = F::RESOURCE, id = id, user_id = user_id, "History record deleted");
        self.cache.invalidate(&routes::history_item_key(F::RESOURCE, id));
        self.cache
            .invalidate(&routes::user_history_key(F::RESOURCE, user_id));
        Ok(())
    }

    fn decode(value: serde_json::Value) -> Result<HistoryEntry<F>, ApiError> {
        Ok(serde_json::from_value(value)?)
    }

    fn report<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if let Err(ref e) = result {
            self.notifier
                .failure(format!("Could not update {} history: {}", F::RESOURCE, e));
        }
        result
    }
}
