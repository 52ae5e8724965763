//! API client for the Gatherly REST API.
//!
//! `ApiClient` attaches the session's bearer token to every request and
//! exposes one method per endpoint. Responses are returned as raw JSON so
//! the query cache can store them untyped; typed decoding happens at the
//! manager layer.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::SessionHandle;
use crate::models::ItemKind;

use super::routes;
use super::transport::{ApiRequest, HttpTransport, Transport};
use super::ApiError;

/// Clone is cheap - the transport is shared behind an Arc.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: SessionHandle,
}

impl ApiClient {
    /// Create a client talking HTTP to `base_url`
    pub fn new(base_url: &str, timeout: Duration, session: SessionHandle) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(base_url, timeout)?;
        Ok(Self::with_transport(Arc::new(transport), session))
    }

    pub fn with_transport(transport: Arc<dyn Transport>, session: SessionHandle) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, ApiError> {
        let request = ApiRequest {
            method: method.clone(),
            path: path.to_string(),
            body,
            token: self.session.token(),
        };

        match self.transport.send(request).await {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(method = %method, path = path, error = %e, "API request failed");
                Err(e)
            }
        }
    }

    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        let body = serde_json::to_value(body)?;
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        let body = serde_json::to_value(body)?;
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::DELETE, path, None).await
    }

    // ===== Saved items =====

    pub async fn save_item(&self, kind: ItemKind, id: i64) -> Result<(), ApiError> {
        debug!(kind = %kind, id = id, "Saving item");
        self.request(Method::POST, &routes::save_item(kind, id), None)
            .await
            .map(|_| ())
    }

    pub async fn unsave_item(&self, kind: ItemKind, id: i64) -> Result<(), ApiError> {
        debug!(kind = %kind, id = id, "Unsaving item");
        self.delete(&routes::save_item(kind, id)).await.map(|_| ())
    }

    pub async fn fetch_saved(&self, kind: ItemKind) -> Result<Value, ApiError> {
        self.get(&routes::saved_list(kind)).await
    }

    // ===== Preferences =====

    pub async fn fetch_preferences(&self) -> Result<Value, ApiError> {
        self.get(routes::PREFERENCES).await
    }

    /// Writes the whole mapping; the endpoint has no partial update.
    pub async fn update_preferences<B: Serialize>(&self, preferences: &B) -> Result<Value, ApiError> {
        self.put(routes::PREFERENCES, preferences).await
    }

    // ===== Events and places =====

    pub async fn fetch_recommended_events(&self) -> Result<Value, ApiError> {
        self.get(routes::RECOMMENDED_EVENTS).await
    }

    pub async fn fetch_events(&self) -> Result<Value, ApiError> {
        self.get(routes::EVENTS).await
    }

    pub async fn fetch_places(&self) -> Result<Value, ApiError> {
        self.get(routes::PLACES).await
    }
}
