//! Scripted transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;

use crate::api::{ApiError, ApiRequest, Transport};

#[derive(Debug, Clone)]
pub(crate) enum MockResponse {
    Json(Value),
    Status(u16),
    NetworkDown,
}

impl MockResponse {
    pub fn json(value: Value) -> Self {
        MockResponse::Json(value)
    }

    pub fn status(code: u16) -> Self {
        MockResponse::Status(code)
    }

    fn into_result(self) -> Result<Value, ApiError> {
        match self {
            MockResponse::Json(value) => Ok(value),
            MockResponse::Status(code) => {
                let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                Err(ApiError::from_status(status, "scripted failure"))
            }
            MockResponse::NetworkDown => Err(ApiError::Network("connection refused".to_string())),
        }
    }
}

/// Replays queued responses per (method, path) and records every request.
/// The last queued response for a route repeats once the queue is drained.
#[derive(Default)]
pub(crate) struct MockTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<MockResponse>>>,
    log: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: Method, path: &str, response: MockResponse) {
        let mut routes = self.routes.lock().unwrap();
        routes
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn last_body(&self, method: Method, path: &str) -> Option<Value> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.method == method && r.path == path)
            .and_then(|r| r.body.clone())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let key = (request.method.clone(), request.path.clone());
        self.log.lock().unwrap().push(request);

        let response = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(&key) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match response {
            Some(response) => response.into_result(),
            None => Err(ApiError::NotFound(format!("no scripted response for {} {}", key.0, key.1))),
        }
    }
}
