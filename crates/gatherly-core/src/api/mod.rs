//! REST API client module for the Gatherly web API.
//!
//! This module provides the `ApiClient` for saving items, reading and
//! writing preferences, and the profile history endpoints.
//!
//! Requests carry the session's bearer token when one is present. Any
//! non-2xx response is returned as an `ApiError`.

pub mod client;
pub mod error;
pub mod routes;
pub mod transport;

pub use client::ApiClient;
pub use error::ApiError;
pub use transport::{ApiRequest, HttpTransport, Transport};
