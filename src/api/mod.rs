//! LMS REST API integration
//!
//! Provides the [`CourseApi`] seam used by the module loader, an HTTP
//! implementation of it, route definitions and response normalization.

pub mod client;
pub mod error;
pub mod normalize;
pub mod routes;

use async_trait::async_trait;
use serde_json::Value;

pub use client::LmsClient;
pub use error::ApiError;
pub use normalize::{EntityKind, Normalized, Shape, normalize, normalize_as};
pub use routes::{ItemEndpoint, Route, RouteParts};

/// Read access to the LMS backend
///
/// Implementations return the raw JSON body; callers normalize it, since the
/// backend's response envelopes vary from route to route.
#[async_trait]
pub trait CourseApi: Send + Sync {
    /// Fetch a route and return its decoded JSON body
    async fn get(&self, route: &Route) -> Result<Value, ApiError>;
}
