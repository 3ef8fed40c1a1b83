//! HTTP client for the LMS API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;

use super::error::ApiError;
use super::routes::Route;
use super::CourseApi;
use crate::config::Config;

/// LMS API client
pub struct LmsClient {
    /// HTTP client
    client: Client,
    /// Base URL every route path is appended to
    base_url: Url,
    /// Bearer token, if the backend requires one
    token: Option<String>,
}

impl LmsClient {
    /// Create a client for the given base URL
    ///
    /// Without a timeout the reqwest defaults apply.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let base_url = base_url.into();
        let base_url =
            Url::parse(&base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self { client, base_url, token: None })
    }

    /// Create a client from the application configuration
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let timeout = config.request_timeout_secs.map(Duration::from_secs);
        let client = Self::new(config.api_base_url.clone(), timeout)?;
        Ok(match &config.api_token {
            Some(token) => client.with_token(token.clone()),
            None => client,
        })
    }

    /// Attach a bearer token to every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Full URL for a route, with ids percent-encoded
    pub fn url(&self, route: &Route) -> Result<Url, ApiError> {
        let parts = route.parts();
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(parts.segments);
        if let Some((key, value)) = parts.query {
            url.query_pairs_mut().append_pair(key, value);
        }
        Ok(url)
    }
}

#[async_trait]
impl CourseApi for LmsClient {
    async fn get(&self, route: &Route) -> Result<Value, ApiError> {
        let url = self.url(route)?;
        tracing::debug!(%url, "GET");

        let mut request = self.client.get(url).header("accept", "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Http { status: status.as_u16(), path: route.path(), message });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::routes::ItemEndpoint;
    use serde_json::json;

    #[test]
    fn url_joins_without_double_slash() {
        let client = LmsClient::new("http://localhost:3000/api/", None).unwrap();
        let url = client.url(&Route::Module("m1".into())).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/modules/m1");

        let client = LmsClient::new("http://localhost:3000/api", None).unwrap();
        let url = client.url(&Route::Module("m1".into())).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/modules/m1");
    }

    #[test]
    fn ids_are_percent_encoded() {
        let client = LmsClient::new("http://localhost:3000/api", None).unwrap();

        let url = client.url(&Route::Module("a/b#c?d".into())).unwrap();
        assert_eq!(url.path(), "/api/modules/a%2Fb%23c%3Fd");
        assert_eq!(url.query(), None);

        let url = client.url(&Route::items(ItemEndpoint::ExercisesByQuery, "s&7 x")).unwrap();
        assert_eq!(url.path(), "/api/exercises");
        assert_eq!(url.query(), Some("sectionId=s%267+x"));
    }

    #[test]
    fn unusable_base_url_is_rejected() {
        assert!(matches!(LmsClient::new("not a url", None), Err(ApiError::InvalidUrl(_))));
        assert!(matches!(LmsClient::new("mailto:lms@example.com", None), Err(ApiError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn get_returns_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/lessons/section/s1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":{"lessons":[{"_id":"l1"}]}}"#)
            .create_async()
            .await;

        let client = LmsClient::new(server.url(), None).unwrap();
        let body = client.get(&Route::items(ItemEndpoint::Lessons, "s1")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(body, json!({ "data": { "lessons": [{ "_id": "l1" }] } }));
    }

    #[tokio::test]
    async fn bearer_token_is_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/modules/m1")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_body(r#"{"_id":"m1"}"#)
            .create_async()
            .await;

        let client = LmsClient::new(server.url(), None).unwrap().with_token("secret");
        client.get(&Route::Module("m1".into())).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/sections/missing")
            .with_status(404)
            .with_body("Section not found")
            .create_async()
            .await;

        let client = LmsClient::new(server.url(), None).unwrap();
        let err = client.get(&Route::Section("missing".into())).await.unwrap_err();

        assert!(err.is_not_found());
        assert!(matches!(err, ApiError::Http { ref message, .. } if message == "Section not found"));
    }

    #[tokio::test]
    async fn empty_body_is_null() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/exercises").with_status(200).create_async().await;

        let client = LmsClient::new(server.url(), None).unwrap();
        let body = client.get(&Route::AllExercises).await.unwrap();

        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn query_route_matches() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/exercises")
            .match_query(mockito::Matcher::UrlEncoded("sectionId".into(), "s7".into()))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = LmsClient::new(server.url(), None).unwrap();
        let body = client.get(&Route::items(ItemEndpoint::ExercisesByQuery, "s7")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(body, json!([]));
    }
}
