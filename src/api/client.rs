//! HTTP client for the platform API

use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::ApiError;
use super::models::{ExecuteRequest, ExecutionResponse};
use crate::interaction::CodeExecutor;
use crate::lesson::LessonSource;
use crate::progress::{ProgressRecord, ProgressRemote};

/// Platform API client
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// HTTP client
    client: Client,
    /// Base URL without trailing slash
    base_url: String,
    /// Bearer token forwarded on every request, if known
    token: Option<String>,
}

impl ApiClient {
    /// Request timeout
    const TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a new client for the given base URL
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(Self::TIMEOUT).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url, token })
    }

    /// Base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether requests carry credentials
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Replace the bearer token
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Map HTTP error statuses onto [`ApiError`]
    async fn check(response: Response, resource: &str) -> Result<Response, ApiError> {
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::not_found(resource));
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized { status: status.as_u16() });
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status: status.as_u16(), message });
        }

        Ok(response)
    }

    /// GET a JSON document
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        tracing::debug!("GET {}", path);
        let response = self.authorize(self.client.get(self.url(path))).send().await?;
        let response = Self::check(response, path).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// POST a JSON body and decode a JSON response
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        tracing::debug!("POST {}", path);
        let response = self.authorize(self.client.post(self.url(path))).json(body).send().await?;
        let response = Self::check(response, path).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// POST a JSON body, ignoring the response body
    pub async fn post_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        tracing::debug!("POST {}", path);
        let response = self.authorize(self.client.post(self.url(path))).json(body).send().await?;
        Self::check(response, path).await?;
        Ok(())
    }

    /// Fetch today's challenge (opaque document)
    pub async fn daily_challenge(&self) -> Result<Value, ApiError> {
        self.get_json("/api/challenges/daily").await
    }

    /// Submit a challenge answer (opaque payloads)
    pub async fn submit_challenge(&self, submission: &Value) -> Result<Value, ApiError> {
        self.post_json("/api/challenges/submit", submission).await
    }

    /// Spend a challenge helper (opaque payloads)
    pub async fn use_challenge_helper(&self, request: &Value) -> Result<Value, ApiError> {
        self.post_json("/api/challenges/use-helper", request).await
    }
}

/// `/api/lessons/{id}` followed by `rest`, with the id escaped as a single segment
fn lesson_path(lesson_id: &str, rest: &[&str]) -> Result<String, ApiError> {
    let mut url = Url::parse("http://localhost/api/lessons").map_err(|e| ApiError::Validation(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| ApiError::Validation("lesson URL has no path".into()))?
        .push(lesson_id)
        .extend(rest);
    Ok(url.path().to_string())
}

/// Treat 404 as "no document"
fn optional<T>(result: Result<T, ApiError>) -> Result<Option<T>, ApiError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ApiError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

impl LessonSource for ApiClient {
    fn fetch_document<'a>(&'a self, lesson_id: &'a str) -> BoxFuture<'a, Result<Option<Value>, ApiError>> {
        async move {
            let document: Option<Value> =
                optional(self.get_json(&lesson_path(lesson_id, &[])?).await)?;
            Ok(document.filter(|d| !d.is_null()))
        }
        .boxed()
    }
}

impl ProgressRemote for ApiClient {
    fn load<'a>(&'a self, lesson_id: &'a str) -> BoxFuture<'a, Result<Option<ProgressRecord>, ApiError>> {
        async move { optional(self.get_json(&lesson_path(lesson_id, &["progress"])?).await) }.boxed()
    }

    fn save<'a>(
        &'a self,
        lesson_id: &'a str,
        record: &'a ProgressRecord,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        async move { self.post_unit(&lesson_path(lesson_id, &["progress"])?, record).await }.boxed()
    }
}

impl CodeExecutor for ApiClient {
    fn execute<'a>(
        &'a self,
        request: &'a ExecuteRequest,
    ) -> BoxFuture<'a, Result<ExecutionResponse, ApiError>> {
        async move { self.post_json("/api/execute", request).await }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_trims_base_url() {
        let client = ApiClient::new("http://localhost:8000/", None).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/api/lessons/L1"), "http://localhost:8000/api/lessons/L1");
        assert_eq!(client.url("api/execute"), "http://localhost:8000/api/execute");
    }

    #[test]
    fn lesson_id_is_one_path_segment() {
        assert_eq!(lesson_path("L1", &[]).unwrap(), "/api/lessons/L1");
        assert_eq!(lesson_path("a b/c?d", &["progress"]).unwrap(), "/api/lessons/a%20b%2Fc%3Fd/progress");
    }

    #[test]
    fn token_marks_client_authenticated() {
        let mut client = ApiClient::new("http://localhost", None).unwrap();
        assert!(!client.is_authenticated());
        client.set_token(Some("abc".into()));
        assert!(client.is_authenticated());
    }

    #[test]
    fn optional_maps_not_found_to_none() {
        let missing: Result<u8, ApiError> = Err(ApiError::not_found("x"));
        assert!(optional(missing).unwrap().is_none());

        let failed: Result<u8, ApiError> = Err(ApiError::Validation("bad".into()));
        assert!(optional(failed).is_err());
    }
}
