//! Authenticated HTTP exchange with Azure DevOps.
//!
//! Every request carries Basic authentication with an empty user name and
//! the personal access token as password. Non-2xx answers become
//! [`Error::Api`] with the numeric status and the service's own message.

use azdo_core::{Error, PatchOperation, Result};
use reqwest::header::{CONTENT_TYPE, ETAG, IF_MATCH};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Content type of binary uploads.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Request payload.
#[derive(Debug, Clone)]
pub enum Body {
    Empty,
    Json(Value),
    JsonPatch(Vec<PatchOperation>),
    Binary(Vec<u8>),
}

/// Status, entity tag and body of a completed exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub etag: Option<String>,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Error for a non-2xx answer, logging the raw body.
    pub fn error(&self) -> Error {
        warn!(
            status = self.status,
            body = %self.body,
            "Azure DevOps API error response"
        );
        Error::from_status(self.status, remote_message(self.status, &self.body))
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| Error::InvalidData(format!("Failed to parse response: {}", e)))
    }
}

/// Thin wrapper over a shared `reqwest::Client`.
pub struct HttpClient {
    token: String,
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("azdo-bridge")
            .build()
            .map_err(|e| Error::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            token: token.into(),
            client,
        })
    }

    /// Build request with auth header.
    pub(crate) fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth("", Some(&self.token))
    }

    /// Perform an exchange without judging the status code.
    pub async fn send(
        &self,
        method: Method,
        url: Url,
        body: Body,
        if_match: Option<&str>,
    ) -> Result<RawResponse> {
        debug!(method = %method, url = %url, "Azure DevOps request");

        let mut builder = self.request(method, url);
        builder = match body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::JsonPatch(document) => builder
                .header(CONTENT_TYPE, azdo_core::patch::CONTENT_TYPE)
                .body(serde_json::to_vec(&document)?),
            Body::Binary(bytes) => builder.header(CONTENT_TYPE, OCTET_STREAM).body(bytes),
        };
        if let Some(etag) = if_match {
            builder = builder.header(IF_MATCH, etag);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status().as_u16();
        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| Error::Http(format!("Failed to read response body: {}", e)))?;

        Ok(RawResponse { status, etag, body })
    }

    /// Perform an exchange, turning any non-2xx status into an error.
    pub async fn call(
        &self,
        method: Method,
        url: Url,
        body: Body,
        if_match: Option<&str>,
    ) -> Result<RawResponse> {
        let response = self.send(method, url, body, if_match).await?;
        if !response.is_success() {
            return Err(response.error());
        }
        Ok(response)
    }
}

/// The service's `message` field, or the canonical reason phrase.
fn remote_message(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.is_empty())
        .or_else(|| {
            StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "request failed".to_string())
}
