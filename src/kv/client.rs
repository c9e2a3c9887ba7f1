//! HTTP client for the key-value service.

use reqwest::{Client, StatusCode, Url};
use thiserror::Error;

/// Query parameter carrying the API token.
pub const TOKEN_PARAM: &str = "API_TOKEN";

/// Token every server accepts without registration.
pub const DEBUG_TOKEN: &str = "DEBUG";

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unauthorized: API token rejected")]
    Unauthorized,

    #[error("Server error: {0}")]
    Server(String),
}

/// Client bound to one server and one API token.
#[derive(Debug, Clone)]
pub struct KvClient {
    base_url: String,
    token: String,
    client: Client,
}

impl KvClient {
    /// Register with the server and keep the issued token.
    pub async fn connect(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let base_url = base_url.into();
        let client = Client::new();
        let url = endpoint(&base_url, &["register"])?;

        let response = client.get(url).send().await?;
        let token = read_body(response).await?.trim().to_string();
        if token.is_empty() {
            return Err(ClientError::Server("empty token from /register".into()));
        }
        tracing::debug!(base_url = %base_url, "registered with key-value server");

        Ok(Self {
            base_url,
            token,
            client,
        })
    }

    /// Reuse a token obtained earlier.
    pub fn with_token(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            client: Client::new(),
        }
    }

    /// Skip registration and use [`DEBUG_TOKEN`].
    pub fn debug(base_url: impl Into<String>) -> Self {
        Self::with_token(base_url, DEBUG_TOKEN)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Store `value` under `key`, replacing what was there.
    pub async fn put(&self, key: &str, value: String) -> Result<(), ClientError> {
        let url = endpoint(&self.base_url, &["save", key])?;
        let response = self
            .client
            .post(url)
            .query(&[(TOKEN_PARAM, self.token.as_str())])
            .body(value)
            .send()
            .await?;
        read_body(response).await.map(|_| ())
    }

    /// The value under `key`, or `None` if nothing was stored yet.
    pub async fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        let url = endpoint(&self.base_url, &["load", key])?;
        let response = self
            .client
            .get(url)
            .query(&[(TOKEN_PARAM, self.token.as_str())])
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_body(response).await.map(Some)
    }
}

fn endpoint(base_url: &str, segments: &[&str]) -> Result<Url, ClientError> {
    let mut url = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| ClientError::InvalidUrl(base_url.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn read_body(response: reqwest::Response) -> Result<String, ClientError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        return Ok(body);
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClientError::Unauthorized),
        _ => Err(ClientError::Server(format!("{}: {}", status, body))),
    }
}
