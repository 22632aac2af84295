//! HTTP client adapter for the admin REST API.
//!
//! Thin wrapper over `reqwest`: base URL, JSON content type, envelope
//! decoding and error-message extraction. No retries, no timeouts beyond
//! reqwest's defaults, no auth handling.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// Every response body is wrapped as `{ "data": ..., "message": "..." }`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Unwrap the payload, treating a missing `data` as a malformed response.
    pub fn into_data(self) -> ApiResult<T> {
        self.data
            .ok_or_else(|| ApiError::Malformed("missing data".to_string()))
    }
}

/// Error body shape. Backends disagree on the key, so accept both.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ApiError::validation(format!("Invalid API URL {:?}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::validation(format!(
                "API URL cannot carry paths: {}",
                base_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    pub fn url(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::validation("API URL cannot carry paths"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> ApiResult<Envelope<T>> {
        let url = self.url(segments)?;
        debug!("GET {}", url);
        self.send(self.client.get(url)).await
    }

    pub async fn get_with_query<T, Q>(&self, segments: &[&str], query: &Q) -> ApiResult<Envelope<T>>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.url(segments)?;
        debug!("GET {} (with query)", url);
        self.send(self.client.get(url).query(query)).await
    }

    pub async fn post<T, B>(&self, segments: &[&str], body: &B) -> ApiResult<Envelope<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(segments)?;
        debug!("POST {}", url);
        self.send(self.client.post(url).json(body)).await
    }

    /// POST without a request body.
    pub async fn post_empty<T: DeserializeOwned>(&self, segments: &[&str]) -> ApiResult<Envelope<T>> {
        let url = self.url(segments)?;
        debug!("POST {}", url);
        self.send(self.client.post(url)).await
    }

    pub async fn put<T, B>(&self, segments: &[&str], body: &B) -> ApiResult<Envelope<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(segments)?;
        debug!("PUT {}", url);
        self.send(self.client.put(url).json(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, segments: &[&str]) -> ApiResult<Envelope<T>> {
        let url = self.url(segments)?;
        debug!("DELETE {}", url);
        self.send(self.client.delete(url)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<Envelope<T>> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = error_message(status.as_u16(), &body);
            debug!("Request failed ({}): {}", status, message);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

/// Best human-readable message for a failed response.
fn error_message(status: u16, body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        if let Some(message) = parsed.message.or(parsed.error) {
            if !message.trim().is_empty() {
                return message;
            }
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if !text.is_empty() && !text.starts_with('<') && !text.starts_with('{') {
        return text.to_string();
    }

    format!("Request failed with status code {}", status)
}
