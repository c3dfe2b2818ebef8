//! Retrying JSON GET client shared by the backend clients

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::{debug, error, instrument};
use url::Url;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::retry::{RetryPolicy, with_retry};

const ACCEPT_JSON: &str = "application/json";

/// Query parameters of one request
pub type QueryParams = Vec<(String, String)>;

/// GET `{base_url}/{command}` and decode the JSON body
///
/// Unless a shared [`Client`] is injected, every attempt builds its own
/// short-lived HTTP client, so a failed connection never leaks into the
/// next attempt.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    headers: HeaderMap,
    shared: Option<Client>,
    timeout: Duration,
    retries: u32,
    retry_delay: Duration,
}

impl ApiClient {
    /// Create a client from its configuration
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if the configuration is invalid.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        config.validate().map_err(ApiError::Configuration)?;

        let base = format!("{}/", config.base_url.trim_end_matches('/'));
        let base_url = Url::parse(&base).map_err(|e| ApiError::Configuration(e.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| ApiError::Configuration(format!("invalid user agent: {e}")))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_JSON));

        debug!(base_url = %base_url, "Initializing API client");

        Ok(Self {
            base_url,
            headers,
            shared: None,
            timeout: config.timeout(),
            retries: config.retries,
            retry_delay: config.retry_delay(),
        })
    }

    /// Reuse one HTTP client for every attempt
    #[must_use]
    pub fn with_shared_client(mut self, client: Client) -> Self {
        self.shared = Some(client);
        self
    }

    /// Base URL commands are resolved against
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// GET with the configured timeout and retry count
    pub async fn get_default(&self, command: &str, params: &QueryParams) -> Result<Value, ApiError> {
        self.get(command, params, self.timeout, self.retries).await
    }

    /// GET `command` with `params`, retrying up to `retry` more times
    ///
    /// HTTP status, network and timeout failures are retried; the error of
    /// the last attempt is returned as-is.
    #[instrument(skip(self, params), fields(base_url = %self.base_url))]
    pub async fn get(
        &self,
        command: &str,
        params: &QueryParams,
        timeout: Duration,
        retry: u32,
    ) -> Result<Value, ApiError> {
        let url = self.command_url(command)?;
        let policy = RetryPolicy::immediate(retry).with_delay(self.retry_delay);

        let outcome = with_retry(&policy, |attempt| {
            let url = url.clone();
            async move {
                debug!(%url, attempt, "Sending GET request");
                self.fetch_once(url, params, timeout).await
            }
        })
        .await;

        debug!(attempts = outcome.attempts, ok = outcome.result.is_ok(), "Request finished");
        outcome.into_result()
    }

    fn command_url(&self, command: &str) -> Result<Url, ApiError> {
        let command = command.trim_start_matches('/');
        if command.is_empty() {
            return Err(ApiError::InvalidRequest("command must not be empty".to_string()));
        }
        self.base_url
            .join(command)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid command '{command}': {e}")))
    }

    fn http_client(&self, timeout: Duration) -> Result<Client, ApiError> {
        if let Some(client) = &self.shared {
            return Ok(client.clone());
        }
        Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Configuration(e.to_string()))
    }

    #[allow(clippy::cast_possible_truncation)]
    async fn fetch_once(
        &self,
        url: Url,
        params: &QueryParams,
        timeout: Duration,
    ) -> Result<Value, ApiError> {
        let timeout_ms = timeout.as_millis() as u64;
        let url_text = url.to_string();
        let client = self.http_client(timeout)?;

        let response = client
            .get(url)
            .headers(self.headers.clone())
            .query(params)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                let err = ApiError::from_reqwest(&e, &url_text, timeout_ms);
                error!(url = %url_text, error = %e, "Network error");
                err
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(url = %url_text, status = status.as_u16(), "HTTP error");
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                url: url_text,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::from_reqwest(&e, &url_text, timeout_ms))?;

        parse_json(&body)
    }
}

/// Decode a response body
pub(crate) fn parse_json(body: &str) -> Result<Value, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
}

/// Build query parameters from string pairs
#[must_use]
pub fn query<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
