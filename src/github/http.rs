use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use log::{debug, info};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{self, HeaderMap};
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// GitHub REST API base URL
pub const API_BASE_URL: &str = "https://api.github.com";

/// User-Agent header required by the GitHub API
const USER_AGENT: &str = "issue-pilot";

const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RESET_HEADER: &str = "x-ratelimit-reset";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx response, carrying the HTTP status and response body
    #[error("GitHub API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Quota state observed from the most recent response headers.
#[derive(Debug, Clone, Default)]
pub struct RateLimitState {
    /// Requests left in the current window; `None` until first observed
    pub remaining: Option<u32>,

    /// Epoch second at which the window resets
    pub reset_epoch: Option<u64>,
}

impl RateLimitState {
    /// Update from response headers. Absent headers leave prior state
    /// unchanged.
    pub fn update_from_headers(&mut self, headers: &HeaderMap) {
        if let Some(remaining) = header_u64(headers, REMAINING_HEADER) {
            self.remaining = Some(remaining as u32);
        }
        if let Some(reset) = header_u64(headers, RESET_HEADER) {
            self.reset_epoch = Some(reset);
        }
    }

    /// How long the next request must wait, or `None` when the quota is
    /// not known to be exhausted.
    pub fn wait_duration(&self, now_epoch: u64) -> Option<Duration> {
        if self.remaining? == 0 {
            let reset = self.reset_epoch.unwrap_or(now_epoch);
            Some(Duration::from_secs(reset.saturating_sub(now_epoch)))
        } else {
            None
        }
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.parse().ok()
}

fn epoch_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Blocking, authenticated JSON client for the GitHub REST API.
///
/// Tracks quota from response headers and sleeps until the reset time
/// before the next request once the quota is exhausted. There is no retry
/// and no jitter; the sleep stalls the calling thread.
pub struct RestClient {
    http: Client,
    base_url: String,
    rate_limit: RateLimitState,
}

impl RestClient {
    pub fn new(token: &str) -> Result<Self> {
        Self::with_base_url(token, API_BASE_URL)
    }

    /// Like [`new`](Self::new), but against a caller-chosen base URL
    /// (tests point this at a local server).
    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();

        let auth_value = header::HeaderValue::from_str(&format!("token {}", token))
            .context("Failed to create Authorization header")?;
        headers.insert(header::AUTHORIZATION, auth_value);
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(USER_AGENT),
        );

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limit: RateLimitState::default(),
        })
    }

    pub fn rate_limit(&self) -> &RateLimitState {
        &self.rate_limit
    }

    pub fn get(&mut self, path: &str, params: &[(&str, String)]) -> Result<Value, ApiError> {
        let request = self.http.get(self.url(path)).query(params);
        self.execute(request)
    }

    /// GET returning the raw body instead of JSON, with a caller-chosen
    /// Accept type (used for raw README content).
    pub fn get_raw(&mut self, path: &str, accept: &str) -> Result<String, ApiError> {
        self.wait_for_quota();
        let response = self
            .http
            .get(self.url(path))
            .header(header::ACCEPT, accept)
            .send()?;
        self.rate_limit.update_from_headers(response.headers());

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }
        Ok(response.text()?)
    }

    pub fn post(&mut self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let request = self.http.post(self.url(path)).json(body);
        self.execute(request)
    }

    pub fn patch(&mut self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let request = self.http.patch(self.url(path)).json(body);
        self.execute(request)
    }

    pub fn delete(&mut self, path: &str) -> Result<Value, ApiError> {
        let request = self.http.delete(self.url(path));
        self.execute(request)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Block until the quota window resets when the last response said
    /// the quota was exhausted.
    fn wait_for_quota(&self) {
        if let Some(wait) = self.rate_limit.wait_duration(epoch_now()) {
            if !wait.is_zero() {
                info!(
                    "Rate limit exhausted, sleeping {}s until the window resets",
                    wait.as_secs()
                );
            }
            thread::sleep(wait);
        }
    }

    fn execute(&mut self, request: RequestBuilder) -> Result<Value, ApiError> {
        self.wait_for_quota();

        let response = request.send()?;

        // Quota headers are tracked on every response, success or not
        self.rate_limit.update_from_headers(response.headers());

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            debug!("GitHub API error response ({}): {}", status, body);
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        let text = response.text()?;
        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}
