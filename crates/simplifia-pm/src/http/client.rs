//! HTTP client for pack registry and artifact operations.
//!
//! This module provides a thin wrapper around `reqwest::blocking` with:
//! - An operation timeout surfaced as a distinct [`HttpError::Timeout`]. It
//!   bounds waiting for response headers and each body read, never the whole
//!   transfer, so a slow download that keeps making progress completes
//! - Status checking (non-2xx responses become [`HttpError::HttpStatus`])
//! - Custom User-Agent, proxy and CA certificate support
//! - Optional bearer authentication for registry requests
//!
//! Requests are never retried here; callers decide whether to try again.
//!
//! # Examples
//!
//! ```no_run
//! use simplifia_pm::http::{HttpClient, HttpClientConfig};
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpClientConfig::new().with_timeout(Duration::from_secs(30));
//! let client = HttpClient::with_config(config)?;
//!
//! #[derive(serde::Deserialize)]
//! struct Listing {
//!     packs: Vec<serde_json::Value>,
//! }
//! let listing: Listing = client.get_json("https://example.com/manifest.json", None)?;
//! # Ok(())
//! # }
//! ```

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_USER_AGENT: &str = concat!("simplifia/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Request timed out: {url}")]
    Timeout { url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON deserialization error: {0}")]
    JsonParse(String),
}

pub struct HttpClient {
    client: Client,
    user_agent: String,
    timeout: Duration,
}

impl HttpClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_config(HttpClientConfig::default())
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .user_agent(&config.user_agent);

        if let Some(proxy_url) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)?;
            builder = builder.proxy(proxy);
        } else if !config.system_proxy {
            builder = builder.no_proxy();
        }

        if let Some(cafile) = &config.cafile {
            match std::fs::read(cafile) {
                Ok(cert_bytes) => {
                    let cert = reqwest::Certificate::from_pem(&cert_bytes)?;
                    builder = builder.add_root_certificate(cert);
                }
                Err(e) => log::warn!("Ignoring unreadable CA file {}: {}", cafile.display(), e),
            }
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            user_agent: config.user_agent,
            timeout: config.timeout,
        })
    }

    /// Perform a GET request.
    ///
    /// Redirects are followed. Non-success statuses are returned as errors.
    pub fn get(&self, url: &str, bearer: Option<&str>) -> Result<Response, HttpError> {
        log::debug!("GET {} (timeout {:?})", url, self.timeout);

        let request = self.authorize(self.client.get(url), bearer);
        let response = request.send().map_err(|e| Self::classify(e, url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response)
    }

    /// GET JSON and deserialize
    pub fn get_json<T: DeserializeOwned>(&self, url: &str, bearer: Option<&str>) -> Result<T, HttpError> {
        let response = self.get(url, bearer)?;
        let text = response.text().map_err(|e| Self::classify(e, url))?;

        serde_json::from_str(&text).map_err(|e| HttpError::JsonParse(e.to_string()))
    }

    fn authorize(&self, request: RequestBuilder, bearer: Option<&str>) -> RequestBuilder {
        match bearer {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Turn reqwest timeouts into a dedicated variant
    pub(crate) fn classify(error: reqwest::Error, url: &str) -> HttpError {
        if error.is_timeout() {
            HttpError::Timeout { url: url.to_string() }
        } else {
            HttpError::Request(error)
        }
    }

    /// Get the configured user agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Get the default request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub proxy: Option<String>,
    pub cafile: Option<PathBuf>,
    pub user_agent: String,
    /// Honour `HTTP_PROXY`-style variables when no proxy is configured
    pub system_proxy: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            proxy: None,
            cafile: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            system_proxy: true,
        }
    }
}

impl HttpClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn with_cafile(mut self, cafile: PathBuf) -> Self {
        self.cafile = Some(cafile);
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Connect directly, ignoring proxy environment variables
    pub fn without_system_proxy(mut self) -> Self {
        self.system_proxy = false;
        self
    }
}
