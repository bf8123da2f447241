// src/core/http.rs

//! The authenticated GET transport used for every call to a cluster.

use super::errors::ExporterError;
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// A basic-auth credential pair.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keeps passwords out of logs and panic messages.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The transport protocol used to reach a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn from_https_flag(use_https: bool) -> Self {
        if use_https {
            Scheme::Https
        } else {
            Scheme::Http
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds `scheme://host:port`.
pub fn base_url(scheme: Scheme, host: &str, port: u16) -> String {
    format!("{scheme}://{host}:{port}")
}

/// An authenticated HTTP GET that never fails.
///
/// Transport errors and non-200 responses are logged by the implementation and
/// surface as an empty body, which every caller treats as "nothing observed".
#[async_trait]
pub trait HttpGet: Send + Sync {
    async fn get(&self, url: &str, credentials: &Credentials) -> Bytes;
}

/// The production [`HttpGet`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: reqwest::Client,
}

impl RestClient {
    /// Creates a client whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration, accept_invalid_certs: bool) -> Result<Self, ExporterError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpGet for RestClient {
    async fn get(&self, url: &str, credentials: &Credentials) -> Bytes {
        let response = self
            .client
            .get(url)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .send()
            .await;

        let response = match response {
            Ok(res) => res,
            Err(e) => {
                warn!("Failed to scrape {}: {}", url, e);
                return Bytes::new();
            }
        };

        if response.status() != reqwest::StatusCode::OK {
            warn!("{} responded with status {}", url, response.status());
            return Bytes::new();
        }

        match response.bytes().await {
            Ok(body) => {
                debug!("Fetched {} bytes from {}", body.len(), url);
                body
            }
            Err(e) => {
                warn!("Failed to read response body from {}: {}", url, e);
                Bytes::new()
            }
        }
    }
}
