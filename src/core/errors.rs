// src/core/errors.rs

//! Defines the primary error type for the exporter's domain logic.

use thiserror::Error;

/// The main error enum, representing every failure the monitoring core can observe.
/// Per-node and per-endpoint failures are logged and degraded at the call site; these
/// variants only travel as far as the code that decides how to degrade.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExporterError {
    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Topology discovery failed: {0}")]
    Discovery(String),

    #[error("Metrics error: {0}")]
    Metrics(String),
}

// --- From trait implementations for easy error conversion ---

impl From<reqwest::Error> for ExporterError {
    fn from(e: reqwest::Error) -> Self {
        ExporterError::Http(e.to_string())
    }
}

impl From<serde_json::Error> for ExporterError {
    fn from(e: serde_json::Error) -> Self {
        ExporterError::Decode(e.to_string())
    }
}

impl From<prometheus::Error> for ExporterError {
    fn from(e: prometheus::Error) -> Self {
        ExporterError::Metrics(e.to_string())
    }
}
