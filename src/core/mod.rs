// src/core/mod.rs

//! The central module containing the scraping, deduplication and recording logic.

pub mod classifier;
pub mod dedup;
pub mod discovery;
pub mod errors;
pub mod fetch;
pub mod http;
pub mod metrics;
pub mod model;
pub mod monitor;
pub mod scrape;
pub mod tasks;
pub mod timefmt;
pub mod topology;

pub use errors::ExporterError;
