// src/core/tasks/mod.rs

//! Long-running background tasks of the exporter.

pub mod poller;
