// src/config.rs

//! Manages exporter configuration: loading, resolving per-cluster values, and validation.

use crate::core::http::{Credentials, Scheme};
use crate::core::topology::{ClusterDefinition, TopologySettings};
use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::warn;

/// Environment variables starting with this prefix override file values.
/// Nested keys use `__`, e.g. `N1QL_CREDENTIALS__PASSWORD`.
pub const ENV_PREFIX: &str = "N1QL";

/// A cluster entry in the `[clusters]` table.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
enum ClusterEntry {
    /// `prod = "10.0.0.1,10.0.0.2"`
    Hosts(String),
    /// `prod = { hosts = ["10.0.0.1"], username = "...", password = "..." }`
    Detailed {
        hosts: Vec<String>,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },
}

/// A raw representation of the config file before validation and resolution.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_listen")]
    listen: String,
    #[serde(default)]
    use_https: bool,
    #[serde(default)]
    accept_invalid_certs: bool,
    #[serde(with = "humantime_serde", default = "default_poll_interval")]
    poll_interval: Duration,
    #[serde(default = "default_renew_every")]
    renew_every: u32,
    #[serde(with = "humantime_serde", default = "default_http_timeout")]
    http_timeout: Duration,
    #[serde(default = "default_query_port")]
    query_port: u16,
    #[serde(default = "default_admin_port")]
    admin_port: u16,
    #[serde(default)]
    credentials: Credentials,
    #[serde(default)]
    clusters: BTreeMap<String, ClusterEntry>,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_listen() -> String {
    "0.0.0.0:8380".to_string()
}
fn default_poll_interval() -> Duration {
    Duration::from_secs(15)
}
fn default_renew_every() -> u32 {
    10
}
fn default_http_timeout() -> Duration {
    Duration::from_secs(5)
}
fn default_query_port() -> u16 {
    8093
}
fn default_admin_port() -> u16 {
    8091
}

/// Represents the final, validated, and resolved exporter configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    /// Address of the metrics pull endpoint.
    pub listen: SocketAddr,
    pub scheme: Scheme,
    /// Accept self-signed certificates when `scheme` is HTTPS.
    pub accept_invalid_certs: bool,
    pub poll_interval: Duration,
    /// Topology is re-discovered every `renew_every` polling cycles.
    pub renew_every: u32,
    /// Bounds every individual HTTP request.
    pub http_timeout: Duration,
    pub query_port: u16,
    pub admin_port: u16,
    pub clusters: Vec<ClusterDefinition>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            listen: SocketAddr::from(([0, 0, 0, 0], 8380)),
            scheme: Scheme::Http,
            accept_invalid_certs: false,
            poll_interval: default_poll_interval(),
            renew_every: default_renew_every(),
            http_timeout: default_http_timeout(),
            query_port: default_query_port(),
            admin_port: default_admin_port(),
            clusters: Vec::new(),
        }
    }
}

impl Config {
    /// Loads a TOML file and applies `N1QL_*` environment overrides on top of it.
    pub fn from_file(path: &str) -> Result<Self> {
        let builder = ::config::Config::builder()
            .add_source(::config::File::new(path, ::config::FileFormat::Toml))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            );
        Self::from_builder(builder)
            .with_context(|| format!("Failed to load configuration from '{path}'"))
    }

    /// Parses configuration from TOML text, without environment overrides.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let builder = ::config::Config::builder()
            .add_source(::config::File::from_str(contents, ::config::FileFormat::Toml));
        Self::from_builder(builder)
    }

    fn from_builder(
        builder: ::config::ConfigBuilder<::config::builder::DefaultState>,
    ) -> Result<Self> {
        let raw_config: RawConfig = builder
            .build()
            .context("Failed to read configuration sources")?
            .try_deserialize()
            .context("Failed to parse configuration")?;

        let config = Config {
            listen: parse_listen_addr(&raw_config.listen)?,
            clusters: resolve_clusters(raw_config.clusters, &raw_config.credentials),
            log_level: raw_config.log_level,
            scheme: Scheme::from_https_flag(raw_config.use_https),
            accept_invalid_certs: raw_config.accept_invalid_certs,
            poll_interval: raw_config.poll_interval,
            renew_every: raw_config.renew_every,
            http_timeout: raw_config.http_timeout,
            query_port: raw_config.query_port,
            admin_port: raw_config.admin_port,
        };

        config.validate()?;
        Ok(config)
    }

    /// The settings every monitor is discovered and scraped with.
    pub fn topology_settings(&self) -> TopologySettings {
        TopologySettings {
            scheme: self.scheme,
            admin_port: self.admin_port,
            query_port: self.query_port,
        }
    }

    /// Validates the resolved configuration to ensure logical consistency.
    fn validate(&self) -> Result<()> {
        if self.clusters.is_empty() {
            return Err(anyhow!("at least one cluster must be configured"));
        }

        let mut seen = HashSet::new();
        for cluster in &self.clusters {
            if cluster.name.trim().is_empty() {
                return Err(anyhow!("cluster names cannot be empty"));
            }
            if !seen.insert(cluster.name.as_str()) {
                return Err(anyhow!(
                    "cluster '{}' is configured more than once",
                    cluster.name
                ));
            }
            if cluster.seed_hosts.is_empty() {
                return Err(anyhow!(
                    "cluster '{}' needs at least one seed host",
                    cluster.name
                ));
            }
            if cluster.credentials.username.is_empty() {
                warn!(
                    "cluster '{}' has no username configured; requests will likely be rejected",
                    cluster.name
                );
            }
        }

        if self.query_port == 0 {
            return Err(anyhow!("query_port cannot be 0"));
        }
        if self.admin_port == 0 {
            return Err(anyhow!("admin_port cannot be 0"));
        }
        if self.poll_interval.is_zero() {
            return Err(anyhow!("poll_interval cannot be 0"));
        }
        if self.http_timeout.is_zero() {
            return Err(anyhow!("http_timeout cannot be 0"));
        }
        if self.renew_every == 0 {
            return Err(anyhow!("renew_every cannot be 0"));
        }
        if self.http_timeout > self.poll_interval {
            warn!(
                "http_timeout ({:?}) exceeds poll_interval ({:?}); slow nodes will delay cycles",
                self.http_timeout, self.poll_interval
            );
        }
        Ok(())
    }
}

/// Parses a listen address. A bare `:port` binds every interface.
pub fn parse_listen_addr(listen: &str) -> Result<SocketAddr> {
    let listen = listen.trim();
    let candidate = if listen.starts_with(':') {
        format!("0.0.0.0{listen}")
    } else {
        listen.to_string()
    };
    candidate
        .parse()
        .with_context(|| format!("Invalid listen address '{listen}'"))
}

/// Normalizes cluster names to upper case, splits seed host lists and applies the
/// global credentials wherever a cluster does not override them.
fn resolve_clusters(
    clusters: BTreeMap<String, ClusterEntry>,
    global: &Credentials,
) -> Vec<ClusterDefinition> {
    clusters
        .into_iter()
        .map(|(name, entry)| {
            let (hosts, credentials) = match entry {
                ClusterEntry::Hosts(list) => (
                    list.split(',').map(str::to_string).collect::<Vec<_>>(),
                    global.clone(),
                ),
                ClusterEntry::Detailed {
                    hosts,
                    username,
                    password,
                } => (
                    hosts,
                    Credentials {
                        username: username.unwrap_or_else(|| global.username.clone()),
                        password: password.unwrap_or_else(|| global.password.clone()),
                    },
                ),
            };
            ClusterDefinition {
                name: name.trim().to_uppercase(),
                seed_hosts: hosts
                    .iter()
                    .map(|host| host.trim())
                    .filter(|host| !host.is_empty())
                    .map(str::to_string)
                    .collect(),
                credentials,
            }
        })
        .collect()
}
