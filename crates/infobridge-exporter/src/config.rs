//! Exporter configuration.
//!
//! Loaded once at startup (TOML file, then CLI / environment overrides in the
//! daemon) and never mutated afterwards.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_ADDR: &str = "localhost:26379";
pub const DEFAULT_NAMESPACE: &str = "redis";
pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:9999";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Store address, `host:port` or a `redis://` URL.
    pub addr: String,
    pub username: String,
    pub password: String,
    /// Prefix for every exported metric name.
    pub namespace: String,
    pub listen_address: String,
    /// Emit zero-valued keyspace metrics for databases missing from the report.
    pub include_empty_databases: bool,
    /// Deadline for each store command. Unset means wait indefinitely.
    pub fetch_timeout_secs: Option<u64>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            username: String::new(),
            password: String::new(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            include_empty_databases: true,
            fetch_timeout_secs: None,
        }
    }
}

impl ExporterConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ExporterConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Connection URL without credentials, e.g. `redis://host:6379`.
    ///
    /// An address that already carries a scheme is kept as given.
    pub fn redis_url(&self) -> String {
        if self.addr.contains("://") {
            self.addr.clone()
        } else {
            format!("redis://{}", self.addr)
        }
    }

    /// Username and password to authenticate with, `None` when left empty.
    ///
    /// Passed to the client verbatim rather than spliced into the URL.
    pub fn credentials(&self) -> (Option<&str>, Option<&str>) {
        fn non_empty(s: &str) -> Option<&str> {
            (!s.is_empty()).then_some(s)
        }
        (non_empty(&self.username), non_empty(&self.password))
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }

    /// Socket to serve `/metrics` on. A bare `:port` binds all interfaces.
    pub fn listen_socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = if self.listen_address.starts_with(':') {
            format!("0.0.0.0{}", self.listen_address)
        } else {
            self.listen_address.clone()
        };
        addr.parse()
            .map_err(|e| anyhow::anyhow!("invalid listen address {}: {e}", self.listen_address))
    }
}
