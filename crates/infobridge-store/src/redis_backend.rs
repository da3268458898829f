//! Redis-backed store connection.
//!
//! One [`ConnectionManager`] is opened on the first command and reused by
//! every later one. It reconnects on its own after a dropped connection.
//!
//! ```text
//! INFO [section]   → bulk string report
//! CLUSTER INFO     → bulk string, only success matters
//! ```
//!
//! There is no deadline unless one is configured with
//! [`RedisStore::with_timeout`].

use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::{Client, Cmd, IntoConnectionInfo, RedisResult};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::connection::StoreConnection;
use crate::error::{StoreError, StoreResult};

/// A [`StoreConnection`] talking to a single Redis node.
pub struct RedisStore {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    timeout: Option<Duration>,
}

impl RedisStore {
    /// Build a client for `url` (`redis://[user:password@]host:port`).
    ///
    /// Only parses the URL; no connection is made until the first command.
    pub fn open(url: &str) -> StoreResult<Self> {
        Self::open_as(url, None, None)
    }

    /// Like [`open`](Self::open), with credentials supplied outside the URL.
    ///
    /// `username` and `password` are used verbatim, so they may contain
    /// characters that are reserved in a URL.
    pub fn open_as(url: &str, username: Option<&str>, password: Option<&str>) -> StoreResult<Self> {
        let invalid = |source| StoreError::InvalidAddress {
            addr: redact(url),
            source,
        };

        let mut info = url.into_connection_info().map_err(invalid)?;
        if let Some(username) = username {
            info.redis.username = Some(username.to_string());
        }
        if let Some(password) = password {
            info.redis.password = Some(password.to_string());
        }

        let client = Client::open(info).map_err(invalid)?;
        debug!(url = %redact(url), "redis client created");
        Ok(Self {
            client,
            connection: OnceCell::new(),
            timeout: None,
        })
    }

    /// Bound every command (connect included) by `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Shared connection, opened on first use. A failed open is retried by
    /// the next command.
    async fn connection(&self) -> StoreResult<ConnectionManager> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                let manager = ConnectionManager::new(self.client.clone())
                    .await
                    .map_err(StoreError::Connect)?;
                debug!("redis connection established");
                Ok::<_, StoreError>(manager)
            })
            .await?;
        Ok(manager.clone())
    }

    async fn query(&self, command: &'static str, cmd: Cmd) -> StoreResult<String> {
        let request = async {
            let mut conn = self.connection().await?;
            let result: RedisResult<String> = cmd.query_async(&mut conn).await;
            result.map_err(|source| StoreError::Command { command, source })
        };

        match self.timeout {
            Some(after) => tokio::time::timeout(after, request).await.map_err(|_| {
                warn!(command, ?after, "redis command timed out");
                StoreError::Timeout { command, after }
            })?,
            None => request.await,
        }
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("connected", &self.connection.initialized())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl StoreConnection for RedisStore {
    async fn info(&self, section: Option<&str>) -> StoreResult<String> {
        let mut cmd = redis::cmd("INFO");
        if let Some(section) = section {
            cmd.arg(section);
        }
        self.query("INFO", cmd).await
    }

    async fn cluster_info(&self) -> StoreResult<()> {
        let mut cmd = redis::cmd("CLUSTER");
        cmd.arg("INFO");
        self.query("CLUSTER INFO", cmd).await.map(|_| ())
    }
}

/// Hide credentials in a connection URL before it reaches a log line.
fn redact(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.rsplit_once('@') {
        Some((_, host)) => format!("{scheme}://***@{host}"),
        None => url.to_string(),
    }
}
