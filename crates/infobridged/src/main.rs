//! infobridged: Redis INFO to Prometheus bridge.
//!
//! Connects lazily to one Redis (or Redis-compatible) server and serves its
//! INFO report as Prometheus metrics. Every request to `/metrics` triggers
//! a fresh scrape.
//!
//! # Usage
//!
//! ```text
//! infobridged --redis.addr cache:6379 --namespace redis --web.listen-address :9121
//! ```
//!
//! Every flag also reads an environment variable (`REDIS_ADDR`,
//! `REDIS_EXPORTER_NAMESPACE`, ...). Precedence: flag or environment, then
//! the `--config` TOML file, then built-in defaults.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing::info;

use infobridge_exporter::{Collector, Exporter, ExporterConfig, ExporterOptions, build_router};
use infobridge_store::{LazyConnection, RedisStore};

#[derive(Parser, Debug)]
#[command(name = "infobridged", about = "Redis INFO to Prometheus exporter")]
struct Cli {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address of the Redis instance to scrape.
    #[arg(long = "redis.addr", env = "REDIS_ADDR")]
    redis_addr: Option<String>,

    /// Username for ACL authentication.
    #[arg(long = "redis.user", env = "REDIS_USER")]
    redis_user: Option<String>,

    /// Password for the Redis instance.
    #[arg(long = "redis.password", env = "REDIS_PASSWORD", hide_env_values = true)]
    redis_password: Option<String>,

    /// Namespace prefix for metric names.
    #[arg(long, env = "REDIS_EXPORTER_NAMESPACE")]
    namespace: Option<String>,

    /// Address to expose `/metrics` on.
    #[arg(long = "web.listen-address", env = "REDIS_EXPORTER_WEB_LISTEN_ADDRESS")]
    listen_address: Option<String>,

    /// Report zero keyspace metrics for databases absent from INFO.
    #[arg(
        long = "include-metrics-for-empty-databases",
        env = "REDIS_EXPORTER_INCL_METRICS_FOR_EMPTY_DATABASES"
    )]
    include_empty_databases: Option<bool>,

    /// Per-command deadline in seconds.
    #[arg(long = "redis.fetch-timeout", env = "REDIS_EXPORTER_FETCH_TIMEOUT")]
    fetch_timeout_secs: Option<u64>,

    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

impl Cli {
    /// Resolve the effective configuration.
    fn into_config(self) -> anyhow::Result<ExporterConfig> {
        let mut config = match &self.config {
            Some(path) => ExporterConfig::from_file(path)?,
            None => ExporterConfig::default(),
        };

        if let Some(addr) = self.redis_addr {
            config.addr = addr;
        }
        if let Some(user) = self.redis_user {
            config.username = user;
        }
        if let Some(password) = self.redis_password {
            config.password = password;
        }
        if let Some(namespace) = self.namespace {
            config.namespace = namespace;
        }
        if let Some(listen_address) = self.listen_address {
            config.listen_address = listen_address;
        }
        if let Some(include) = self.include_empty_databases {
            config.include_empty_databases = include;
        }
        if self.fetch_timeout_secs.is_some() {
            config.fetch_timeout_secs = self.fetch_timeout_secs;
        }

        Ok(config)
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(
            "info,infobridged=debug,infobridge_exporter=debug,infobridge_store=debug",
        )
    });

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = cli.into_config()?;
    run(config).await
}

async fn run(config: ExporterConfig) -> anyhow::Result<()> {
    let addr = config.listen_socket_addr()?;
    info!(
        redis = %config.addr,
        namespace = %config.namespace,
        include_empty_databases = config.include_empty_databases,
        "infobridge exporter starting"
    );

    let url = config.redis_url();
    let (username, password) = config.credentials();
    let (username, password) = (username.map(str::to_owned), password.map(str::to_owned));
    let timeout = config.fetch_timeout();
    let store = Arc::new(LazyConnection::new(move || {
        RedisStore::open_as(&url, username.as_deref(), password.as_deref())
            .map(|store| store.with_timeout(timeout))
    }));

    let exporter = Exporter::new(store, ExporterOptions::from(&config))?;
    info!(descriptors = exporter.describe().len(), "collector registered");

    let router = build_router(Arc::new(exporter));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("infobridge exporter stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}
