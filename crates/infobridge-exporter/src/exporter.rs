//! Scrape orchestration.
//!
//! One scrape = fetch the INFO report, work out how many databases to
//! expect, parse the report into samples, add the node-level gauges derived
//! from the whole report, then append the exporter's own `up` and duration
//! gauges. Scrapes are serialized by a single async mutex
//! held for the whole cycle, store round-trips included.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use infobridge_core::{
    CoreResult, DescriptorRegistry, InclusionSet, MetricDescriptor, ReportParser, ReportSummary,
    Sample, SampleSink, DB_KEYS, DB_KEYS_EXPIRING,
};
use infobridge_store::{LazyConnection, StoreConnection, StoreError, StoreResult};

use crate::collector::Collector;
use crate::config::ExporterConfig;
use crate::error::CollectResult;

/// Databases a standalone server exposes by default.
pub const STANDALONE_DATABASES: usize = 16;
/// Cluster nodes only serve database 0.
pub const CLUSTER_DATABASES: usize = 1;

const CLUSTER_ENABLED_MARKER: &str = "cluster_enabled:1";

pub const UP: &str = "up";
pub const SCRAPE_DURATION: &str = "exporter_scrape_duration_seconds";

pub const ROLE_MASTER: &str = "role_master";
pub const DBSIZE: &str = "dbsize";
pub const AVG_TTL: &str = "avg_ttl";

/// Construction-time settings for an [`Exporter`].
#[derive(Debug, Clone)]
pub struct ExporterOptions {
    pub namespace: String,
    pub include_empty_databases: bool,
    pub inclusion: InclusionSet,
}

impl Default for ExporterOptions {
    fn default() -> Self {
        Self {
            namespace: crate::config::DEFAULT_NAMESPACE.to_string(),
            include_empty_databases: true,
            inclusion: InclusionSet::with_defaults(),
        }
    }
}

impl From<&ExporterConfig> for ExporterOptions {
    fn from(config: &ExporterConfig) -> Self {
        Self {
            namespace: config.namespace.clone(),
            include_empty_databases: config.include_empty_databases,
            ..Default::default()
        }
    }
}

/// Bridges one store's INFO report to metric samples.
pub struct Exporter<S> {
    store: Arc<LazyConnection<S>>,
    registry: DescriptorRegistry,
    inclusion: InclusionSet,
    include_empty_databases: bool,
    scrape_lock: Mutex<()>,
}

impl<S: StoreConnection> Exporter<S> {
    /// Create an exporter and pre-register every labeled and included metric.
    ///
    /// Fails only if the namespace produces invalid metric names.
    pub fn new(store: Arc<LazyConnection<S>>, options: ExporterOptions) -> CoreResult<Self> {
        let registry = DescriptorRegistry::new(options.namespace);

        registry.get_or_create(DB_KEYS, "Total number of keys by DB", &["db"])?;
        registry.get_or_create(DB_KEYS_EXPIRING, "Total number of expiring keys by DB", &["db"])?;
        registry.get_or_create(UP, "Whether the last scrape reached the store", &[])?;
        registry.get_or_create(SCRAPE_DURATION, "Duration of the last scrape in seconds", &[])?;
        registry.get_or_create(ROLE_MASTER, "Current node is master", &[])?;
        registry.get_or_create(DBSIZE, "Total key number of current node", &[])?;
        registry.get_or_create(AVG_TTL, "Total avg_ttl of all db in this node", &[])?;
        for (_, included) in options.inclusion.iter() {
            registry.get_or_create(&included.metric, &included.help, &[])?;
        }
        debug!(descriptors = registry.len(), "metric descriptors registered");

        Ok(Self {
            store,
            registry,
            inclusion: options.inclusion,
            include_empty_databases: options.include_empty_databases,
            scrape_lock: Mutex::new(()),
        })
    }

    pub fn registry(&self) -> &DescriptorRegistry {
        &self.registry
    }

    /// Run one full scrape cycle.
    ///
    /// `up` is 1 whenever the report was fetched, even if the cluster check
    /// afterwards failed. Store failures are logged; only a descriptor
    /// contract violation aborts the cycle with an error.
    pub async fn scrape<K>(&self, sink: &mut K) -> CollectResult<()>
    where
        K: SampleSink + Send + ?Sized,
    {
        let _guard = self.scrape_lock.lock().await;
        let started = Instant::now();

        let up = match self.scrape_store(sink).await? {
            Ok(None) => {
                debug!("successfully scraped store");
                1.0
            }
            Ok(Some(cluster_error)) => {
                error!(error = %cluster_error, "error scraping store: cluster check failed");
                1.0
            }
            Err(e) => {
                error!(error = %e, "error scraping store");
                0.0
            }
        };

        self.emit(sink, UP, up)?;
        self.emit(sink, SCRAPE_DURATION, started.elapsed().as_secs_f64())?;
        Ok(())
    }

    /// Outer result: contract violations. Inner result: whether the report
    /// was fetched. On success, carries the cluster check failure if any.
    async fn scrape_store<K>(
        &self,
        sink: &mut K,
    ) -> CollectResult<StoreResult<Option<StoreError>>>
    where
        K: SampleSink + Send + ?Sized,
    {
        let store = match self.store.get() {
            Ok(store) => store,
            Err(e) => return Ok(Err(e)),
        };

        let report = match fetch_report(store.as_ref()).await {
            Ok(report) => report,
            Err(e) => return Ok(Err(e)),
        };

        let (expected_dbs, cluster_error) = expected_databases(store.as_ref(), &report).await;

        let summary = ReportParser::new(&self.registry, &self.inclusion)
            .include_empty_databases(self.include_empty_databases)
            .parse(&report, expected_dbs, sink)?;
        self.emit_summary(sink, &summary)?;
        debug!(role = %summary.role, expected_dbs, "report processed");

        Ok(Ok(cluster_error))
    }

    fn emit_summary<K>(&self, sink: &mut K, summary: &ReportSummary) -> CoreResult<()>
    where
        K: SampleSink + ?Sized,
    {
        let master = if summary.is_master() { 1.0 } else { 0.0 };
        self.emit(sink, ROLE_MASTER, master)?;
        self.emit(sink, DBSIZE, summary.keys_total)?;
        self.emit(sink, AVG_TTL, summary.avg_ttl_total)
    }

    fn emit<K>(&self, sink: &mut K, metric: &str, value: f64) -> CoreResult<()>
    where
        K: SampleSink + ?Sized,
    {
        let descriptor = self.registry.resolve(metric, 0)?;
        sink.push_sample(Sample::gauge(descriptor, value, Vec::new()));
        Ok(())
    }
}

/// `INFO all`, falling back to plain `INFO` when the sectioned form is
/// empty or refused.
async fn fetch_report<S: StoreConnection>(store: &S) -> StoreResult<String> {
    match store.info(Some("all")).await {
        Ok(report) if !report.is_empty() => return Ok(report),
        Ok(_) => debug!("INFO all returned an empty report, falling back to INFO"),
        Err(e) => warn!(error = %e, "INFO all failed, falling back to INFO"),
    }
    store.info(None).await
}

/// Databases to account for, plus the cluster check failure if there was one.
async fn expected_databases<S: StoreConnection>(
    store: &S,
    report: &str,
) -> (usize, Option<StoreError>) {
    if !report.contains(CLUSTER_ENABLED_MARKER) {
        return (STANDALONE_DATABASES, None);
    }

    match store.cluster_info().await {
        Ok(()) => (CLUSTER_DATABASES, None),
        Err(e) => {
            error!(error = %e, "CLUSTER INFO failed");
            (STANDALONE_DATABASES, Some(e))
        }
    }
}

impl<S: StoreConnection> Collector for Exporter<S> {
    fn describe(&self) -> Vec<Arc<MetricDescriptor>> {
        self.registry.descriptors()
    }

    async fn collect<K>(&self, sink: &mut K) -> CollectResult<()>
    where
        K: SampleSink + Send,
    {
        self.scrape(sink).await
    }
}
