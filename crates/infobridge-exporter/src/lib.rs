//! infobridge-exporter: serves a key-value store's INFO report as
//! Prometheus metrics.
//!
//! # Architecture
//!
//! ```text
//! GET /metrics
//!   └── Collector::collect()            (Exporter, one scrape at a time)
//!         ├── LazyConnection::get()     → shared store client
//!         ├── INFO all / INFO           → raw report
//!         ├── CLUSTER INFO              → expected database count
//!         ├── ReportParser::parse()     → samples
//!         └── up / scrape duration      → samples
//!   └── encode_text()                   → text exposition
//! ```

pub mod collector;
pub mod config;
pub mod error;
pub mod exporter;
pub mod exposition;
pub mod router;

pub use collector::Collector;
pub use config::ExporterConfig;
pub use error::{CollectError, CollectResult};
pub use exporter::{Exporter, ExporterOptions};
pub use exposition::{encode_text, TEXT_CONTENT_TYPE};
pub use router::build_router;
