//! infobridge-core: turns a key-value store's free-text INFO report into
//! typed metric samples.
//!
//! # Architecture
//!
//! ```text
//! ReportParser::parse(raw, expected_dbs, sink)
//!   ├── Section state (updated on `# Name` headers)
//!   ├── Keyspace lines → parse_keyspace() → db_keys / db_keys_expiring
//!   ├── Other lines → InclusionSet → coerce() → canonical gauge
//!   ├── Empty-database synthesis for unseen `db<N>` slots
//!   └── ReportSummary: role, summed keys and avg_ttl
//!
//! DescriptorRegistry
//!   └── insert-if-absent; label shape fixed at first creation
//! ```
//!
//! Nothing here performs I/O. Samples leave through a [`SampleSink`].

pub mod coerce;
pub mod descriptor;
pub mod error;
pub mod inclusion;
pub mod keyspace;
pub mod report;
pub mod sample;

pub use coerce::{coerce, CoerceError};
pub use descriptor::{fq_name, DescriptorRegistry, MetricDescriptor};
pub use error::{CoreError, CoreResult};
pub use inclusion::{IncludedMetric, InclusionSet};
pub use keyspace::{parse_keyspace, KeyspaceEntry};
pub use report::{ReportParser, ReportSummary, Section, DB_KEYS, DB_KEYS_EXPIRING};
pub use sample::{Sample, SampleSink};
