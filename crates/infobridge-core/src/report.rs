//! INFO report parsing and field dispatch.
//!
//! A report is a sequence of `# Section` headers and `key:value` fields,
//! separated by `\r\n`. The only parser state is the current section.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::coerce::coerce;
use crate::descriptor::DescriptorRegistry;
use crate::error::CoreResult;
use crate::inclusion::InclusionSet;
use crate::keyspace::parse_keyspace;
use crate::sample::{Sample, SampleSink};

/// Total keys per database, labeled by `db`.
pub const DB_KEYS: &str = "db_keys";
/// Keys with an expiry per database, labeled by `db`.
pub const DB_KEYS_EXPIRING: &str = "db_keys_expiring";

const KEYSPACE_SECTION: &str = "Keyspace";
const ROLE_FIELD: &str = "role";
const MASTER_ROLE: &str = "master";

/// Node-level facts gathered while parsing one report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportSummary {
    /// Last `role` value seen, empty if the report has none.
    pub role: String,
    /// `keys` summed over every accepted keyspace line.
    pub keys_total: f64,
    /// `avg_ttl` summed over every accepted keyspace line.
    pub avg_ttl_total: f64,
}

impl ReportSummary {
    pub fn is_master(&self) -> bool {
        self.role == MASTER_ROLE
    }
}

/// The section the parser is currently inside.
///
/// Changes only when a header line is read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section(String);

impl Section {
    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_keyspace(&self) -> bool {
        self.0 == KEYSPACE_SECTION
    }

    fn enter(&mut self, name: &str) {
        self.0.clear();
        self.0.push_str(name);
    }
}

enum Line<'r> {
    Header(&'r str),
    Field(&'r str, &'r str),
    Skip,
}

fn classify(raw: &str) -> Line<'_> {
    let line = raw.trim();
    if let Some(name) = line.strip_prefix("# ") {
        return Line::Header(name);
    }
    if line.len() < 2 {
        return Line::Skip;
    }
    match line.split_once(':') {
        Some((key, value)) => Line::Field(key, value),
        None => Line::Skip,
    }
}

/// Walks a raw report and emits samples for keyspace and included fields.
#[derive(Debug, Clone, Copy)]
pub struct ReportParser<'a> {
    registry: &'a DescriptorRegistry,
    inclusion: &'a InclusionSet,
    include_empty_databases: bool,
}

impl<'a> ReportParser<'a> {
    pub fn new(registry: &'a DescriptorRegistry, inclusion: &'a InclusionSet) -> Self {
        Self {
            registry,
            inclusion,
            include_empty_databases: true,
        }
    }

    /// Whether unseen database slots get zero-valued keyspace samples.
    pub fn include_empty_databases(mut self, enabled: bool) -> Self {
        self.include_empty_databases = enabled;
        self
    }

    /// Parse `raw`, pushing every resulting sample into `sink`.
    ///
    /// `expected_dbs` bounds empty-database synthesis to `db0..db{n-1}`.
    /// Returns the role and keyspace totals for the whole report.
    ///
    /// Malformed fields are logged and skipped. An error is returned only
    /// when a sample does not fit its registered descriptor.
    pub fn parse<K: SampleSink + ?Sized>(
        &self,
        raw: &str,
        expected_dbs: usize,
        sink: &mut K,
    ) -> CoreResult<ReportSummary> {
        let mut section = Section::default();
        let mut summary = ReportSummary::default();
        let mut fields: HashMap<&str, &str> = HashMap::new();
        let mut seen_dbs: HashSet<&str> = HashSet::new();
        let mut emitted = 0usize;

        for raw_line in raw.split('\n') {
            let (key, value) = match classify(raw_line) {
                Line::Header(name) => {
                    section.enter(name);
                    debug!(section = %section.name(), "entered report section");
                    continue;
                }
                Line::Field(key, value) => (key, value),
                Line::Skip => continue,
            };

            fields.insert(key, value);

            if section.is_keyspace()
                && let Some(entry) = parse_keyspace(key, value)
            {
                self.emit_db(sink, key, entry.keys_total, entry.keys_expiring)?;
                summary.keys_total += entry.keys_total;
                summary.avg_ttl_total += entry.avg_ttl;
                seen_dbs.insert(key);
                emitted += 2;
                continue;
            }

            let Some(included) = self.inclusion.get(key) else {
                continue;
            };

            let value = match coerce(value) {
                Ok(v) => v,
                Err(e) => {
                    info!(field = %key, error = %e, "skipping unparseable field");
                    continue;
                }
            };

            self.registry
                .get_or_create(&included.metric, &included.help, &[])?;
            self.emit(sink, &included.metric, value, Vec::new())?;
            emitted += 1;
        }

        if self.include_empty_databases {
            for index in 0..expected_dbs {
                let db = format!("db{index}");
                if !seen_dbs.contains(db.as_str()) {
                    self.emit_db(sink, &db, 0.0, 0.0)?;
                    emitted += 2;
                }
            }
        }

        debug!(
            samples = emitted,
            databases_seen = seen_dbs.len(),
            expected_dbs,
            "report parsed"
        );

        summary.role = fields.get(ROLE_FIELD).map(|r| r.to_string()).unwrap_or_default();
        Ok(summary)
    }

    fn emit_db<K: SampleSink + ?Sized>(
        &self,
        sink: &mut K,
        db: &str,
        keys_total: f64,
        keys_expiring: f64,
    ) -> CoreResult<()> {
        self.emit(sink, DB_KEYS, keys_total, vec![db.to_string()])?;
        self.emit(sink, DB_KEYS_EXPIRING, keys_expiring, vec![db.to_string()])
    }

    fn emit<K: SampleSink + ?Sized>(
        &self,
        sink: &mut K,
        metric: &str,
        value: f64,
        label_values: Vec<String>,
    ) -> CoreResult<()> {
        let descriptor = self.registry.resolve(metric, label_values.len())?;
        sink.push_sample(Sample::gauge(descriptor, value, label_values));
        Ok(())
    }
}
