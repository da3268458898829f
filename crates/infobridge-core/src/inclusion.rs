//! Allow-list of generic INFO fields exported as metrics.

use std::collections::BTreeMap;

/// Canonical name and help text for one included field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludedMetric {
    pub metric: String,
    pub help: String,
}

/// Fixed mapping from INFO field name to canonical metric name.
///
/// Fields outside the Keyspace section are only exported when listed here.
#[derive(Debug, Clone, Default)]
pub struct InclusionSet {
    fields: BTreeMap<String, IncludedMetric>,
}

impl InclusionSet {
    /// An empty set; nothing generic is exported.
    pub fn new() -> Self {
        Self::default()
    }

    /// The fields exported out of the box.
    pub fn with_defaults() -> Self {
        [
            ("connected_clients", "connected_clients", "Total connections connected to the server"),
            ("maxclients", "max_clients", "Max allowed connection number"),
            ("used_memory", "used_memory", "Used memory in bytes"),
            ("used_cpu_sys", "used_cpu_sys", "System CPU consumed by the server"),
            ("used_cpu_user", "used_cpu_user", "User CPU consumed by the server"),
        ]
        .into_iter()
        .fold(Self::new(), |set, (field, metric, help)| set.with(field, metric, help))
    }

    /// Add `field`, exported as `metric`.
    pub fn with(mut self, field: &str, metric: &str, help: &str) -> Self {
        self.fields.insert(
            field.to_string(),
            IncludedMetric {
                metric: metric.to_string(),
                help: help.to_string(),
            },
        );
        self
    }

    pub fn get(&self, field: &str) -> Option<&IncludedMetric> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// `(field, metric)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &IncludedMetric)> {
        self.fields.iter().map(|(field, metric)| (field.as_str(), metric))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
