//! Metric descriptor registry.
//!
//! A descriptor is the declared shape of an exported metric: its
//! fully-qualified name, help text, and ordered label names. The registry
//! creates descriptors lazily and memoizes them, so every scrape reuses the
//! same `Arc` for a given metric name.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::error::{CoreError, CoreResult};

/// Declared shape of one exported metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    /// Registry key (metric name without namespace).
    pub name: String,
    /// Exported name (`<namespace>_<name>`).
    pub fq_name: String,
    pub help: String,
    pub label_names: Vec<String>,
}

impl MetricDescriptor {
    /// Number of label values every sample of this metric must carry.
    pub fn label_count(&self) -> usize {
        self.label_names.len()
    }
}

/// Join a namespace and a metric name the way Prometheus client libraries do.
///
/// Empty components are skipped, so an empty namespace yields the bare name.
pub fn fq_name(namespace: &str, name: &str) -> String {
    [namespace, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// Process-wide descriptor cache.
///
/// Only insert-if-absent is exposed. Descriptors are never removed or
/// replaced, and the label shape of a name is fixed by its first creation.
#[derive(Debug)]
pub struct DescriptorRegistry {
    namespace: String,
    descriptors: RwLock<HashMap<String, Arc<MetricDescriptor>>>,
}

impl DescriptorRegistry {
    /// Create an empty registry whose descriptors are prefixed with `namespace`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            descriptors: RwLock::new(HashMap::new()),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Return the descriptor for `name`, creating it on first use.
    ///
    /// `help` and `label_names` only matter for the call that creates the
    /// descriptor; later calls get the stored descriptor unchanged.
    pub fn get_or_create(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> CoreResult<Arc<MetricDescriptor>> {
        if let Some(existing) = self.get(name) {
            return Ok(existing);
        }

        let fq = fq_name(&self.namespace, name);
        if !is_valid_metric_name(&fq) {
            return Err(CoreError::InvalidMetricName(fq));
        }

        let mut descriptors = self
            .descriptors
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // Another caller may have won the race between the read and the write.
        let descriptor = descriptors
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(metric = %fq, labels = ?label_names, "metric descriptor created");
                Arc::new(MetricDescriptor {
                    name: name.to_string(),
                    fq_name: fq,
                    help: help.to_string(),
                    label_names: label_names.iter().map(|l| l.to_string()).collect(),
                })
            });
        Ok(Arc::clone(descriptor))
    }

    /// Look up an existing descriptor without creating one.
    pub fn get(&self, name: &str) -> Option<Arc<MetricDescriptor>> {
        self.descriptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Resolve the descriptor a sample with `label_count` label values must use.
    ///
    /// Unlabeled samples create their descriptor on demand with a default
    /// help text. Labeled samples must hit a pre-registered descriptor. In
    /// both cases the label count has to match the declared shape.
    pub fn resolve(&self, name: &str, label_count: usize) -> CoreResult<Arc<MetricDescriptor>> {
        let descriptor = if label_count == 0 {
            self.get_or_create(name, &format!("{name} metric"), &[])?
        } else {
            self.get(name)
                .ok_or_else(|| CoreError::UnknownDescriptor(name.to_string()))?
        };

        if descriptor.label_count() != label_count {
            return Err(CoreError::LabelMismatch {
                name: name.to_string(),
                expected: descriptor.label_count(),
                got: label_count,
            });
        }
        Ok(descriptor)
    }

    /// Every known descriptor, ordered by exported name.
    pub fn descriptors(&self) -> Vec<Arc<MetricDescriptor>> {
        let mut all: Vec<_> = self
            .descriptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| a.fq_name.cmp(&b.fq_name));
        all
    }

    pub fn len(&self) -> usize {
        self.descriptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fq_name_joins_with_underscore() {
        assert_eq!(fq_name("redis", "db_keys"), "redis_db_keys");
        assert_eq!(fq_name("", "db_keys"), "db_keys");
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let registry = DescriptorRegistry::new("redis");
        let first = registry.get_or_create("db_keys", "Keys by DB", &["db"]).unwrap();
        let second = registry.get_or_create("db_keys", "Keys by DB", &["db"]).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn label_shape_fixed_at_first_creation() {
        let registry = DescriptorRegistry::new("redis");
        registry.get_or_create("db_keys", "Keys by DB", &["db"]).unwrap();

        let later = registry
            .get_or_create("db_keys", "other help", &["db", "role"])
            .unwrap();
        assert_eq!(later.label_names, vec!["db".to_string()]);
        assert_eq!(later.help, "Keys by DB");
    }

    #[test]
    fn resolve_unlabeled_creates_with_default_help() {
        let registry = DescriptorRegistry::new("redis");
        let desc = registry.resolve("connected_clients", 0).unwrap();
        assert_eq!(desc.fq_name, "redis_connected_clients");
        assert_eq!(desc.help, "connected_clients metric");
        assert!(desc.label_names.is_empty());
    }

    #[test]
    fn resolve_labeled_requires_preregistration() {
        let registry = DescriptorRegistry::new("redis");
        assert_eq!(
            registry.resolve("db_keys", 1),
            Err(CoreError::UnknownDescriptor("db_keys".to_string()))
        );
    }

    #[test]
    fn resolve_rejects_label_count_mismatch() {
        let registry = DescriptorRegistry::new("redis");
        registry.get_or_create("db_keys", "Keys by DB", &["db"]).unwrap();

        let err = registry.resolve("db_keys", 0).unwrap_err();
        assert_eq!(
            err,
            CoreError::LabelMismatch {
                name: "db_keys".to_string(),
                expected: 1,
                got: 0,
            }
        );
    }

    #[test]
    fn invalid_names_rejected() {
        let registry = DescriptorRegistry::new("");
        assert!(matches!(
            registry.get_or_create("9lives", "", &[]),
            Err(CoreError::InvalidMetricName(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn descriptors_sorted_by_exported_name() {
        let registry = DescriptorRegistry::new("redis");
        registry.get_or_create("used_memory", "", &[]).unwrap();
        registry.get_or_create("connected_clients", "", &[]).unwrap();

        let names: Vec<_> = registry
            .descriptors()
            .iter()
            .map(|d| d.fq_name.clone())
            .collect();
        assert_eq!(names, vec!["redis_connected_clients", "redis_used_memory"]);
    }

    #[test]
    fn concurrent_creation_yields_one_descriptor() {
        let registry = Arc::new(DescriptorRegistry::new("redis"));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.get_or_create("db_keys", "", &["db"]).unwrap())
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(registry.len(), 1);
    }
}
