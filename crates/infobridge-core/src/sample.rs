//! Resolved metric samples and the sink they are handed to.

use std::sync::Arc;

use crate::descriptor::MetricDescriptor;

/// One gauge reading for a descriptor, produced during a single scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub descriptor: Arc<MetricDescriptor>,
    pub value: f64,
    /// Values for `descriptor.label_names`, in the same order.
    pub label_values: Vec<String>,
}

impl Sample {
    pub fn gauge(descriptor: Arc<MetricDescriptor>, value: f64, label_values: Vec<String>) -> Self {
        Self {
            descriptor,
            value,
            label_values,
        }
    }

    /// Label pairs as `(name, value)`.
    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.descriptor
            .label_names
            .iter()
            .map(String::as_str)
            .zip(self.label_values.iter().map(String::as_str))
    }
}

/// Destination for samples produced by a scrape.
pub trait SampleSink {
    fn push_sample(&mut self, sample: Sample);
}

impl SampleSink for Vec<Sample> {
    fn push_sample(&mut self, sample: Sample) {
        self.push(sample);
    }
}
