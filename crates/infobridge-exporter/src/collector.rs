//! The describe / collect capability pair a metrics endpoint drives.

use std::future::Future;
use std::sync::Arc;

use infobridge_core::{MetricDescriptor, SampleSink};

use crate::error::CollectResult;

/// A source of metrics for a pull-based endpoint.
pub trait Collector: Send + Sync {
    /// Every currently known descriptor. Never touches the store.
    fn describe(&self) -> Vec<Arc<MetricDescriptor>>;

    /// Run one scrape and push its samples into `sink`.
    fn collect<K>(&self, sink: &mut K) -> impl Future<Output = CollectResult<()>> + Send
    where
        K: SampleSink + Send;
}
