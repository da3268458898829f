//! The store connection seam.

use std::future::Future;

use crate::error::StoreResult;

/// What a scrape needs from the key-value store.
pub trait StoreConnection: Send + Sync {
    /// Fetch the INFO report as text. `None` requests the default report.
    fn info(&self, section: Option<&str>) -> impl Future<Output = StoreResult<String>> + Send;

    /// Check cluster status. Only success or failure matters.
    fn cluster_info(&self) -> impl Future<Output = StoreResult<()>> + Send;
}
