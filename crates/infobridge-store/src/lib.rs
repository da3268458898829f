//! infobridge-store: the store connection collaborator.
//!
//! Exposes the two calls a scrape needs from the store: fetch the INFO
//! report (optionally one section) and check cluster status. The client is
//! built at most once per process through [`LazyConnection`].
//!
//! ```text
//! LazyConnection<S>
//!   └── get() → Arc<S>   (first caller constructs, the rest share)
//!
//! StoreConnection
//!   ├── info(section)    → raw report text
//!   └── cluster_info()   → success / failure
//! ```

pub mod connection;
pub mod error;
pub mod lazy;
pub mod redis_backend;

pub use connection::StoreConnection;
pub use error::{StoreError, StoreResult};
pub use lazy::LazyConnection;
pub use redis_backend::RedisStore;
