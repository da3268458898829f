//! Guaranteed-once construction of the shared store connection.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

type Factory<S> = Box<dyn Fn() -> StoreResult<S> + Send + Sync>;

/// Builds a connection on first use and hands the same instance to every caller.
///
/// The slot is guarded by a mutex held across construction, so racing
/// callers wait for the first one and then share its result. A failed
/// construction leaves the slot empty and the next `get` tries again.
pub struct LazyConnection<S> {
    factory: Factory<S>,
    slot: Mutex<Option<Arc<S>>>,
}

impl<S> LazyConnection<S> {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> StoreResult<S> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            slot: Mutex::new(None),
        }
    }

    /// Wrap an already-built connection.
    pub fn ready(conn: S) -> Self
    where
        S: 'static,
    {
        Self {
            factory: Box::new(|| -> StoreResult<S> {
                Err(StoreError::Init("no factory for a pre-built connection".to_string()))
            }),
            slot: Mutex::new(Some(Arc::new(conn))),
        }
    }

    /// Return the shared connection, constructing it if this is the first call.
    pub fn get(&self) -> StoreResult<Arc<S>> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(conn) = slot.as_ref() {
            return Ok(Arc::clone(conn));
        }

        match (self.factory)() {
            Ok(conn) => {
                let conn = Arc::new(conn);
                *slot = Some(Arc::clone(&conn));
                debug!("store connection initialized");
                Ok(conn)
            }
            Err(e) => {
                warn!(error = %e, "store connection initialization failed");
                Err(e)
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl<S> fmt::Debug for LazyConnection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyConnection")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
