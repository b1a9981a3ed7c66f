//! Opaque provider resource handle.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Reference to one loaded provider resource.
///
/// Carries a provider-assigned `id` and an optional payload the provider can
/// recover with [`AdHandle::payload`]. Cloning is cheap and yields a view of the
/// same resource; ownership (and the obligation to release it) stays with the
/// resource entry that stored it.
#[derive(Clone)]
pub struct AdHandle {
    id: u64,
    payload: Option<Arc<dyn Any + Send + Sync>>,
}

impl AdHandle {
    /// Creates a handle without payload.
    pub fn new(id: u64) -> Self {
        Self { id, payload: None }
    }

    /// Creates a handle wrapping a provider-specific payload.
    pub fn with_payload<T: Any + Send + Sync>(id: u64, payload: T) -> Self {
        Self {
            id,
            payload: Some(Arc::new(payload)),
        }
    }

    /// Provider-assigned identifier.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Downcasts the payload, if any, to `T`.
    pub fn payload<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.payload.as_deref()?.downcast_ref::<T>()
    }
}

impl PartialEq for AdHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AdHandle {}

impl fmt::Debug for AdHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdHandle")
            .field("id", &self.id)
            .field("payload", &self.payload.is_some())
            .finish()
    }
}
