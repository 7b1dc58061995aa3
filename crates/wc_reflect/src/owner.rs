use std::sync::{Arc, Mutex, PoisonError};

use crate::Reflect;

/// Keeps deserialized values alive on behalf of weak references.
///
/// Weak pointers cannot own what they point to. When a weak pointer is
/// rebuilt, its pointee is adopted by the `Owner` supplied by the caller,
/// and lives as long as any clone of that owner.
///
/// ```
/// use std::sync::Arc;
/// use wc_reflect::{Owner, Reflect};
///
/// let owner = Owner::new();
/// let value: Arc<dyn Reflect> = Arc::new(5_u32);
/// let weak = Arc::downgrade(&value);
///
/// owner.adopt(value);
/// assert!(weak.upgrade().is_some());
///
/// drop(owner);
/// assert!(weak.upgrade().is_none());
/// ```
#[derive(Clone, Default)]
pub struct Owner {
    adopted: Arc<Mutex<Vec<Arc<dyn Reflect>>>>,
}

impl Owner {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a strong reference to `value`.
    pub fn adopt(&self, value: Arc<dyn Reflect>) {
        self.adopted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(value);
    }

    /// Number of adopted values.
    pub fn len(&self) -> usize {
        self.adopted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl core::fmt::Debug for Owner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Owner").field("adopted", &self.len()).finish()
    }
}
