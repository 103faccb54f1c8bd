//! A reference that starts strong and can be demoted to weak.

use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Holds `T` strongly until `make_weak`, then only as long as someone else
/// keeps it alive.
#[derive(Debug)]
pub struct HardToWeak<T> {
    strong: Mutex<Option<Arc<T>>>,
    weak: Weak<T>,
}

impl<T> HardToWeak<T> {
    pub fn new(value: Arc<T>) -> HardToWeak<T> {
        HardToWeak {
            weak: Arc::downgrade(&value),
            strong: Mutex::new(Some(value)),
        }
    }

    pub fn get(&self) -> Option<Arc<T>> {
        if let Some(strong) = &*self.strong.lock().unwrap_or_else(PoisonError::into_inner) {
            return Some(strong.clone());
        }
        self.weak.upgrade()
    }

    /// Drop the strong reference. Idempotent.
    pub fn make_weak(&self) {
        self.strong
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn is_weak(&self) -> bool {
        self.strong
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}
