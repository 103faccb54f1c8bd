//! Compute-once request slots.
//!
//! A `Request<T>` moves from pending to running to done exactly once. The
//! first caller of `get` runs the computation; concurrent callers block on
//! the same in-flight computation and receive the identical `Arc<T>` (or the
//! identical error). Waiters poll the cancellation token while they block.
//!
//! A cancelled computation is never published: the request goes back to
//! pending so the next caller computes it again. Panics inside a computation
//! are caught and published as `CompileError::Internal`.
//!
//! A `RequestSlot<T>` holds the current request of one kind for a unit.
//! Invalidation swaps in a fresh request; computations still running on the
//! old one finish there and are never seen through the slot again.

use crate::error::CompileError;
use asc_common::limits::REQUEST_CANCEL_POLL_MS;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::trace;

/// Shared flag that stops running builds.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once cancelled.
    pub fn check(&self) -> Result<(), CompileError> {
        if self.is_cancelled() {
            Err(CompileError::Cancelled)
        } else {
            Ok(())
        }
    }
}

enum State<T> {
    Pending,
    Running,
    Done(Result<Arc<T>, CompileError>),
}

pub struct Request<T> {
    state: Mutex<State<T>>,
    ready: Condvar,
}

impl<T> Default for Request<T> {
    fn default() -> Self {
        Request::new()
    }
}

impl<T> fmt::Debug for Request<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.lock() {
            State::Pending => "pending",
            State::Running => "running",
            State::Done(Ok(_)) => "done",
            State::Done(Err(_)) => "failed",
        };
        f.debug_struct("Request").field("state", &state).finish()
    }
}

impl<T> Request<T> {
    pub fn new() -> Request<T> {
        Request {
            state: Mutex::new(State::Pending),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The result, computing it with `compute` if nobody has yet. `owner`
    /// names the unit in internal errors.
    pub fn get<F>(&self, owner: &str, cancel: &CancelToken, compute: F) -> Result<Arc<T>, CompileError>
    where
        F: FnOnce() -> Result<T, CompileError>,
    {
        let mut state = self.lock();
        loop {
            match &*state {
                State::Done(result) => return result.clone(),
                State::Pending => break,
                State::Running => {
                    if cancel.is_cancelled() {
                        return Err(CompileError::Cancelled);
                    }
                    state = self
                        .ready
                        .wait_timeout(state, Duration::from_millis(REQUEST_CANCEL_POLL_MS))
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
            }
        }
        *state = State::Running;
        drop(state);

        let outcome = match panic::catch_unwind(AssertUnwindSafe(compute)) {
            Ok(result) => result.map(Arc::new),
            Err(payload) => Err(CompileError::Internal {
                unit: owner.to_string(),
                message: panic_message(payload.as_ref()),
            }),
        };

        let mut state = self.lock();
        if matches!(outcome, Err(CompileError::Cancelled)) {
            trace!(owner, "request cancelled, left pending");
            *state = State::Pending;
        } else {
            *state = State::Done(outcome.clone());
        }
        drop(state);
        self.ready.notify_all();
        outcome
    }

    /// The published result, without computing or waiting.
    pub fn peek(&self) -> Option<Result<Arc<T>, CompileError>> {
        match &*self.lock() {
            State::Done(result) => Some(result.clone()),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(&*self.lock(), State::Done(_))
    }

    pub fn is_running(&self) -> bool {
        matches!(&*self.lock(), State::Running)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

/// The current request of one kind.
pub struct RequestSlot<T> {
    current: Mutex<Arc<Request<T>>>,
}

impl<T> Default for RequestSlot<T> {
    fn default() -> Self {
        RequestSlot::new()
    }
}

impl<T> fmt::Debug for RequestSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.current().fmt(f)
    }
}

impl<T> RequestSlot<T> {
    pub fn new() -> RequestSlot<T> {
        RequestSlot {
            current: Mutex::new(Arc::new(Request::new())),
        }
    }

    pub fn current(&self) -> Arc<Request<T>> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the current request with a fresh one.
    pub fn reset(&self) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Arc::new(Request::new());
    }

    /// Replace the current request only if it is still `expected`.
    pub fn reset_if(&self, expected: &Arc<Request<T>>) -> bool {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if Arc::ptr_eq(&current, expected) {
            *current = Arc::new(Request::new());
            true
        } else {
            false
        }
    }

    pub fn peek(&self) -> Option<Result<Arc<T>, CompileError>> {
        self.current().peek()
    }

    pub fn is_done(&self) -> bool {
        self.current().is_done()
    }
}

#[cfg(test)]
#[path = "../tests/request_tests.rs"]
mod request_tests;
