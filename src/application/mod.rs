// Application layer - Polling, selection control and dashboard composition
pub mod control_service;
pub mod dashboard_service;
pub mod poller;
pub mod sentinel_api;

#[cfg(test)]
pub(crate) mod fake_api;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock shared state; a panicked writer leaves plain data behind, so poisoning is ignored
pub(crate) fn lock<S>(state: &Mutex<S>) -> MutexGuard<'_, S> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
