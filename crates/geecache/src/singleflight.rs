//! Duplicate call suppression
//!
//! Concurrent callers asking for the same key share one execution of the
//! load function and all receive a clone of its result. Once the load returns
//! the key is forgotten, so the next call runs the function again.

use std::collections::HashMap;
use std::sync::Arc;

use ahash::RandomState;
use parking_lot::{Condvar, Mutex};

enum CallState<T> {
    Pending,
    Done(T),
    /// The leading caller unwound before producing a value
    Abandoned,
}

/// An in-flight or completed load
struct Call<T> {
    state: Mutex<CallState<T>>,
    done: Condvar,
}

impl<T> Call<T> {
    fn new() -> Self {
        Self {
            state: Mutex::new(CallState::Pending),
            done: Condvar::new(),
        }
    }

    fn finish(&self, state: CallState<T>) {
        *self.state.lock() = state;
        self.done.notify_all();
    }
}

/// Tracks in-flight loads by key
pub struct SingleFlight<T> {
    calls: Mutex<HashMap<String, Arc<Call<T>>, RandomState>>,
}

impl<T: Clone> SingleFlight<T> {
    /// Create an empty group
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::with_hasher(RandomState::new())),
        }
    }

    /// Run `load` for `key`, unless a load for the same key is already
    /// running, in which case wait for it and return its result.
    ///
    /// The internal lock is never held while `load` runs.
    pub fn run<F>(&self, key: &str, load: F) -> T
    where
        F: FnOnce() -> T,
    {
        let mut load = Some(load);
        loop {
            let mut calls = self.calls.lock();
            if let Some(call) = calls.get(key).cloned() {
                drop(calls);
                match Self::wait(&call) {
                    Some(value) => return value,
                    // Leader went away; try again, possibly as the new leader.
                    None => continue,
                }
            }

            let call = Arc::new(Call::new());
            calls.insert(key.to_owned(), Arc::clone(&call));
            drop(calls);

            let guard = LeaderGuard {
                flight: self,
                key,
                call: &call,
            };
            let load = match load.take() {
                Some(load) => load,
                None => unreachable!("a caller leads at most once"),
            };
            let value = load();
            guard.complete(value.clone());
            return value;
        }
    }

    /// Number of keys with a load in progress
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }

    fn wait(call: &Call<T>) -> Option<T> {
        let mut state = call.state.lock();
        loop {
            match &*state {
                CallState::Pending => call.done.wait(&mut state),
                CallState::Done(value) => return Some(value.clone()),
                CallState::Abandoned => return None,
            }
        }
    }

    fn forget(&self, key: &str) {
        self.calls.lock().remove(key);
    }
}

impl<T: Clone> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Publishes the leader's outcome to waiters, even if `load` panics
struct LeaderGuard<'a, T: Clone> {
    flight: &'a SingleFlight<T>,
    key: &'a str,
    call: &'a Call<T>,
}

impl<T: Clone> LeaderGuard<'_, T> {
    fn complete(self, value: T) {
        self.call.finish(CallState::Done(value));
        self.flight.forget(self.key);
        std::mem::forget(self);
    }
}

impl<T: Clone> Drop for LeaderGuard<'_, T> {
    fn drop(&mut self) {
        self.call.finish(CallState::Abandoned);
        self.flight.forget(self.key);
    }
}
