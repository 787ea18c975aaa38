//! Process-local import cache: logical file path → memoized analysis.
//!
//! The cache guarantees at-most-one read and one analysis per logical
//! key per compile. Each entry is a [`ScopeCell`], a shared future with
//! two once-settable stages: the *parsed* scope (machine list populated,
//! published before any validation anywhere begins) and the final
//! *analyzed* result. `@use` resolution awaits only the parsed stage,
//! which is what lets import cycles terminate without deadlock.

use std::sync::{Arc, Condvar, Mutex};

use indexmap::IndexMap;
use log::trace;

use crate::diag::CompileError;
use crate::tree::Scope;

/// A one-shot slot shared by many awaiters. The value transitions once
/// from pending to ready; later `set` calls are ignored.
struct Slot<T> {
    value: Mutex<Option<T>>,
    ready: Condvar,
}

impl<T: Clone> Slot<T> {
    fn new() -> Self {
        Slot {
            value: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    fn set(&self, value: T) {
        let mut guard = self.value.lock().unwrap();
        if guard.is_none() {
            *guard = Some(value);
            self.ready.notify_all();
        }
    }

    fn wait(&self) -> T {
        let mut guard = self.value.lock().unwrap();
        while guard.is_none() {
            guard = self.ready.wait(guard).unwrap();
        }
        guard.as_ref().cloned().unwrap()
    }

    fn peek(&self) -> Option<T> {
        self.value.lock().unwrap().clone()
    }
}

pub type ScopeResult = Result<Arc<Scope>, Arc<CompileError>>;

pub struct ScopeCell {
    parsed: Slot<Arc<Scope>>,
    analyzed: Slot<ScopeResult>,
}

impl ScopeCell {
    fn new() -> Self {
        ScopeCell {
            parsed: Slot::new(),
            analyzed: Slot::new(),
        }
    }

    /// Publishes the parsed scope. Must happen before the cell is first
    /// awaited by any `@use` resolver.
    pub fn set_parsed(&self, scope: Arc<Scope>) {
        self.parsed.set(scope);
    }

    /// Awaits the parsed scope.
    pub fn parsed(&self) -> Arc<Scope> {
        self.parsed.wait()
    }

    /// The parsed scope, if published; `None` when the file failed to
    /// read or parse.
    pub fn try_parsed(&self) -> Option<Arc<Scope>> {
        self.parsed.peek()
    }

    /// Settles the cell with the analysis result; every awaiter observes
    /// the same value.
    pub fn finish(&self, result: ScopeResult) {
        self.analyzed.set(result);
    }

    pub fn is_finished(&self) -> bool {
        self.analyzed.peek().is_some()
    }

    /// Awaits the final analysis result.
    pub fn result(&self) -> ScopeResult {
        self.analyzed.wait()
    }
}

pub struct ImportCache {
    entries: Mutex<IndexMap<String, Arc<ScopeCell>>>,
}

impl ImportCache {
    pub fn new() -> Self {
        ImportCache {
            entries: Mutex::new(IndexMap::new()),
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<Arc<ScopeCell>> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    /// Returns the cell for `key`, registering a fresh one when absent.
    /// The check-and-insert is atomic, so concurrent lookups for the
    /// same key always share one cell.
    pub fn register(&self, key: &str) -> (Arc<ScopeCell>, bool) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(cell) = entries.get(key) {
            (cell.clone(), false)
        } else {
            trace!("cache register: {key}");
            let cell = Arc::new(ScopeCell::new());
            entries.insert(key.to_string(), cell.clone());
            (cell, true)
        }
    }

    /// Entries in registration order.
    pub fn entries(&self) -> Vec<(String, Arc<ScopeCell>)> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|(key, cell)| (key.clone(), cell.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ImportCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/t_cache.rs"]
mod tests;
