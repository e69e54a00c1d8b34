//! In-memory snip storage.

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tracing::debug;

#[derive(Clone, Debug, Serialize)]
pub struct Snip {
    pub id: u64,
    pub body: String,
}

struct Inner {
    snips: Vec<Snip>,
    next_id: u64,
}

/// Snips in insertion order with monotonically increasing ids. Ids are
/// never reused, even after a removal.
pub struct SnipsCollection {
    inner: Mutex<Inner>,
}

impl SnipsCollection {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Inner { snips: Vec::new(), next_id: 0 }) }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking writer leaves the vector intact, so keep serving.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add(&self, body: impl Into<String>) -> u64 {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        let body = body.into();
        debug!(id, body = %body, "adding snip");
        inner.snips.push(Snip { id, body });
        id
    }

    pub fn with_id(&self, id: u64) -> Option<Snip> {
        self.lock().snips.iter().find(|s| s.id == id).cloned()
    }

    pub fn all(&self) -> Vec<Snip> {
        self.lock().snips.clone()
    }

    /// Swaps the body of an existing snip. `false` if there is none.
    pub fn replace(&self, id: u64, body: impl Into<String>) -> bool {
        match self.lock().snips.iter_mut().find(|s| s.id == id) {
            Some(snip) => {
                snip.body = body.into();
                true
            }
            None => false,
        }
    }

    pub fn append(&self, id: u64, more: &str) -> Option<Snip> {
        let mut inner = self.lock();
        let snip = inner.snips.iter_mut().find(|s| s.id == id)?;
        snip.body.push_str(more);
        Some(snip.clone())
    }

    pub fn remove(&self, id: u64) -> bool {
        let mut inner = self.lock();
        let before = inner.snips.len();
        inner.snips.retain(|s| s.id != id);
        inner.snips.len() != before
    }
}
