//! Exclusive claims on rendition keys.
//!
//! The deterministic output name (content hash + resolution) is the dedup
//! key for every derived artifact. Checking for an existing file and then
//! spawning the encoder is a check-then-act race, so a claim on the key
//! must be held across the whole check + encode. Claims are in-process;
//! cross-process leasing belongs to the external metadata store.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Registry of rendition keys currently being produced.
#[derive(Debug, Clone, Default)]
pub struct ClaimRegistry {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl ClaimRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to claim `key` exclusively. Returns `None` while another run
    /// holds it. The claim is released when the guard drops.
    pub fn try_claim(&self, key: &str) -> Option<ClaimGuard> {
        let mut held = self.inner.lock().unwrap();
        if !held.insert(key.to_string()) {
            return None;
        }
        Some(ClaimGuard {
            key: key.to_string(),
            inner: Arc::clone(&self.inner),
        })
    }

    /// Whether `key` is currently claimed.
    pub fn is_claimed(&self, key: &str) -> bool {
        self.inner.lock().unwrap().contains(key)
    }
}

/// RAII release of a claimed key.
#[derive(Debug)]
pub struct ClaimGuard {
    key: String,
    inner: Arc<Mutex<HashSet<String>>>,
}

impl ClaimGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        self.inner.lock().unwrap().remove(&self.key);
    }
}
