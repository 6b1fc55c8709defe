//! Content-addressed compute cache with per-key single-flight discipline.
//!
//! `get_or_compute` guarantees that for a given key, only one concurrent
//! caller executes the compute closure. Callers arriving while a
//! computation is in flight subscribe to its outcome instead of starting a
//! duplicate. The computation itself runs in a detached task, so a waiter
//! abandoning its request never aborts work that other callers (present or
//! future) rely on; the only cancellable unit is a caller's wait.
//!
//! Keys hold values write-once: the first successful computation is
//! authoritative and later calls only read. A failed computation leaves
//! its key uncached, so a future call may retry.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::debug;

use tabsense_core::{CacheKey, Error, Result};

type Outcome<V> = std::result::Result<V, Error>;

enum Slot<V> {
    Ready(V),
    InFlight(broadcast::Sender<Outcome<V>>),
}

/// Per-kind compute cache. Unrelated keys stay fully concurrent; only
/// callers sharing a key serialize on one in-flight computation.
pub struct ComputeCache<V> {
    slots: Arc<Mutex<HashMap<CacheKey, Slot<V>>>>,
}

impl<V> Default for ComputeCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ComputeCache<V> {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<V: Clone + Send + 'static> ComputeCache<V> {
    /// Return the cached value for `key` if one is stored.
    pub fn peek(&self, key: &CacheKey) -> Option<V> {
        let slots = self.slots.lock().unwrap();
        match slots.get(key) {
            Some(Slot::Ready(v)) => Some(v.clone()),
            _ => None,
        }
    }

    /// Number of keys holding a completed value.
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap();
        slots
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the value for `key`, computing it at most once.
    ///
    /// - Hit: the stored value is returned and `compute` is dropped unrun.
    /// - Miss: `compute` is spawned as a detached task; this caller and
    ///   any that arrive before it finishes all receive its one outcome.
    /// - Failure: every waiter receives the same error and the key is
    ///   evicted so a later call can retry.
    pub async fn get_or_compute<F>(&self, key: CacheKey, compute: F) -> Result<V>
    where
        F: Future<Output = Result<V>> + Send + 'static,
    {
        let mut rx = {
            let mut slots = self.slots.lock().unwrap();
            match slots.get(&key) {
                Some(Slot::Ready(value)) => {
                    debug!(
                        component = "compute_cache",
                        fingerprint = %key,
                        cache_hit = true,
                        "Serving stored value"
                    );
                    return Ok(value.clone());
                }
                Some(Slot::InFlight(tx)) => {
                    debug!(
                        component = "compute_cache",
                        fingerprint = %key,
                        "Joining in-flight computation"
                    );
                    tx.subscribe()
                }
                None => {
                    let (tx, rx) = broadcast::channel(1);
                    slots.insert(key.clone(), Slot::InFlight(tx.clone()));

                    let slots_handle = Arc::clone(&self.slots);
                    let task_key = key.clone();
                    tokio::spawn(async move {
                        let outcome = compute.await;
                        {
                            let mut slots = slots_handle.lock().unwrap();
                            match &outcome {
                                Ok(value) => {
                                    slots.insert(task_key, Slot::Ready(value.clone()));
                                }
                                Err(_) => {
                                    slots.remove(&task_key);
                                }
                            }
                        }
                        // Publish after the map reflects the outcome, so a
                        // woken waiter re-reading the cache sees it settled.
                        let _ = tx.send(outcome);
                    });
                    rx
                }
            }
        };

        match rx.recv().await {
            Ok(outcome) => outcome,
            Err(_) => Err(Error::Internal(
                "in-flight computation ended without publishing an outcome".to_string(),
            )),
        }
    }
}
