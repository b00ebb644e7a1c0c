//! In-memory tracker and counter store

use async_trait::async_trait;
use herdguard_core::{parse_counter, GateError, NodeStateTracker, RetryCounterStore, WorkloadRef};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Node state with a fixed base not-ready count per node plus recorded admissions.
/// Admissions never expire.
pub struct InMemoryNodeState {
    base: Arc<Mutex<HashMap<String, u32>>>,
    admitted: Arc<Mutex<HashMap<String, HashSet<String>>>>,
    fail: AtomicBool,
}

impl InMemoryNodeState {
    pub fn new() -> Self {
        Self {
            base: Arc::new(Mutex::new(HashMap::new())),
            admitted: Arc::new(Mutex::new(HashMap::new())),
            fail: AtomicBool::new(false),
        }
    }

    pub fn set_not_ready(&self, node: &str, count: u32) {
        self.base.lock().unwrap().insert(node.to_string(), count);
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Keys recorded as optimistic admissions on `node`
    pub fn admitted(&self, node: &str) -> HashSet<String> {
        self.admitted
            .lock()
            .unwrap()
            .get(node)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for InMemoryNodeState {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeStateTracker for InMemoryNodeState {
    async fn not_ready_count(&self, node: &str) -> Result<u32, GateError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(GateError::PodQuery {
                node: node.to_string(),
                message: "tracker unavailable".to_string(),
            });
        }

        let base = self.base.lock().unwrap().get(node).copied().unwrap_or(0);
        let admitted = self
            .admitted
            .lock()
            .unwrap()
            .get(node)
            .map(|keys| keys.len() as u32)
            .unwrap_or(0);
        Ok(base + admitted)
    }

    async fn record_optimistic_admission(&self, workload_key: &str, node: &str) {
        self.admitted
            .lock()
            .unwrap()
            .entry(node.to_string())
            .or_default()
            .insert(workload_key.to_string());
    }
}

/// Counter store keyed by workload storage key. Falls back to the workload's annotation
/// when nothing has been written yet.
pub struct InMemoryCounterStore {
    counters: Arc<Mutex<HashMap<String, u32>>>,
    fail: AtomicBool,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self {
            counters: Arc::new(Mutex::new(HashMap::new())),
            fail: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Stored value (for test assertions)
    pub fn get(&self, workload: &WorkloadRef) -> Option<u32> {
        self.counters
            .lock()
            .unwrap()
            .get(&workload.storage_key())
            .copied()
    }
}

impl Default for InMemoryCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RetryCounterStore for InMemoryCounterStore {
    async fn current_counter(&self, workload: &WorkloadRef) -> u32 {
        self.get(workload)
            .unwrap_or_else(|| parse_counter(workload))
    }

    async fn set_counter(&self, workload: &WorkloadRef, value: u32) -> Result<(), GateError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(GateError::CounterStore {
                workload: workload.to_string(),
                message: "store unavailable".to_string(),
            });
        }

        self.counters
            .lock()
            .unwrap()
            .insert(workload.storage_key(), value);
        Ok(())
    }
}
