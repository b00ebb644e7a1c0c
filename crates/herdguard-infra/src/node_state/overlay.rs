use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use prometheus::IntGaugeVec;
use tokio::sync::RwLock;
use tokio::time::Instant;

type Entries = HashMap<String, HashMap<String, Instant>>;

/// Short-lived "admitted but not yet visible" entries, keyed by node then workload key.
///
/// Every insertion spawns its own expiry task. The task only removes the entry it was
/// spawned for, so a key that was removed and inserted again keeps its full grace period.
///
/// With a gauge attached, each node's entry count is published on every change,
/// including timer expiry.
#[derive(Clone)]
pub struct OptimisticOverlay {
    entries: Arc<RwLock<Entries>>,
    grace: Duration,
    gauge: Option<IntGaugeVec>,
}

impl OptimisticOverlay {
    pub fn new(grace: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            grace,
            gauge: None,
        }
    }

    /// Publish per-node entry counts to `gauge`, labelled by node.
    pub fn with_gauge(mut self, gauge: IntGaugeVec) -> Self {
        self.gauge = Some(gauge);
        self
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Add `key` on `node`. Returns false if it is already present; the existing entry
    /// keeps its original expiry.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn insert(&self, node: &str, key: &str) -> bool {
        let inserted_at = Instant::now();
        {
            let mut entries = self.entries.write().await;
            let node_entries = entries.entry(node.to_string()).or_default();
            if node_entries.contains_key(key) {
                return false;
            }
            node_entries.insert(key.to_string(), inserted_at);
            publish(self.gauge.as_ref(), node, node_entries.len());
        }

        tracing::trace!(node = %node, workload = %key, "Optimistic admission recorded");
        self.spawn_expiry(node.to_string(), key.to_string(), inserted_at);
        true
    }

    fn spawn_expiry(&self, node: String, key: String, inserted_at: Instant) {
        let entries = Arc::clone(&self.entries);
        let gauge = self.gauge.clone();
        let deadline = inserted_at + self.grace;

        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;

            let mut entries = entries.write().await;
            if let Some(node_entries) = entries.get_mut(&node) {
                if node_entries.get(&key) == Some(&inserted_at) {
                    node_entries.remove(&key);
                    publish(gauge.as_ref(), &node, node_entries.len());
                    tracing::trace!(node = %node, workload = %key, "Optimistic admission expired");
                }
            }
        });
    }

    pub async fn count(&self, node: &str) -> u32 {
        let entries = self.entries.read().await;
        entries
            .get(node)
            .map(|node_entries| node_entries.len() as u32)
            .unwrap_or(0)
    }

    pub async fn contains(&self, node: &str, key: &str) -> bool {
        let entries = self.entries.read().await;
        entries
            .get(node)
            .is_some_and(|node_entries| node_entries.contains_key(key))
    }

    /// Drop `key` from every node. Returns whether anything was removed.
    pub async fn remove(&self, key: &str) -> bool {
        let mut entries = self.entries.write().await;
        let mut removed = false;
        for (node, node_entries) in entries.iter_mut() {
            if node_entries.remove(key).is_some() {
                publish(self.gauge.as_ref(), node, node_entries.len());
                removed = true;
            }
        }
        removed
    }

    /// Entry count for every node seen so far.
    pub async fn counts(&self) -> HashMap<String, u32> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .map(|(node, node_entries)| (node.clone(), node_entries.len() as u32))
            .collect()
    }
}

fn publish(gauge: Option<&IntGaugeVec>, node: &str, count: usize) {
    if let Some(gauge) = gauge {
        gauge.with_label_values(&[node]).set(count as i64);
    }
}
