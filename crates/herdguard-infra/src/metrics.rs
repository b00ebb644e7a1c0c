//! Per-node lifecycle gauges.
//!
//! Informational only; the decision engine never reads them.

use prometheus::{register_int_gauge_vec_with_registry, IntGaugeVec, Registry};

use crate::node_state::PhaseCounts;

#[derive(Clone)]
pub struct NodeStateMetrics {
    pub starting_pods: IntGaugeVec,
    pub running_pods: IntGaugeVec,
    pub unhealthy_pods: IntGaugeVec,
    pub scheduling_pods: IntGaugeVec,
}

impl NodeStateMetrics {
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        Ok(Self {
            starting_pods: register_int_gauge_vec_with_registry!(
                "thundering_herd_scheduler_starting_pods",
                "Number of pods in starting phase",
                &["node"],
                registry,
            )?,
            running_pods: register_int_gauge_vec_with_registry!(
                "thundering_herd_scheduler_running_pods",
                "Number of pods in running phase",
                &["node"],
                registry,
            )?,
            unhealthy_pods: register_int_gauge_vec_with_registry!(
                "thundering_herd_scheduler_unhealthy_pods",
                "Number of pods in unhealthy phase",
                &["node"],
                registry,
            )?,
            scheduling_pods: register_int_gauge_vec_with_registry!(
                "thundering_herd_scheduler_scheduling_pods",
                "Number of pods admitted but not yet observed on the node",
                &["node"],
                registry,
            )?,
        })
    }

    pub fn observe(&self, node: &str, counts: &PhaseCounts) {
        self.starting_pods
            .with_label_values(&[node])
            .set(counts.starting as i64);
        self.running_pods
            .with_label_values(&[node])
            .set(counts.running as i64);
        self.unhealthy_pods
            .with_label_values(&[node])
            .set(counts.unhealthy as i64);
        self.scheduling_pods
            .with_label_values(&[node])
            .set(counts.scheduling as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_sets_node_gauges() {
        let registry = Registry::new();
        let metrics = NodeStateMetrics::new(&registry).unwrap();

        metrics.observe(
            "node-1",
            &PhaseCounts {
                starting: 2,
                running: 5,
                unhealthy: 1,
                scheduling: 3,
            },
        );

        assert_eq!(metrics.starting_pods.with_label_values(&["node-1"]).get(), 2);
        assert_eq!(metrics.running_pods.with_label_values(&["node-1"]).get(), 5);
        assert_eq!(metrics.unhealthy_pods.with_label_values(&["node-1"]).get(), 1);
        assert_eq!(metrics.scheduling_pods.with_label_values(&["node-1"]).get(), 3);
        assert_eq!(registry.gather().len(), 4);
    }

    #[test]
    fn test_double_registration_fails() {
        let registry = Registry::new();
        NodeStateMetrics::new(&registry).unwrap();
        assert!(NodeStateMetrics::new(&registry).is_err());
    }
}
