use std::cell::RefCell;
use std::rc::Rc;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::cluster::ClusterState;

/// What to do when the cluster can't report its occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityFailurePolicy {
    /// Treat the cluster as idle and keep admitting.
    #[default]
    AssumeIdle,
    /// Skip the admission attempt and back off.
    Backoff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    pub used: u32,
    pub available: u32,
}

/// Answers how many nodes are free right now. Every call queries the cluster.
pub struct CapacityTracker {
    cluster: Rc<RefCell<dyn ClusterState>>,
    total_nodes: u32,
    on_failure: CapacityFailurePolicy,
}

impl CapacityTracker {
    pub fn new(cluster: Rc<RefCell<dyn ClusterState>>, total_nodes: u32, on_failure: CapacityFailurePolicy) -> Self {
        Self {
            cluster,
            total_nodes,
            on_failure,
        }
    }

    pub fn total_nodes(&self) -> u32 {
        self.total_nodes
    }

    /// Nodes held by running jobs, or `None` if the query failed under [`CapacityFailurePolicy::Backoff`].
    pub fn used_nodes(&self) -> Option<u32> {
        let result = self.cluster.borrow_mut().used_nodes();
        match result {
            Ok(used) => Some(used),
            Err(e) => match self.on_failure {
                CapacityFailurePolicy::AssumeIdle => {
                    warn!("Can't query used nodes, assuming none are busy: {}", e);
                    Some(0)
                }
                CapacityFailurePolicy::Backoff => {
                    warn!("Can't query used nodes, will retry later: {}", e);
                    None
                }
            },
        }
    }

    pub fn capacity(&self) -> Option<Capacity> {
        let used = self.used_nodes()?;
        Some(Capacity {
            used,
            available: self.total_nodes.saturating_sub(used),
        })
    }
}
