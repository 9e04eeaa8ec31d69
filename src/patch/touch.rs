//! Per-patch touch bookkeeping.

use std::collections::HashMap;

use crate::graph::NodeId;

/// Records which nodes a patch added or updated, with a monotonically
/// increasing sequence number per touch. Later touches win tie-breaks.
#[derive(Debug, Clone, Default)]
pub struct TouchLog {
    sequence: HashMap<NodeId, u64>,
    order: Vec<NodeId>,
    next: u64,
}

impl TouchLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a touch of `id` and returns its sequence number.
    pub fn touch(&mut self, id: &NodeId) -> u64 {
        self.next += 1;
        if self.sequence.insert(id.clone(), self.next).is_none() {
            self.order.push(id.clone());
        }
        self.next
    }

    /// Drops a node that no longer exists.
    pub fn forget(&mut self, id: &NodeId) {
        if self.sequence.remove(id).is_some() {
            self.order.retain(|n| n != id);
        }
    }

    /// Latest touch sequence of `id`.
    #[must_use]
    pub fn sequence(&self, id: &NodeId) -> Option<u64> {
        self.sequence.get(id).copied()
    }

    /// Returns true if `id` was touched by the current patch.
    #[must_use]
    pub fn is_touched(&self, id: &NodeId) -> bool {
        self.sequence.contains_key(id)
    }

    /// Touched node ids in order of first touch.
    #[must_use]
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Returns true if nothing was touched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
