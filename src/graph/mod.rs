//! Core intent graph data structures.

mod edge;
mod node;
mod snapshot;
mod working;

pub use edge::{Edge, EdgeId, EdgeSignature, EdgeType, DEFAULT_EDGE_CONFIDENCE};
pub use node::{Node, NodeId, NodeLayer, NodeStatus, NodeType, Severity, Strength};
pub use snapshot::{GraphSnapshot, IntentGraph};
pub use working::{ArenaRejection, WorkingGraph};
