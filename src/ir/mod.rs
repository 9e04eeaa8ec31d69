//! Wire representation of graph patches.
//!
//! Patches arrive as loosely typed JSON from upstream producers. This module
//! defines the raw payloads, the normalizer that turns them into typed graph
//! values, the applied-op record returned to callers, and JSON helpers.

mod normalize;
mod operations;
mod serialization;

pub use normalize::{
    collapse_whitespace, non_empty, normalize_edge, normalize_node, normalize_node_patch,
    unit_interval,
};
pub use operations::{AppliedOp, AppliedPatch, GraphPatch, NodePatch, PatchOp, RawEdge, RawNode};
pub use serialization::{from_json, load_json, save_json_pretty, to_json_pretty};
