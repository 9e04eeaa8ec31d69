//! # intentgraph - Intent Graph Consistency and Motif Engine
//!
//! intentgraph maintains a structured model of what a user wants: a typed
//! graph of goals, constraints, preferences and facts, updated incrementally
//! from conversational turns and mined for recurring structural patterns.
//!
//! ## Core Concepts
//!
//! - **IntentGraph**: A consistent snapshot of nodes and edges with a version
//! - **GraphPatch**: An ordered list of add/update/remove ops against a snapshot
//! - **Cleanup passes**: Invalid-place pruning, duration outliers, slot compaction, rebalancing
//! - **Concept**: The canonical representative of one semantic slot
//! - **Motif**: A pair or triad pattern over concepts, with a causal reading and a lifecycle
//!
//! ## Usage
//!
//! ```rust,ignore
//! use intentgraph::{EngineConfig, GraphPatch, IntentEngine, IntentGraph, PatchOp, RawNode};
//!
//! let engine = IntentEngine::new(EngineConfig::default())?;
//! let patch = GraphPatch::new(vec![PatchOp::AddNode {
//!     node: RawNode::new("t_1", "goal", "Plan a trip to Milan"),
//! }]);
//! let outcome = engine.apply_patch(&IntentGraph::new("trip"), &patch);
//! let reconciled = engine.reconcile(&outcome.graph, &[], &[], chrono::Utc::now());
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod config;
pub mod error;
pub mod graph;
pub mod ir;
pub mod slot;

// Consistency engine
pub mod cleanup;
pub mod patch;

// Mining engine
pub mod concept;
pub mod motif;
pub mod summary;

pub mod engine;

// Re-export primary types at crate root for convenience
pub use cleanup::{CleanupPass, CleanupReport, HubRebalancer, TopologyRebalancer};
pub use concept::{Concept, ConceptId, ConceptKind};
pub use config::{EngineConfig, MotifConfig};
pub use engine::{IntentEngine, Reconciliation};
pub use error::{CodecError, IntentError, IntentResult, ValidationError};
pub use graph::{
    Edge, EdgeId, EdgeType, IntentGraph, Node, NodeId, NodeLayer, NodeStatus, NodeType, WorkingGraph,
};
pub use ir::{AppliedOp, AppliedPatch, GraphPatch, PatchOp, RawEdge, RawNode};
pub use motif::{CausalOperator, Motif, MotifId, MotifStatus, MotifType, Novelty};
pub use patch::{apply_patch, PatchApplier, PatchOutcome};
pub use slot::{RuleClassifier, SemanticSlot, SlotClassifier, SlotFamily};
pub use summary::IntentSummary;
