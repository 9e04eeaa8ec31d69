use std::time::Instant;

use chrono::Utc;
use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use intentgraph::{
    Edge, EdgeType, EngineConfig, GraphPatch, IntentEngine, IntentGraph, Node, NodeType, PatchOp, RawEdge, RawNode,
};

const CITIES: &[&str] = &["米兰", "罗马", "佛罗伦萨", "威尼斯", "那不勒斯", "都灵"];

/// A trip graph with one goal, a destination and duration per city, and a
/// handful of constraints and preferences all hanging off the goal.
fn trip_graph() -> IntentGraph {
    let mut nodes = vec![Node::new("goal", NodeType::Goal, "Plan a family trip to Italy").with_confidence(0.9)];
    let mut edges = Vec::new();
    for (i, city) in CITIES.iter().enumerate() {
        nodes.push(Node::new(format!("dest{i}"), NodeType::Fact, format!("目的地：{city}")).with_confidence(0.85));
        nodes.push(Node::new(format!("stay{i}"), NodeType::Fact, format!("{city}2天")).with_confidence(0.8));
        edges.push(Edge::new(format!("ed{i}"), format!("dest{i}"), "goal", EdgeType::Enable).with_confidence(0.8));
        edges.push(Edge::new(format!("es{i}"), format!("stay{i}"), format!("dest{i}"), EdgeType::Determine));
    }
    for (id, node_type, statement, edge_type) in [
        ("budget", NodeType::Constraint, "预算3万", EdgeType::Constraint),
        ("heart", NodeType::Constraint, "父亲有心脏病", EdgeType::Constraint),
        ("hotel", NodeType::Preference, "quiet hotel near the station", EdgeType::Enable),
        ("train", NodeType::Preference, "坐高铁", EdgeType::Enable),
        ("museum", NodeType::Preference, "参观博物馆", EdgeType::Enable),
        ("redeye", NodeType::Preference, "不要红眼航班", EdgeType::ConflictsWith),
    ] {
        nodes.push(Node::new(id, node_type, statement).with_confidence(0.85));
        edges.push(Edge::new(format!("e_{id}"), id, "goal", edge_type).with_confidence(0.85));
    }
    IntentGraph::from_parts("bench", 1, nodes, edges)
}

fn follow_up_patch() -> GraphPatch {
    GraphPatch::new(vec![
        PatchOp::AddNode {
            node: RawNode::new("t_dest", "fact", "目的地：米兰"),
        },
        PatchOp::AddNode {
            node: RawNode::new("t_total", "constraint", "总共30天"),
        },
        PatchOp::AddNode {
            node: RawNode::new("t_pref", "preference", "prefer boutique hotel"),
        },
        PatchOp::AddEdge {
            edge: RawEdge::new("t_e1", "t_dest", "goal", "enable"),
        },
        PatchOp::AddEdge {
            edge: RawEdge::new("t_e2", "t_pref", "goal", "enable"),
        },
    ])
}

fn bench_apply_patch(c: &mut Criterion) {
    let engine = IntentEngine::new(EngineConfig::default()).unwrap();
    let graph = trip_graph();
    let patch = follow_up_patch();

    let mut group = c.benchmark_group("apply_patch");
    group.throughput(Throughput::Elements(patch.ops.len() as u64));
    group.bench_function("follow_up_turn", |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                let _ = engine.apply_patch(&graph, &patch);
            }
            start.elapsed()
        });
    });
    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let engine = IntentEngine::new(EngineConfig::default()).unwrap();
    let graph = trip_graph();
    let now = Utc::now();
    let prior = engine.reconcile(&graph, &[], &[], now);

    c.bench_function("reconcile/cold", |b| {
        b.iter(|| engine.reconcile(&graph, &[], &[], now));
    });
    c.bench_function("reconcile/with_prior", |b| {
        b.iter(|| engine.reconcile(&graph, &prior.concepts, &prior.motifs, now));
    });
}

criterion_group!(reconcile, bench_apply_patch, bench_reconcile);
criterion_main!(reconcile);
