//! Motif mining.
//!
//! Edges between concepts become pair instances; pairs sharing an anchor and
//! relation become triad instances. Instances with the same shape (type,
//! dependency class, source families, anchor family) aggregate into one motif.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::concept::{Concept, ConceptId};
use crate::graph::{Edge, EdgeId, EdgeType, IntentGraph, NodeId};
use crate::slot::{tokenize, SlotFamily};

use super::causal::{causal_formula, causal_operator};
use super::types::{Motif, MotifId, MotifStatus, MotifType, Novelty};

const CJK_NEGATION_MARKERS: &[&str] = &[
    "不要", "不想", "不能", "不用", "不需要", "不坐", "不住", "不去", "不吃", "避免", "别", "拒绝",
];
/// Common words that contain a negation marker but are not negations.
const CJK_NEGATION_EXCEPTIONS: &[&str] = &[
    "特别", "分别", "区别", "差别", "个别", "级别", "类别", "识别", "告别", "别墅",
];
const NEGATION_WORDS: &[&str] = &["no", "not", "avoid", "without", "never"];

/// Returns true if `text` is phrased as a negation.
#[must_use]
pub fn is_negated(text: &str) -> bool {
    let mut lower = text.to_lowercase();
    for word in CJK_NEGATION_EXCEPTIONS {
        lower = lower.replace(word, " ");
    }
    if CJK_NEGATION_MARKERS.iter().any(|m| lower.contains(m)) {
        return true;
    }
    let tokens = tokenize(&lower);
    NEGATION_WORDS.iter().any(|w| tokens.contains(*w))
}

#[derive(Debug, Clone)]
struct Instance<'c> {
    motif_type: MotifType,
    relation: EdgeType,
    sources: Vec<&'c Concept>,
    anchor: &'c Concept,
    edge_ids: Vec<EdgeId>,
    confidence: f64,
}

impl Instance<'_> {
    fn source_families(&self) -> Vec<SlotFamily> {
        let mut families: Vec<_> = self.sources.iter().map(|c| c.family).collect();
        families.sort();
        families
    }

    fn template_key(&self) -> String {
        let families: Vec<_> = self.source_families().iter().map(|f| f.as_str()).collect();
        format!(
            "{}:{}:{}->{}",
            self.motif_type.as_str(),
            self.relation.as_str(),
            families.join("+"),
            self.anchor.family.as_str()
        )
    }

    fn rank_key(&self) -> (Vec<&ConceptId>, &ConceptId) {
        (self.sources.iter().map(|c| &c.id).collect(), &self.anchor.id)
    }
}

fn pair_instances<'c>(graph: &IntentGraph, concepts: &'c [Concept]) -> Vec<Instance<'c>> {
    let mut by_node: HashMap<&NodeId, &Concept> = HashMap::new();
    for concept in concepts.iter().filter(|c| !c.family.is_bookkeeping()) {
        for node in &concept.node_ids {
            by_node.entry(node).or_insert(concept);
        }
    }

    let mut buckets: BTreeMap<(EdgeType, &ConceptId, &ConceptId), (&Concept, &Concept, Vec<&Edge>)> =
        BTreeMap::new();
    for edge in graph.edges() {
        let (Some(from), Some(to)) = (by_node.get(&edge.from), by_node.get(&edge.to)) else {
            continue;
        };
        if from.id == to.id {
            continue;
        }
        buckets
            .entry((edge.edge_type, &from.id, &to.id))
            .or_insert_with(|| (*from, *to, Vec::new()))
            .2
            .push(edge);
    }

    buckets
        .into_iter()
        .map(|((relation, _, _), (from, to, edges))| {
            let avg = edges.iter().map(|e| e.confidence).sum::<f64>() / edges.len() as f64;
            let mut edge_ids: Vec<EdgeId> = edges.iter().map(|e| e.id.clone()).collect();
            edge_ids.sort();
            Instance {
                motif_type: MotifType::Pair,
                relation,
                sources: vec![from],
                anchor: to,
                edge_ids,
                confidence: (0.58 * avg + 0.20 * from.score + 0.22 * to.score).clamp(0.0, 1.0),
            }
        })
        .collect()
}

fn triad_instances<'c>(pairs: &[Instance<'c>]) -> Vec<Instance<'c>> {
    let mut groups: BTreeMap<(&ConceptId, EdgeType), Vec<&Instance<'c>>> = BTreeMap::new();
    for pair in pairs {
        groups.entry((&pair.anchor.id, pair.relation)).or_default().push(pair);
    }

    let mut triads = Vec::new();
    for ((_, relation), mut members) in groups {
        let families: BTreeSet<SlotFamily> = members.iter().map(|p| p.sources[0].family).collect();
        if members.len() < 2 || families.len() < 2 {
            continue;
        }
        members.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.rank_key().cmp(&b.rank_key()))
        });
        let (first, second) = (members[0], members[1]);
        let mut edge_ids: Vec<EdgeId> = first.edge_ids.iter().chain(&second.edge_ids).cloned().collect();
        edge_ids.sort();
        edge_ids.dedup();
        triads.push(Instance {
            motif_type: MotifType::Triad,
            relation,
            sources: vec![first.sources[0], second.sources[0]],
            anchor: first.anchor,
            edge_ids,
            confidence: ((first.confidence + second.confidence + first.anchor.score) / 3.0).clamp(0.0, 1.0),
        });
    }
    triads
}

fn aggregate(template_key: String, mut instances: Vec<Instance<'_>>, graph: &IntentGraph) -> Option<Motif> {
    instances.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.rank_key().cmp(&b.rank_key()))
    });
    let best = instances.first()?;
    let max = best.confidence;
    let mean = instances.iter().map(|i| i.confidence).sum::<f64>() / instances.len() as f64;
    let confidence = (0.68 * max + 0.32 * mean + best.relation.boost()).clamp(0.0, 1.0);

    let support_edge_ids: BTreeSet<EdgeId> = instances.iter().flat_map(|i| i.edge_ids.iter().cloned()).collect();
    let support_node_ids: BTreeSet<NodeId> = graph
        .edges()
        .iter()
        .filter(|e| support_edge_ids.contains(&e.id))
        .flat_map(|e| [e.from.clone(), e.to.clone()])
        .collect();

    let operator = causal_operator(best.relation, best.motif_type);
    let source_titles: Vec<&str> = best.sources.iter().map(|c| c.title.as_str()).collect();
    let mut concept_ids: Vec<ConceptId> = best.sources.iter().map(|c| c.id.clone()).collect();
    concept_ids.push(best.anchor.id.clone());
    let families: Vec<&str> = best.source_families().iter().map(|f| f.as_str()).collect();

    Some(Motif {
        id: MotifId::for_template(&template_key),
        motif_type: best.motif_type,
        relation: best.relation,
        dependency_class: best.relation,
        causal_operator: operator,
        causal_formula: causal_formula(operator, &source_titles, &best.anchor.title),
        concept_ids,
        anchor_concept_id: best.anchor.id.clone(),
        source_families: best.source_families(),
        anchor_family: best.anchor.family,
        negated: best.sources.iter().any(|c| is_negated(&c.title)),
        title: format!(
            "{} {} {}",
            source_titles.join(" + "),
            best.relation.as_str(),
            best.anchor.title
        ),
        description: format!(
            "{} {} pattern {} -> {} over {} instance(s)",
            best.motif_type.as_str(),
            best.relation.as_str(),
            families.join("+"),
            best.anchor.family.as_str(),
            instances.len()
        ),
        template_key,
        confidence,
        support_edge_ids: support_edge_ids.into_iter().collect(),
        support_node_ids: support_node_ids.into_iter().collect(),
        status: MotifStatus::Active,
        status_reason: None,
        resolved: false,
        resolved_by: None,
        history: Vec::new(),
        novelty: Novelty::New,
    })
}

/// Mines motifs from `graph` given its derived `concepts`.
///
/// The result is sorted by id. Lifecycle fields are placeholders until the
/// motifs are reconciled.
#[must_use]
pub fn mine_motifs(graph: &IntentGraph, concepts: &[Concept]) -> Vec<Motif> {
    let pairs = pair_instances(graph, concepts);
    let triads = triad_instances(&pairs);
    tracing::debug!(pairs = pairs.len(), triads = triads.len(), "motif instances mined");

    let mut groups: BTreeMap<String, Vec<Instance<'_>>> = BTreeMap::new();
    for instance in pairs.into_iter().chain(triads) {
        groups.entry(instance.template_key()).or_default().push(instance);
    }

    let mut motifs: Vec<Motif> = groups
        .into_iter()
        .filter_map(|(key, instances)| aggregate(key, instances, graph))
        .collect();
    motifs.sort_by(|a, b| a.id.cmp(&b.id));
    motifs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::derive_concepts;
    use crate::graph::{Node, NodeType};
    use crate::motif::CausalOperator;
    use crate::slot::RuleClassifier;

    fn mine(nodes: Vec<Node>, edges: Vec<Edge>) -> (Vec<Concept>, Vec<Motif>) {
        let graph = IntentGraph::from_parts("g", 1, nodes, edges);
        let concepts = derive_concepts(&graph, &RuleClassifier::new(), 180);
        let motifs = mine_motifs(&graph, &concepts);
        (concepts, motifs)
    }

    #[test]
    fn test_negation() {
        assert!(is_negated("不要红眼航班"));
        assert!(is_negated("avoid night trains"));
        assert!(is_negated("No stairs please"));
        assert!(!is_negated("Notre-Dame visit"));
        assert!(!is_negated("quiet hotel"));

        assert!(is_negated("别坐红眼航班"));
        assert!(is_negated("不想住青旅"));
        assert!(!is_negated("不错的酒店"));
        assert!(!is_negated("离市区不远"));
        assert!(!is_negated("特别想看球"));
        assert!(!is_negated("住海边别墅"));
    }

    #[test]
    fn test_pair_motif() {
        let (concepts, motifs) = mine(
            vec![
                Node::new("g", NodeType::Goal, "Plan a trip"),
                Node::new("b", NodeType::Constraint, "预算1万"),
            ],
            vec![Edge::new("e1", "b", "g", EdgeType::Constraint).with_confidence(0.9)],
        );
        assert_eq!(motifs.len(), 1);
        let m = &motifs[0];
        assert_eq!(m.template_key, "pair:constraint:budget->goal");
        assert_eq!(m.id, MotifId::for_template("pair:constraint:budget->goal"));
        assert_eq!(m.causal_operator, CausalOperator::Confounding);
        assert_eq!(m.causal_formula, "Plan a trip <- 预算1万 -> plan");
        assert_eq!(m.support_edge_ids, vec![EdgeId::from("e1")]);
        assert_eq!(m.support_node_ids.len(), 2);

        let budget = concepts.iter().find(|c| c.family == SlotFamily::Budget).unwrap();
        let goal = concepts.iter().find(|c| c.family == SlotFamily::Goal).unwrap();
        let pair = 0.58 * 0.9 + 0.20 * budget.score + 0.22 * goal.score;
        let expected = (0.68 * pair + 0.32 * pair + 0.03).clamp(0.0, 1.0);
        assert!((m.confidence - expected).abs() < 1e-9);
        assert_eq!(m.concept_ids, vec![budget.id.clone(), goal.id.clone()]);
        assert_eq!(m.anchor_concept_id, goal.id);
    }

    #[test]
    fn test_bookkeeping_concepts_excluded() {
        let (_, motifs) = mine(
            vec![
                Node::new("g", NodeType::Goal, "Plan a trip"),
                Node::new("r", NodeType::Fact, "剩余预算3000"),
            ],
            vec![Edge::new("e1", "r", "g", EdgeType::Constraint)],
        );
        assert!(motifs.is_empty());
    }

    #[test]
    fn test_triad_needs_two_families() {
        let (_, motifs) = mine(
            vec![
                Node::new("g", NodeType::Goal, "Plan a trip"),
                Node::new("d", NodeType::Fact, "目的地：米兰"),
                Node::new("h", NodeType::Preference, "米兰住四星酒店"),
                Node::new("t", NodeType::Preference, "坐高铁"),
            ],
            vec![
                Edge::new("e1", "d", "g", EdgeType::Enable).with_confidence(0.9),
                Edge::new("e2", "h", "g", EdgeType::Enable).with_confidence(0.8),
                Edge::new("e3", "t", "g", EdgeType::Enable).with_confidence(0.7),
            ],
        );
        let triads: Vec<_> = motifs.iter().filter(|m| m.motif_type == MotifType::Triad).collect();
        assert_eq!(triads.len(), 1);
        assert_eq!(triads[0].causal_operator, CausalOperator::MediatedCausation);
        assert_eq!(triads[0].concept_ids.len(), 3);
        assert_eq!(triads[0].support_edge_ids.len(), 2);
        assert_eq!(motifs.iter().filter(|m| m.motif_type == MotifType::Pair).count(), 3);
    }

    #[test]
    fn test_instances_aggregate_by_shape() {
        let (_, motifs) = mine(
            vec![
                Node::new("g", NodeType::Goal, "Plan a trip"),
                Node::new("m", NodeType::Fact, "目的地：米兰"),
                Node::new("r", NodeType::Fact, "目的地：罗马"),
            ],
            vec![
                Edge::new("e1", "m", "g", EdgeType::Enable),
                Edge::new("e2", "r", "g", EdgeType::Enable),
            ],
        );
        assert_eq!(motifs.len(), 1);
        assert_eq!(motifs[0].template_key, "pair:enable:destination->goal");
        assert_eq!(motifs[0].support_edge_ids.len(), 2);
        assert_eq!(motifs[0].support_node_ids.len(), 3);
    }

    #[test]
    fn test_same_concept_edges_ignored() {
        let (_, motifs) = mine(
            vec![
                Node::new("a", NodeType::Fact, "目的地：米兰"),
                Node::new("b", NodeType::Fact, "目的地：米兰"),
            ],
            vec![Edge::new("e1", "a", "b", EdgeType::Enable)],
        );
        assert!(motifs.is_empty());
    }
}
