use super::emitter::{Conversion, EmittedNode, classify, direct_predecessor, register_step_id};
use super::partition::{SubGraph, partition};
use crate::catalog::ModelCatalog;
use crate::error::{CompileError, TopologyViolation};
use crate::graph::{GroupTag, ModelCategory, VisualGraph};
use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;

/// Pre-flight checks run before any step is emitted.
///
/// Every problem found is reported, not only the first one.
pub fn validate(graph: &VisualGraph, catalog: &ModelCatalog) -> Result<(), Vec<CompileError>> {
    let mut errors = Vec::new();

    check_unique_ids(graph, &mut errors);
    check_edge_endpoints(graph, &mut errors);
    check_single_containers(graph, &mut errors);
    check_acyclic(graph, &mut errors);

    // Node-level checks assume a sane topology; they would only add noise otherwise.
    if errors.is_empty() {
        let mut step_ids = Vec::new();
        for group in [GroupTag::Ingest, GroupTag::Search] {
            let sub = partition(&graph.nodes, &graph.edges, group);
            check_group(&sub, group, catalog, &mut step_ids, &mut errors);
        }
        check_step_ids(&step_ids, &mut errors);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn topology(violation: TopologyViolation) -> CompileError {
    CompileError::InvalidGraphTopology(violation)
}

fn check_unique_ids(graph: &VisualGraph, errors: &mut Vec<CompileError>) {
    let mut seen = AHashSet::with_capacity(graph.nodes.len());
    let mut reported = AHashSet::new();
    for node in &graph.nodes {
        if !seen.insert(node.id.as_str()) && reported.insert(node.id.as_str()) {
            errors.push(topology(TopologyViolation::DuplicateNodeId(node.id.clone())));
        }
    }
}

fn check_edge_endpoints(graph: &VisualGraph, errors: &mut Vec<CompileError>) {
    let ids: AHashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    for edge in &graph.edges {
        if !ids.contains(edge.source.as_str()) || !ids.contains(edge.target.as_str()) {
            errors.push(topology(TopologyViolation::DanglingEdge {
                source_id: edge.source.clone(),
                target_id: edge.target.clone(),
            }));
        }
    }
}

fn check_single_containers(graph: &VisualGraph, errors: &mut Vec<CompileError>) {
    for group in [GroupTag::Ingest, GroupTag::Search] {
        let kind = group.container_kind();
        let ids: Vec<String> = graph
            .nodes
            .iter()
            .filter(|n| n.kind == kind)
            .map(|n| n.id.clone())
            .collect();
        if ids.len() > 1 {
            errors.push(topology(TopologyViolation::DuplicateGroup { group, ids }));
        }
    }
}

/// Kahn's algorithm; whatever cannot be scheduled sits on or behind a cycle.
fn check_acyclic(graph: &VisualGraph, errors: &mut Vec<CompileError>) {
    let mut in_degree: AHashMap<&str, usize> =
        graph.nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
    let mut adjacency: AHashMap<&str, Vec<&str>> = AHashMap::new();

    for edge in &graph.edges {
        let (from, to) = (edge.source.as_str(), edge.target.as_str());
        if !in_degree.contains_key(from) {
            continue;
        }
        if let Some(degree) = in_degree.get_mut(to) {
            *degree += 1;
            adjacency.entry(from).or_default().push(to);
        }
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter_map(|(id, degree)| (*degree == 0).then_some(*id))
        .collect();
    while let Some(id) = queue.pop_front() {
        for next in adjacency.get(id).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(next) {
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    queue.push_back(*next);
                }
            }
        }
    }

    let mut stuck: Vec<String> = Vec::new();
    for node in &graph.nodes {
        let blocked = in_degree.get(node.id.as_str()).is_some_and(|d| *d > 0);
        if blocked && !stuck.contains(&node.id) {
            stuck.push(node.id.clone());
        }
    }
    if !stuck.is_empty() {
        errors.push(topology(TopologyViolation::Cycle { node_ids: stuck }));
    }
}

/// Generated register step ids share the namespace of node ids.
fn check_step_ids(step_ids: &[(String, String)], errors: &mut Vec<CompileError>) {
    let mut seen = AHashSet::with_capacity(step_ids.len());
    for (step_id, node_id) in step_ids {
        if !seen.insert(step_id.as_str()) {
            errors.push(topology(TopologyViolation::StepIdClash {
                step_id: step_id.clone(),
                node_id: node_id.clone(),
            }));
        }
    }
}

/// Replays the emission fold without producing steps, collecting the
/// configuration, catalog and predecessor errors it would run into, and
/// the `(step id, node id)` pairs emission would produce, in order.
fn check_group(
    sub: &SubGraph<'_>,
    group: GroupTag,
    catalog: &ModelCatalog,
    step_ids: &mut Vec<(String, String)>,
    errors: &mut Vec<CompileError>,
) {
    let mut emitted: Vec<EmittedNode<'_>> = Vec::new();

    for &node in &sub.nodes {
        let conversion = match classify(node) {
            Ok(conversion) => conversion,
            Err(CompileError::UnsupportedNodeKind { .. }) => continue,
            Err(e) => {
                if group == GroupTag::Ingest {
                    errors.push(e);
                }
                continue;
            }
        };

        match (&conversion, group) {
            (Conversion::Transformer { kind, config }, GroupTag::Ingest) => {
                if config.model.category == ModelCategory::Pretrained {
                    match catalog.find(&config.model.id) {
                        None => errors.push(CompileError::UnknownPretrainedModel {
                            node_id: node.id.clone(),
                            model_id: config.model.id.clone(),
                        }),
                        Some(model) => {
                            if !model.algorithm.serves(*kind) {
                                errors.push(CompileError::InvalidNodeConfig {
                                    node_id: node.id.clone(),
                                    field: "model".to_string(),
                                    message: format!(
                                        "pretrained model '{}' cannot back a {} processor",
                                        model.name,
                                        kind.processor_name()
                                    ),
                                });
                            }
                            step_ids.push((register_step_id(&node.id), node.id.clone()));
                        }
                    }
                }
            }
            (Conversion::Indexer { .. }, GroupTag::Ingest) => {
                match direct_predecessor(node, &emitted, &sub.edges) {
                    None => {
                        errors.push(CompileError::MissingPredecessor {
                            node_id: node.id.clone(),
                        });
                        continue;
                    }
                    Some(p) if !matches!(p.conversion, Conversion::Transformer { .. }) => {
                        errors.push(CompileError::IncompatiblePredecessor {
                            node_id: node.id.clone(),
                            predecessor_id: p.node.id.clone(),
                            message: "an index can only be fed by an ML transformer".to_string(),
                        });
                        continue;
                    }
                    Some(_) => {}
                }
            }
            (Conversion::ResultsTransformer, _) => {}
            // Search-side transformers and indexers are not compiled yet.
            (_, GroupTag::Search) => continue,
        }

        step_ids.push((node.id.clone(), node.id.clone()));
        emitted.push(EmittedNode { node, conversion });
    }
}
