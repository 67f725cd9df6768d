use crate::graph::{GroupTag, VisualEdge, VisualNode};
use ahash::AHashSet;

/// The members of one group container and every edge touching them.
#[derive(Debug, Default)]
pub struct SubGraph<'a> {
    pub nodes: Vec<&'a VisualNode>,
    pub edges: Vec<&'a VisualEdge>,
}

/// Splits out the nodes parented by the container of `group`, in input order.
///
/// A graph without such a container yields an empty sub-graph. Only the first
/// container is considered; duplicates are rejected earlier by validation.
pub fn partition<'a>(
    nodes: &'a [VisualNode],
    edges: &'a [VisualEdge],
    group: GroupTag,
) -> SubGraph<'a> {
    let container_kind = group.container_kind();
    let Some(parent_id) = nodes
        .iter()
        .find(|n| n.kind == container_kind)
        .map(|n| n.id.as_str())
    else {
        return SubGraph::default();
    };

    let members: Vec<&VisualNode> = nodes
        .iter()
        .filter(|n| n.parent_group_id.as_deref() == Some(parent_id))
        .collect();
    let member_ids: AHashSet<&str> = members.iter().map(|n| n.id.as_str()).collect();
    let edges = edges
        .iter()
        .filter(|e| {
            member_ids.contains(e.source.as_str()) || member_ids.contains(e.target.as_str())
        })
        .collect();

    SubGraph {
        nodes: members,
        edges,
    }
}
