use crate::graph::{Capability, VisualEdge, VisualNode};
use crate::template::TemplateEdge;
use ahash::AHashSet;

/// Maps canvas edges to template edges.
///
/// Edges touching a document placeholder have no backend counterpart and are
/// dropped. An endpoint counts as a document when either the edge's own tags or
/// the node it points at say so, since canonical graphs may leave edge tags empty.
pub struct Linker<'a> {
    documents: AHashSet<&'a str>,
}

impl<'a> Linker<'a> {
    pub fn new(nodes: &'a [VisualNode]) -> Self {
        let documents = nodes
            .iter()
            .filter(|n| n.has_capability(&Capability::Document))
            .map(|n| n.id.as_str())
            .collect();
        Self { documents }
    }

    pub fn is_document_edge(&self, edge: &VisualEdge) -> bool {
        edge.touches_document()
            || self.documents.contains(edge.source.as_str())
            || self.documents.contains(edge.target.as_str())
    }

    pub fn to_template_edge(&self, edge: &VisualEdge) -> Option<TemplateEdge> {
        (!self.is_document_edge(edge)).then(|| TemplateEdge {
            source: edge.source.clone(),
            dest: edge.target.clone(),
        })
    }

    /// Links every edge in order. No dedup and no cycle check happen here.
    pub fn link<'e>(&self, edges: impl IntoIterator<Item = &'e VisualEdge>) -> Vec<TemplateEdge> {
        edges
            .into_iter()
            .filter_map(|edge| self.to_template_edge(edge))
            .collect()
    }
}
