use crate::error::GraphConversionError;
use crate::graph::{
    Capability, ComponentKind, ConfigValues, IntoGraph, VisualEdge, VisualGraph, VisualNode,
};
use ahash::{AHashMap, AHashSet};
use serde::Deserialize;

const INGEST_GROUP_TYPE: &str = "ingestGroup";
const SEARCH_GROUP_TYPE: &str = "searchGroup";

/// A single form input of a canvas component
#[derive(Debug, Deserialize, Clone)]
pub struct UiInput {
    pub id: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// Component data attached to a canvas node
#[derive(Debug, Deserialize, Clone, Default)]
pub struct UiNodeData {
    #[serde(rename = "type")]
    pub component_type: Option<String>,
    #[serde(default, alias = "baseClasses")]
    pub base_classes: Vec<String>,
    #[serde(default)]
    pub inputs: Vec<UiInput>,
}

/// Canvas node; group containers carry no component data
#[derive(Debug, Deserialize, Clone)]
pub struct UiNode {
    pub id: String,
    #[serde(rename = "type", default)]
    pub node_type: Option<String>,
    #[serde(default, alias = "parentNode", alias = "parentId")]
    pub parent_node: Option<String>,
    #[serde(default)]
    pub data: UiNodeData,
}

/// Canvas edge connecting two nodes
#[derive(Debug, Deserialize, Clone)]
pub struct UiEdge {
    pub source: String,
    pub target: String,
    #[serde(default, alias = "sourceClasses")]
    pub source_classes: Vec<String>,
    #[serde(default, alias = "targetClasses")]
    pub target_classes: Vec<String>,
}

/// Complete canvas export
#[derive(Debug, Deserialize, Clone)]
pub struct UiWorkflow {
    pub nodes: Vec<UiNode>,
    #[serde(default)]
    pub edges: Vec<UiEdge>,
}

impl UiWorkflow {
    pub fn from_json(json: &str) -> Result<Self, GraphConversionError> {
        serde_json::from_str(json).map_err(|e| GraphConversionError::JsonParseError(e.to_string()))
    }
}

impl UiNode {
    fn kind(&self) -> Result<ComponentKind, GraphConversionError> {
        match self.node_type.as_deref() {
            Some(INGEST_GROUP_TYPE) => Ok(ComponentKind::IngestGroup),
            Some(SEARCH_GROUP_TYPE) => Ok(ComponentKind::SearchGroup),
            _ => self
                .data
                .component_type
                .as_deref()
                .map(ComponentKind::from)
                .ok_or_else(|| {
                    GraphConversionError::ValidationError(format!(
                        "node '{}' has neither a group type nor a component type",
                        self.id
                    ))
                }),
        }
    }
}

fn capabilities(tags: &[String]) -> Vec<Capability> {
    tags.iter().map(|t| Capability::from(t.as_str())).collect()
}

impl IntoGraph for UiWorkflow {
    fn into_graph(self) -> Result<VisualGraph, GraphConversionError> {
        let mut seen = AHashSet::new();
        let mut nodes = Vec::with_capacity(self.nodes.len());

        for ui_node in self.nodes {
            if !seen.insert(ui_node.id.clone()) {
                return Err(GraphConversionError::ValidationError(format!(
                    "node id '{}' appears more than once",
                    ui_node.id
                )));
            }
            let kind = ui_node.kind()?;
            let declared = capabilities(&ui_node.data.base_classes);
            let tags = if declared.is_empty() {
                kind.default_capabilities()
            } else {
                declared
            };
            let config: ConfigValues = ui_node
                .data
                .inputs
                .into_iter()
                .filter_map(|input| input.value.map(|value| (input.id, value)))
                .collect();

            nodes.push(VisualNode {
                id: ui_node.id,
                parent_group_id: ui_node.parent_node,
                kind,
                capabilities: tags,
                config,
            });
        }

        // Older exports omit the endpoint classes; fall back to the nodes' own tags.
        let node_tags: AHashMap<&str, &[Capability]> = nodes
            .iter()
            .map(|n: &VisualNode| (n.id.as_str(), n.capabilities.as_slice()))
            .collect();
        let endpoint_tags = |classes: &[String], id: &str| {
            if classes.is_empty() {
                node_tags.get(id).map(|tags| tags.to_vec()).unwrap_or_default()
            } else {
                capabilities(classes)
            }
        };
        let edges = self
            .edges
            .into_iter()
            .map(|e| VisualEdge {
                source_capabilities: endpoint_tags(&e.source_classes, &e.source),
                target_capabilities: endpoint_tags(&e.target_classes, &e.target),
                source: e.source,
                target: e.target,
            })
            .collect();

        Ok(VisualGraph { nodes, edges })
    }
}
