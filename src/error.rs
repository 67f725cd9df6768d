use crate::graph::GroupTag;
use thiserror::Error;

/// Errors that can occur while compiling a visual graph into templates.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Node '{node_id}' of kind '{kind}' has no matching conversion rule")]
    UnsupportedNodeKind { node_id: String, kind: String },

    #[error("Node '{node_id}' requires a connected upstream node, but none was emitted before it")]
    MissingPredecessor { node_id: String },

    #[error(
        "Node '{node_id}' is connected to '{predecessor_id}', which cannot feed it: {message}"
    )]
    IncompatiblePredecessor {
        node_id: String,
        predecessor_id: String,
        message: String,
    },

    #[error("Node '{node_id}' selects pretrained model '{model_id}', which is not in the catalog")]
    UnknownPretrainedModel { node_id: String, model_id: String },

    #[error("Invalid graph topology: {0}")]
    InvalidGraphTopology(TopologyViolation),

    #[error("Node '{node_id}' has an invalid value for '{field}': {message}")]
    InvalidNodeConfig {
        node_id: String,
        field: String,
        message: String,
    },

    #[error("Step '{step_id}' is inconsistent: {message}")]
    InconsistentTemplate { step_id: String, message: String },

    #[error("Workflow validation failed with {} error(s)", .errors.len())]
    Validation { errors: Vec<CompileError> },
}

impl CompileError {
    /// Flattens nested validation failures into the individual errors.
    pub fn errors(&self) -> Vec<&CompileError> {
        match self {
            CompileError::Validation { errors } => {
                errors.iter().flat_map(CompileError::errors).collect()
            }
            other => vec![other],
        }
    }
}

/// Structural problems with the graph itself, independent of node configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TopologyViolation {
    #[error("node id '{0}' is used more than once")]
    DuplicateNodeId(String),

    #[error("edge '{source_id}' -> '{target_id}' references an unknown node")]
    DanglingEdge {
        source_id: String,
        target_id: String,
    },

    #[error("found {} containers for the {group} group: {}", .ids.len(), .ids.join(", "))]
    DuplicateGroup { group: GroupTag, ids: Vec<String> },

    #[error(
        "the graph contains a cycle; these nodes cannot be ordered: {}",
        .node_ids.join(", ")
    )]
    Cycle { node_ids: Vec<String> },

    #[error("step id '{step_id}' produced for node '{node_id}' is already taken by another step")]
    StepIdClash { step_id: String, node_id: String },
}

/// Errors that can occur when converting a custom canvas format into a `VisualGraph`.
#[derive(Error, Debug, Clone)]
pub enum GraphConversionError {
    #[error("Failed to parse canvas JSON: {0}")]
    JsonParseError(String),

    #[error("Invalid canvas data: {0}")]
    ValidationError(String),
}
