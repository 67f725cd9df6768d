use super::definition::{ComponentKind, VisualNode};
use crate::error::CompileError;
use serde::{Deserialize, Serialize};

/// Where the model used by a transformer comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelCategory {
    /// Already registered and deployed by the user; referenced by id.
    Deployed,
    /// Picked from the pretrained catalog; registered as part of provisioning.
    Pretrained,
}

/// The `model` form value of a transformer node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSelection {
    pub id: String,
    pub category: ModelCategory,
}

/// The ML processor a transformer node turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformerKind {
    TextEmbedding,
    SparseEncoding,
}

impl TransformerKind {
    pub fn from_component(kind: &ComponentKind) -> Option<Self> {
        match kind {
            ComponentKind::TextEmbeddingTransformer => Some(TransformerKind::TextEmbedding),
            ComponentKind::SparseEncoderTransformer => Some(TransformerKind::SparseEncoding),
            _ => None,
        }
    }

    /// Form key holding the field the processor writes to.
    pub fn output_key(self) -> &'static str {
        match self {
            TransformerKind::TextEmbedding => "vectorField",
            TransformerKind::SparseEncoding => "outputField",
        }
    }

    /// Name of the ingest processor in the pipeline body.
    pub fn processor_name(self) -> &'static str {
        match self {
            TransformerKind::TextEmbedding => "text_embedding",
            TransformerKind::SparseEncoding => "sparse_encoding",
        }
    }

    pub fn pipeline_description(self) -> &'static str {
        match self {
            TransformerKind::TextEmbedding => "An ingest pipeline with a text embedding processor.",
            TransformerKind::SparseEncoding => {
                "An ingest pipeline with a neural sparse encoding processor."
            }
        }
    }
}

/// Typed form values of an ML transformer node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformerConfig {
    pub model: ModelSelection,
    pub input_field: String,
    pub output_field: String,
}

impl TransformerConfig {
    pub const MODEL_KEY: &'static str = "model";
    pub const INPUT_KEY: &'static str = "inputField";

    pub fn from_node(node: &VisualNode, kind: TransformerKind) -> Result<Self, CompileError> {
        Ok(Self {
            model: typed_value(node, Self::MODEL_KEY)?,
            input_field: string_value(node, Self::INPUT_KEY)?,
            output_field: string_value(node, kind.output_key())?,
        })
    }
}

/// Typed form values of an indexer node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerConfig {
    pub index_name: String,
}

impl IndexerConfig {
    pub const INDEX_NAME_KEY: &'static str = "indexName";

    pub fn from_node(node: &VisualNode) -> Result<Self, CompileError> {
        Ok(Self {
            index_name: string_value(node, Self::INDEX_NAME_KEY)?,
        })
    }
}

fn raw_value<'a>(node: &'a VisualNode, key: &str) -> Result<&'a serde_json::Value, CompileError> {
    node.config
        .get(key)
        .filter(|value| !value.is_null())
        .ok_or_else(|| invalid(node, key, "value is missing"))
}

fn string_value(node: &VisualNode, key: &str) -> Result<String, CompileError> {
    let Some(s) = raw_value(node, key)?.as_str() else {
        return Err(invalid(node, key, "expected a string"));
    };
    if s.trim().is_empty() {
        Err(invalid(node, key, "value is empty"))
    } else if s.trim() != s {
        Err(invalid(node, key, "value has leading or trailing whitespace"))
    } else {
        Ok(s.to_string())
    }
}

fn typed_value<T: for<'de> Deserialize<'de>>(
    node: &VisualNode,
    key: &str,
) -> Result<T, CompileError> {
    serde_json::from_value(raw_value(node, key)?.clone())
        .map_err(|e| invalid(node, key, &e.to_string()))
}

fn invalid(node: &VisualNode, key: &str, message: &str) -> CompileError {
    CompileError::InvalidNodeConfig {
        node_id: node.id.clone(),
        field: key.to_string(),
        message: message.to_string(),
    }
}
