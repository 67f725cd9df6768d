use crate::graph::TransformerKind;
use serde::{Deserialize, Serialize};

/// Static metadata of a model that can be registered in one click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PretrainedModel {
    /// Fully qualified name, e.g. `huggingface/sentence-transformers/all-mpnet-base-v2`.
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub format: String,
    pub version: String,
    pub algorithm: ModelAlgorithm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelAlgorithm {
    TextEmbedding,
    SparseEncoding,
    SparseTokenize,
}

impl ModelAlgorithm {
    /// Whether a model of this algorithm can back the given transformer.
    pub fn serves(self, kind: TransformerKind) -> bool {
        match kind {
            TransformerKind::TextEmbedding => self == ModelAlgorithm::TextEmbedding,
            TransformerKind::SparseEncoding => self != ModelAlgorithm::TextEmbedding,
        }
    }
}

/// The set of pretrained models available for registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCatalog {
    models: Vec<PretrainedModel>,
}

impl ModelCatalog {
    pub fn empty() -> Self {
        Self { models: Vec::new() }
    }

    pub fn with_model(mut self, model: PretrainedModel) -> Self {
        self.models.retain(|m| m.name != model.name);
        self.models.push(model);
        self
    }

    /// Finds a model by its fully qualified name, falling back to its short name.
    pub fn find(&self, id: &str) -> Option<&PretrainedModel> {
        self.models
            .iter()
            .find(|m| m.name == id)
            .or_else(|| self.models.iter().find(|m| m.short_name == id))
    }

    pub fn models(&self) -> &[PretrainedModel] {
        &self.models
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        BUILTIN_MODELS
            .iter()
            .fold(Self::empty(), |catalog, (name, description, version, algorithm)| {
                let short_name = name.rsplit('/').next().unwrap_or_default();
                catalog.with_model(PretrainedModel {
                    name: name.to_string(),
                    short_name: short_name.to_string(),
                    description: description.to_string(),
                    format: "TORCH_SCRIPT".to_string(),
                    version: version.to_string(),
                    algorithm: *algorithm,
                })
            })
    }
}

// (name, description, version, algorithm)
const BUILTIN_MODELS: &[(&str, &str, &str, ModelAlgorithm)] = &[
    (
        "huggingface/sentence-transformers/all-distilroberta-v1",
        "A sentence transformer from Hugging Face",
        "1.0.1",
        ModelAlgorithm::TextEmbedding,
    ),
    (
        "huggingface/sentence-transformers/all-mpnet-base-v2",
        "A sentence transformer from Hugging Face",
        "1.0.1",
        ModelAlgorithm::TextEmbedding,
    ),
    (
        "huggingface/sentence-transformers/msmarco-distilbert-base-tas-b",
        "A sentence transformer from Hugging Face",
        "1.0.2",
        ModelAlgorithm::TextEmbedding,
    ),
    (
        "amazon/neural-sparse/opensearch-neural-sparse-encoding-v1",
        "A neural sparse encoding model",
        "1.0.1",
        ModelAlgorithm::SparseEncoding,
    ),
    (
        "amazon/neural-sparse/opensearch-neural-sparse-encoding-doc-v1",
        "A neural sparse encoding model",
        "1.0.1",
        ModelAlgorithm::SparseEncoding,
    ),
    (
        "amazon/neural-sparse/opensearch-neural-sparse-tokenizer-v1",
        "A neural sparse tokenizer model",
        "1.0.1",
        ModelAlgorithm::SparseTokenize,
    ),
];
