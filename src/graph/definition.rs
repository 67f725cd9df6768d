use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Flat key/value map of user-entered form values for a single node.
pub type ConfigValues = AHashMap<String, serde_json::Value>;

/// The complete, canonical visual graph, ready for compilation.
/// This is the target structure for any custom canvas format conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisualGraph {
    pub nodes: Vec<VisualNode>,
    #[serde(default)]
    pub edges: Vec<VisualEdge>,
}

/// A single component instance dropped on the canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_group_id: Option<String>,
    pub kind: ComponentKind,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub config: ConfigValues,
}

impl VisualNode {
    pub fn new(id: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            id: id.into(),
            parent_group_id: None,
            kind,
            capabilities: Vec::new(),
            config: ConfigValues::new(),
        }
    }

    pub fn in_group(mut self, parent_group_id: impl Into<String>) -> Self {
        self.parent_group_id = Some(parent_group_id.into());
        self
    }

    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.capabilities.extend(capabilities);
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    pub fn has_capability(&self, capability: &Capability) -> bool {
        self.capabilities.contains(capability)
    }
}

/// A directed connection between two nodes, carrying the capability tags of both ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualEdge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub source_capabilities: Vec<Capability>,
    #[serde(default)]
    pub target_capabilities: Vec<Capability>,
}

impl VisualEdge {
    /// Creates an edge between two nodes, copying their capability tags.
    pub fn between(source: &VisualNode, target: &VisualNode) -> Self {
        Self {
            source: source.id.clone(),
            target: target.id.clone(),
            source_capabilities: source.capabilities.clone(),
            target_capabilities: target.capabilities.clone(),
        }
    }

    /// Whether either endpoint is a UI-only document placeholder.
    pub fn touches_document(&self) -> bool {
        self.source_capabilities.contains(&Capability::Document)
            || self.target_capabilities.contains(&Capability::Document)
    }
}

/// The two logical sub-workflows a canvas is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupTag {
    Ingest,
    Search,
}

impl GroupTag {
    /// The component kind of the container node holding this group's members.
    pub fn container_kind(self) -> ComponentKind {
        match self {
            GroupTag::Ingest => ComponentKind::IngestGroup,
            GroupTag::Search => ComponentKind::SearchGroup,
        }
    }
}

impl fmt::Display for GroupTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupTag::Ingest => write!(f, "ingest"),
            GroupTag::Search => write!(f, "search"),
        }
    }
}

/// Generates a closed string-tagged enum with a catch-all `Custom` variant,
/// plus its string conversions and serde bridging.
macro_rules! string_tagged_enum {
    ( $(#[$meta:meta])* $name:ident { $( $variant:ident => $tag:literal ),* $(,)? } ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $( $variant, )*
            Custom(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $( $name::$variant => $tag, )*
                    $name::Custom(tag) => tag,
                }
            }
        }

        impl From<&str> for $name {
            fn from(tag: &str) -> Self {
                match tag {
                    $( $tag => $name::$variant, )*
                    other => $name::Custom(other.to_string()),
                }
            }
        }

        impl From<String> for $name {
            fn from(tag: String) -> Self {
                $name::from(tag.as_str())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_tagged_enum! {
    /// The concrete component type of a node.
    ComponentKind {
        IngestGroup => "ingest_group",
        SearchGroup => "search_group",
        Document => "document",
        TextEmbeddingTransformer => "text_embedding_transformer",
        SparseEncoderTransformer => "sparse_encoder_transformer",
        KnnIndexer => "knn_indexer",
        NeuralQuery => "neural_query",
        MatchQuery => "match_query",
        NormalizationTransformer => "normalization_transformer",
        Results => "results",
    }
}

string_tagged_enum! {
    /// A labeled role a node declares, used to select its conversion rule.
    Capability {
        Document => "document",
        Transformer => "transformer",
        MlTransformer => "ml_transformer",
        TextEmbeddingTransformer => "text_embedding_transformer",
        SparseEncoderTransformer => "sparse_encoder_transformer",
        Indexer => "indexer",
        KnnIndexer => "knn_indexer",
        Query => "query",
        NeuralQuery => "neural_query",
        MatchQuery => "match_query",
        ResultsTransformer => "results_transformer",
        NormalizationTransformer => "normalization_transformer",
        Results => "results",
    }
}

impl ComponentKind {
    /// The capability tags a component of this kind declares on the canvas.
    pub fn default_capabilities(&self) -> Vec<Capability> {
        use Capability as C;
        match self {
            ComponentKind::Document => vec![C::Document],
            ComponentKind::TextEmbeddingTransformer => vec![
                C::Transformer,
                C::MlTransformer,
                C::TextEmbeddingTransformer,
            ],
            ComponentKind::SparseEncoderTransformer => vec![
                C::Transformer,
                C::MlTransformer,
                C::SparseEncoderTransformer,
            ],
            ComponentKind::KnnIndexer => vec![C::Indexer, C::KnnIndexer],
            ComponentKind::NeuralQuery => vec![C::Query, C::NeuralQuery],
            ComponentKind::MatchQuery => vec![C::Query, C::MatchQuery],
            ComponentKind::NormalizationTransformer => vec![
                C::Transformer,
                C::ResultsTransformer,
                C::NormalizationTransformer,
            ],
            ComponentKind::Results => vec![C::Results],
            ComponentKind::IngestGroup | ComponentKind::SearchGroup | ComponentKind::Custom(_) => {
                Vec::new()
            }
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, ComponentKind::IngestGroup | ComponentKind::SearchGroup)
    }
}
