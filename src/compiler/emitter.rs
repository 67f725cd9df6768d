use super::ids::IdGenerator;
use crate::catalog::{ModelCatalog, PretrainedModel};
use crate::error::CompileError;
use crate::graph::{
    Capability, IndexerConfig, ModelCategory, TransformerConfig, TransformerKind, VisualEdge,
    VisualNode,
};
use crate::template::{InputValue, StepReference, StepType, TemplateStep};
use itertools::Itertools;
use serde_json::json;
use tracing::{debug, warn};

pub const DEFAULT_KNN_DIMENSION: usize = 768;

const NORMALIZATION_TECHNIQUE: &str = "min_max";
const COMBINATION_TECHNIQUE: &str = "arithmetic_mean";
const COMBINATION_WEIGHTS: [f64; 2] = [0.3, 0.7];

/// The conversion rule a node falls under, carrying its typed configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    Transformer {
        kind: TransformerKind,
        config: TransformerConfig,
    },
    Indexer {
        config: IndexerConfig,
    },
    ResultsTransformer,
}

/// Picks the conversion rule for a node from its declared capabilities.
///
/// Nodes without a rule fail with `UnsupportedNodeKind`, which callers
/// recover from by skipping the node.
pub fn classify(node: &VisualNode) -> Result<Conversion, CompileError> {
    if node.has_capability(&Capability::MlTransformer) {
        let kind = TransformerKind::from_component(&node.kind).ok_or_else(|| unsupported(node))?;
        let config = TransformerConfig::from_node(node, kind)?;
        Ok(Conversion::Transformer { kind, config })
    } else if node.has_capability(&Capability::Indexer) {
        let config = IndexerConfig::from_node(node)?;
        Ok(Conversion::Indexer { config })
    } else if node.has_capability(&Capability::ResultsTransformer) {
        Ok(Conversion::ResultsTransformer)
    } else {
        Err(unsupported(node))
    }
}

fn unsupported(node: &VisualNode) -> CompileError {
    CompileError::UnsupportedNodeKind {
        node_id: node.id.clone(),
        kind: node.kind.to_string(),
    }
}

/// A node that produced at least one step, kept for predecessor lookups.
#[derive(Debug, Clone)]
pub struct EmittedNode<'a> {
    pub node: &'a VisualNode,
    pub conversion: Conversion,
}

impl EmittedNode<'_> {
    /// The step later nodes consume outputs from; always the one named after the node.
    pub fn output_step_id(&self) -> &str {
        &self.node.id
    }
}

/// Finds the first already-emitted node with an edge into `node`.
///
/// Fan-in is not supported: extra connected predecessors are ignored.
pub fn direct_predecessor<'p, 'a>(
    node: &VisualNode,
    previously_emitted: &'p [EmittedNode<'a>],
    edges: &[&VisualEdge],
) -> Option<&'p EmittedNode<'a>> {
    let incoming: Vec<&str> = edges
        .iter()
        .filter(|e| e.target == node.id)
        .map(|e| e.source.as_str())
        .collect();
    let mut connected = previously_emitted
        .iter()
        .filter(|p| incoming.contains(&p.node.id.as_str()));

    let first = connected.next()?;
    let ignored = connected.count();
    if ignored > 0 {
        warn!(
            node_id = %node.id,
            predecessor = %first.node.id,
            ignored,
            "node has several connected predecessors, only the first is used"
        );
    }
    Some(first)
}

/// Turns classified nodes into backend steps.
pub struct StepEmitter<'c> {
    catalog: &'c ModelCatalog,
    ids: &'c mut dyn IdGenerator,
    knn_dimension: usize,
}

impl<'c> StepEmitter<'c> {
    pub fn new(catalog: &'c ModelCatalog, ids: &'c mut dyn IdGenerator, knn_dimension: usize) -> Self {
        Self {
            catalog,
            ids,
            knn_dimension,
        }
    }

    /// Classifies `node` and emits its steps.
    ///
    /// Returns `Ok(None)` when the node contributes nothing to the template.
    pub fn to_steps<'a>(
        &mut self,
        node: &'a VisualNode,
        previously_emitted: &[EmittedNode<'a>],
        edges: &[&VisualEdge],
    ) -> Result<Option<(EmittedNode<'a>, Vec<TemplateStep>)>, CompileError> {
        let conversion = match classify(node) {
            Ok(conversion) => conversion,
            Err(CompileError::UnsupportedNodeKind { node_id, kind }) => {
                debug!(%node_id, %kind, "skipping node without a conversion rule");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let steps = self.emit(node, &conversion, previously_emitted, edges)?;
        let step_types = steps.iter().map(|s| s.step_type).join(",");
        debug!(node_id = %node.id, steps = %step_types, "emitted steps");
        Ok(Some((EmittedNode { node, conversion }, steps)))
    }

    pub fn emit(
        &mut self,
        node: &VisualNode,
        conversion: &Conversion,
        previously_emitted: &[EmittedNode<'_>],
        edges: &[&VisualEdge],
    ) -> Result<Vec<TemplateStep>, CompileError> {
        match conversion {
            Conversion::Transformer { kind, config } => self.transformer_steps(node, *kind, config),
            Conversion::Indexer { config } => self
                .indexer_step(node, config, previously_emitted, edges)
                .map(|step| vec![step]),
            Conversion::ResultsTransformer => Ok(vec![self.search_pipeline_step(node)]),
        }
    }

    fn transformer_steps(
        &mut self,
        node: &VisualNode,
        kind: TransformerKind,
        config: &TransformerConfig,
    ) -> Result<Vec<TemplateStep>, CompileError> {
        let mut steps = Vec::with_capacity(2);

        let model_id = match config.model.category {
            ModelCategory::Pretrained => {
                let model = self.catalog.find(&config.model.id).ok_or_else(|| {
                    CompileError::UnknownPretrainedModel {
                        node_id: node.id.clone(),
                        model_id: config.model.id.clone(),
                    }
                })?;
                let register = register_model_step(node, model);
                let model_ref = StepReference::new(&register.id, "model_id");
                steps.push(register);
                InputValue::Reference(model_ref)
            }
            ModelCategory::Deployed => InputValue::from(config.model.id.as_str()),
        };

        let field_map = InputValue::object([(
            config.input_field.as_str(),
            config.output_field.as_str(),
        )]);
        let processor = InputValue::object([(
            kind.processor_name(),
            InputValue::object([("model_id", model_id.clone()), ("field_map", field_map)]),
        )]);

        let mut pipeline = TemplateStep::new(&node.id, StepType::CreateIngestPipeline)
            .with_input("pipeline_id", self.ids.generate("ingest_pipeline"))
            .with_input("model_id", model_id.clone())
            .with_input("input_field", config.input_field.as_str())
            .with_input("output_field", config.output_field.as_str())
            .with_input(
                "configurations",
                InputValue::object([
                    ("description", InputValue::from(kind.pipeline_description())),
                    ("processors", InputValue::list([processor])),
                ]),
            );
        if let Some(model_ref) = model_id.as_reference() {
            pipeline = pipeline.with_dependency(model_ref);
        }
        steps.push(pipeline);

        Ok(steps)
    }

    fn indexer_step(
        &self,
        node: &VisualNode,
        config: &IndexerConfig,
        previously_emitted: &[EmittedNode<'_>],
        edges: &[&VisualEdge],
    ) -> Result<TemplateStep, CompileError> {
        let predecessor = direct_predecessor(node, previously_emitted, edges).ok_or_else(|| {
            CompileError::MissingPredecessor {
                node_id: node.id.clone(),
            }
        })?;
        let Conversion::Transformer {
            kind,
            config: upstream,
        } = &predecessor.conversion
        else {
            return Err(CompileError::IncompatiblePredecessor {
                node_id: node.id.clone(),
                predecessor_id: predecessor.node.id.clone(),
                message: "an index can only be fed by an ML transformer".to_string(),
            });
        };

        let output_mapping = match kind {
            TransformerKind::TextEmbedding => json!({
                "type": "knn_vector",
                "dimension": self.knn_dimension,
                "method": {
                    "name": "hnsw",
                    "engine": "lucene",
                    "space_type": "l2",
                    "parameters": {},
                },
            }),
            TransformerKind::SparseEncoding => json!({ "type": "rank_features" }),
        };
        let mut properties = serde_json::Map::new();
        properties.insert(upstream.input_field.clone(), json!({ "type": "text" }));
        properties.insert(upstream.output_field.clone(), output_mapping);

        let pipeline_ref = StepReference::new(predecessor.output_step_id(), "pipeline_id");
        Ok(TemplateStep::new(&node.id, StepType::CreateIndex)
            .with_input("index_name", config.index_name.as_str())
            .with_input(
                "configurations",
                InputValue::object([
                    (
                        "settings",
                        InputValue::object([("default_pipeline", pipeline_ref.clone())]),
                    ),
                    (
                        "mappings",
                        InputValue::Literal(json!({ "properties": properties })),
                    ),
                ]),
            )
            .with_dependency(&pipeline_ref))
    }

    fn search_pipeline_step(&mut self, node: &VisualNode) -> TemplateStep {
        // Weights and techniques are fixed until the results transformer form exposes them.
        let processor = json!({
            "normalization-processor": {
                "normalization": { "technique": NORMALIZATION_TECHNIQUE },
                "combination": {
                    "technique": COMBINATION_TECHNIQUE,
                    "parameters": { "weights": COMBINATION_WEIGHTS },
                },
            }
        });
        TemplateStep::new(&node.id, StepType::CreateSearchPipeline)
            .with_input("pipeline_id", self.ids.generate("search_pipeline"))
            .with_input(
                "configurations",
                InputValue::Literal(json!({ "phase_results_processors": [processor] })),
            )
    }
}

/// Id of the model registration step emitted ahead of a pretrained transformer.
pub fn register_step_id(node_id: &str) -> String {
    format!("{}_register_model", node_id)
}

fn register_model_step(node: &VisualNode, model: &PretrainedModel) -> TemplateStep {
    TemplateStep::new(register_step_id(&node.id), StepType::RegisterPretrainedModel)
    .with_input("name", model.name.as_str())
    .with_input("description", model.description.as_str())
    .with_input("model_format", model.format.as_str())
    .with_input("version", model.version.as_str())
    .with_input("deploy", true)
}
