use crate::catalog::{ModelCatalog, PretrainedModel};
use crate::error::CompileError;
use crate::graph::{GroupTag, VisualGraph};
use crate::template::{
    PROVISION_WORKFLOW, Template, TemplateFlows, TemplateStep, TemplateVersion, WorkflowDocument,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

mod emitter;
mod ids;
mod linker;
mod partition;
mod validation;

pub use emitter::{
    Conversion, DEFAULT_KNN_DIMENSION, EmittedNode, StepEmitter, classify, direct_predecessor,
    register_step_id,
};
pub use ids::{IdGenerator, IdStrategy, RandomIdGenerator, SequentialIdGenerator};
pub use linker::Linker;
pub use partition::{SubGraph, partition};
pub use validation::validate;

/// Tunables of a compiler instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Dimension of `knn_vector` fields created for text embeddings.
    pub knn_dimension: usize,
    pub id_strategy: IdStrategy,
    /// Template format version written into workflow documents.
    pub template_version: String,
    /// Backend versions the emitted template is known to work with.
    pub compatibility: Vec<String>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            knn_dimension: DEFAULT_KNN_DIMENSION,
            id_strategy: IdStrategy::Random,
            template_version: "1.0.0".to_string(),
            compatibility: vec!["2.12.0".to_string(), "3.0.0".to_string()],
        }
    }
}

/// Compiles a `VisualGraph` into backend provisioning templates.
///
/// A compiler holds no state between calls: every `compile` validates the
/// graph and builds a fresh template map.
pub struct Compiler {
    graph: VisualGraph,
    catalog: ModelCatalog,
    options: CompilerOptions,
}

pub struct CompilerBuilder {
    graph: VisualGraph,
    catalog: ModelCatalog,
    options: CompilerOptions,
}

impl CompilerBuilder {
    pub fn new(graph: VisualGraph) -> Self {
        Self {
            graph,
            catalog: ModelCatalog::default(),
            options: CompilerOptions::default(),
        }
    }
    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }
    pub fn with_catalog(mut self, catalog: ModelCatalog) -> Self {
        self.catalog = catalog;
        self
    }
    pub fn with_pretrained_model(mut self, model: PretrainedModel) -> Self {
        self.catalog = self.catalog.with_model(model);
        self
    }
    pub fn with_id_strategy(mut self, strategy: IdStrategy) -> Self {
        self.options.id_strategy = strategy;
        self
    }
    pub fn with_knn_dimension(mut self, dimension: usize) -> Self {
        self.options.knn_dimension = dimension;
        self
    }
    pub fn build(self) -> Compiler {
        Compiler {
            graph: self.graph,
            catalog: self.catalog,
            options: self.options,
        }
    }
}

impl Compiler {
    pub fn builder(graph: VisualGraph) -> CompilerBuilder {
        CompilerBuilder::new(graph)
    }

    pub fn graph(&self) -> &VisualGraph {
        &self.graph
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Runs only the pre-flight checks.
    pub fn validate(&self) -> Result<(), CompileError> {
        validate(&self.graph, &self.catalog).map_err(|errors| CompileError::Validation { errors })
    }

    /// Compiles with a fresh id generator from the configured strategy.
    pub fn compile(&self) -> Result<TemplateFlows, CompileError> {
        let mut ids = self.options.id_strategy.generator();
        self.compile_with(ids.as_mut())
    }

    /// Compiles with a caller-provided id generator.
    pub fn compile_with(&self, ids: &mut dyn IdGenerator) -> Result<TemplateFlows, CompileError> {
        self.validate()?;

        let ingest = partition(&self.graph.nodes, &self.graph.edges, GroupTag::Ingest);
        let search = partition(&self.graph.nodes, &self.graph.edges, GroupTag::Search);
        debug!(
            ingest_nodes = ingest.nodes.len(),
            search_nodes = search.nodes.len(),
            "partitioned graph"
        );

        let mut emitter = StepEmitter::new(&self.catalog, ids, self.options.knn_dimension);

        // 1. Ingest side: every supported node, threading the emitted nodes
        let (mut steps, _) = ingest.nodes.iter().try_fold(
            (Vec::<TemplateStep>::new(), Vec::<EmittedNode<'_>>::new()),
            |(mut steps, mut emitted), &node| {
                if let Some((done, node_steps)) = emitter.to_steps(node, &emitted, &ingest.edges)? {
                    steps.extend(node_steps);
                    emitted.push(done);
                }
                Ok::<_, CompileError>((steps, emitted))
            },
        )?;

        // 2. Search side: only results transformers are compiled for now
        let mut search_emitted: Vec<EmittedNode<'_>> = Vec::new();
        for &node in &search.nodes {
            match classify(node) {
                Ok(Conversion::ResultsTransformer) => {
                    if let Some((done, node_steps)) =
                        emitter.to_steps(node, &search_emitted, &search.edges)?
                    {
                        steps.extend(node_steps);
                        search_emitted.push(done);
                    }
                }
                _ => debug!(node_id = %node.id, kind = %node.kind, "search component not compiled"),
            }
        }

        // 3. Edges: ingest side only
        let template = Template {
            nodes: steps,
            edges: Linker::new(&self.graph.nodes).link(ingest.edges.iter().copied()),
        };
        template.verify()?;

        info!(
            steps = template.nodes.len(),
            edges = template.edges.len(),
            "compiled provision template"
        );

        let mut flows = TemplateFlows::default();
        flows.insert(PROVISION_WORKFLOW, template);
        Ok(flows)
    }

    /// Compiles and wraps the result in a create-workflow document.
    pub fn compile_document(
        &self,
        name: &str,
        description: &str,
        use_case: &str,
    ) -> Result<WorkflowDocument, CompileError> {
        Ok(WorkflowDocument {
            name: name.to_string(),
            description: description.to_string(),
            use_case: use_case.to_string(),
            version: TemplateVersion {
                template: self.options.template_version.clone(),
                compatibility: self.options.compatibility.clone(),
            },
            workflows: self.compile()?,
        })
    }
}
