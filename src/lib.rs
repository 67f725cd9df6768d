//! # flowsmith - Visual Workflow to Provisioning Template Compiler
//!
//! **flowsmith** compiles the node/edge graph a user draws in a search
//! workflow builder (data sources, ML processors, indexers, result
//! transformers) into the provisioning template of the backend orchestration
//! service: an ordered DAG of named steps where later steps consume outputs of
//! earlier ones through `${{step_id.field}}` placeholders.
//!
//! ## Core Workflow
//!
//! The compiler is format-agnostic. It operates on a canonical `VisualGraph`:
//!
//! 1.  **Load Your Canvas**: Deserialize the editor's export, either with the built-in
//!     [`ui::UiWorkflow`] or your own structs.
//! 2.  **Convert to a `VisualGraph`**: Implement `IntoGraph` for your structs (already done for `UiWorkflow`).
//! 3.  **Compile**: Use `Compiler::builder` to configure a compiler, then `compile()`. The graph is
//!     validated up front; every problem comes back in one `CompileError::Validation`.
//! 4.  **Persist**: Serialize the returned `TemplateFlows` (or a full `WorkflowDocument`) and send it
//!     to the orchestration service.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowsmith::prelude::*;
//! use serde_json::json;
//!
//! fn main() -> Result<()> {
//!     let ingest = VisualNode::new("ingest", ComponentKind::IngestGroup);
//!     let embed = VisualNode::new("embed", ComponentKind::TextEmbeddingTransformer)
//!         .in_group("ingest")
//!         .with_capabilities(ComponentKind::TextEmbeddingTransformer.default_capabilities())
//!         .with_config("model", json!({ "id": "my-deployed-model", "category": "DEPLOYED" }))
//!         .with_config("inputField", json!("text"))
//!         .with_config("vectorField", json!("embedding"));
//!     let index = VisualNode::new("index", ComponentKind::KnnIndexer)
//!         .in_group("ingest")
//!         .with_capabilities(ComponentKind::KnnIndexer.default_capabilities())
//!         .with_config("indexName", json!("my-knn-index"));
//!     let edge = VisualEdge::between(&embed, &index);
//!
//!     let graph = VisualGraph {
//!         nodes: vec![ingest, embed, index],
//!         edges: vec![edge],
//!     };
//!
//!     let compiler = Compiler::builder(graph)
//!         .with_id_strategy(IdStrategy::Sequential)
//!         .build();
//!     let flows = compiler.compile()?;
//!
//!     println!("{}", serde_json::to_string_pretty(&flows)?);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod compiler;
pub mod error;
pub mod graph;
pub mod prelude;
pub mod template;
pub mod ui;
