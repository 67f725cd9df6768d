//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the flowsmith crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use flowsmith::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let canvas_json = std::fs::read_to_string("path/to/canvas.json")?;
//! let graph = UiWorkflow::from_json(&canvas_json)?.into_graph()?;
//!
//! let flows = Compiler::builder(graph).build().compile()?;
//! println!("{}", serde_json::to_string_pretty(&flows)?);
//! # Ok(())
//! # }
//! ```

// Compilation
pub use crate::compiler::{Compiler, CompilerBuilder, CompilerOptions, IdGenerator, IdStrategy};

// Input graph
pub use crate::graph::{
    Capability, ComponentKind, GroupTag, IntoGraph, ModelCategory, VisualEdge, VisualGraph,
    VisualNode,
};
pub use crate::ui::UiWorkflow;

// Output templates
pub use crate::template::{
    InputValue, StepReference, StepType, Template, TemplateEdge, TemplateFlows, TemplateStep,
    WorkflowDocument,
};

// Catalog
pub use crate::catalog::{ModelCatalog, PretrainedModel};

// Error types
pub use crate::error::{CompileError, GraphConversionError, TopologyViolation};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
