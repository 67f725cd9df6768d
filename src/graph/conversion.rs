use super::definition::VisualGraph;
use crate::error::GraphConversionError;

/// A trait for custom canvas models that can be converted into a `VisualGraph`.
///
/// The compiler only ever sees `VisualGraph`. Implementing this trait on the
/// structs you deserialize your editor's export into is how a new canvas
/// format is plugged in; [`crate::ui::UiWorkflow`] is the built-in one.
///
/// # Example
///
/// ```rust,no_run
/// use flowsmith::prelude::*;
/// use flowsmith::error::GraphConversionError;
///
/// struct MyComponent { id: String, kind: String, group: String }
/// struct MyCanvas { components: Vec<MyComponent> }
///
/// impl IntoGraph for MyCanvas {
///     fn into_graph(self) -> std::result::Result<VisualGraph, GraphConversionError> {
///         let nodes = self
///             .components
///             .into_iter()
///             .map(|c| {
///                 let kind = ComponentKind::from(c.kind);
///                 let capabilities = kind.default_capabilities();
///                 VisualNode::new(c.id, kind)
///                     .in_group(c.group)
///                     .with_capabilities(capabilities)
///             })
///             .collect();
///         Ok(VisualGraph { nodes, edges: vec![] })
///     }
/// }
/// ```
pub trait IntoGraph {
    /// Consumes the object and converts it into a compiler-ready visual graph.
    fn into_graph(self) -> Result<VisualGraph, GraphConversionError>;
}

impl IntoGraph for VisualGraph {
    fn into_graph(self) -> Result<VisualGraph, GraphConversionError> {
        Ok(self)
    }
}
