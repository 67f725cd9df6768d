use super::step::TemplateStep;
use crate::error::CompileError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the sub-workflow that provisions all resources of a canvas.
pub const PROVISION_WORKFLOW: &str = "provision";

/// A dependency record used by the backend for step ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEdge {
    pub source: String,
    pub dest: String,
}

/// An ordered list of steps plus their dependency edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub nodes: Vec<TemplateStep>,
    #[serde(default)]
    pub edges: Vec<TemplateEdge>,
}

impl Template {
    pub fn step(&self, id: &str) -> Option<&TemplateStep> {
        self.nodes.iter().find(|s| s.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|s| s.id == id)
    }

    /// Checks the invariants the backend relies on: unique step ids, every
    /// dependency pointing at a strictly earlier step, and every declared
    /// dependency matched by a reference in the step's inputs and vice versa.
    pub fn verify(&self) -> Result<(), CompileError> {
        for (index, step) in self.nodes.iter().enumerate() {
            if self.nodes[..index].iter().any(|s| s.id == step.id) {
                return Err(inconsistent(step, "step id is not unique".to_string()));
            }

            for dep in step.dependencies() {
                match self.position(&dep.step_id) {
                    Some(p) if p < index => {}
                    Some(_) => {
                        return Err(inconsistent(
                            step,
                            format!("depends on later step '{}'", dep.step_id),
                        ));
                    }
                    None => {
                        return Err(inconsistent(
                            step,
                            format!("depends on unknown step '{}'", dep.step_id),
                        ));
                    }
                }
            }

            if let Some(dep) = step.unreferenced_dependencies().first() {
                return Err(inconsistent(
                    step,
                    format!("declares '{}' without using it", dep),
                ));
            }

            for reference in step.references() {
                if step.previous_node_inputs.get(&reference.step_id) != Some(&reference.field) {
                    return Err(inconsistent(
                        step,
                        format!("uses '{}' without declaring it", reference),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn inconsistent(step: &TemplateStep, message: String) -> CompileError {
    CompileError::InconsistentTemplate {
        step_id: step.id.clone(),
        message,
    }
}

/// Templates keyed by sub-workflow name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateFlows(pub BTreeMap<String, Template>);

impl TemplateFlows {
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.0.get(name)
    }

    pub fn provision(&self) -> Option<&Template> {
        self.get(PROVISION_WORKFLOW)
    }

    pub fn insert(&mut self, name: impl Into<String>, template: Template) {
        self.0.insert(name.into(), template);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Template)> {
        self.0.iter()
    }
}

/// Version block of a workflow document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateVersion {
    pub template: String,
    pub compatibility: Vec<String>,
}

/// The full create-workflow body accepted by the orchestration service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub use_case: String,
    pub version: TemplateVersion,
    pub workflows: TemplateFlows,
}
