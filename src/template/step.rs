use super::value::{InputValue, StepReference};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Backend step-type identifiers understood by the orchestration service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    CreateIngestPipeline,
    CreateIndex,
    CreateSearchPipeline,
    #[serde(rename = "register_local_pretrained_model")]
    RegisterPretrainedModel,
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepType::CreateIngestPipeline => "create_ingest_pipeline",
            StepType::CreateIndex => "create_index",
            StepType::CreateSearchPipeline => "create_search_pipeline",
            StepType::RegisterPretrainedModel => "register_local_pretrained_model",
        };
        f.write_str(name)
    }
}

pub type UserInputs = BTreeMap<String, InputValue>;

/// A single backend-executable unit of provisioning work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateStep {
    pub id: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    #[serde(default)]
    pub user_inputs: UserInputs,
    /// Upstream step id -> name of the output field this step consumes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub previous_node_inputs: BTreeMap<String, String>,
}

impl TemplateStep {
    pub fn new(id: impl Into<String>, step_type: StepType) -> Self {
        Self {
            id: id.into(),
            step_type,
            user_inputs: UserInputs::new(),
            previous_node_inputs: BTreeMap::new(),
        }
    }

    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.user_inputs.insert(key.into(), value.into());
        self
    }

    /// Records that this step consumes `reference` in `previous_node_inputs`.
    pub fn with_dependency(mut self, reference: &StepReference) -> Self {
        self.previous_node_inputs
            .insert(reference.step_id.clone(), reference.field.clone());
        self
    }

    pub fn input(&self, path: &[&str]) -> Option<&InputValue> {
        let (head, rest) = path.split_first()?;
        self.user_inputs.get(*head)?.get_path(rest)
    }

    /// Every reference appearing anywhere in `user_inputs`.
    pub fn references(&self) -> Vec<&StepReference> {
        let mut refs = Vec::new();
        for value in self.user_inputs.values() {
            value.collect_references(&mut refs);
        }
        refs
    }

    /// The dependencies declared in `previous_node_inputs`.
    pub fn dependencies(&self) -> impl Iterator<Item = StepReference> + '_ {
        self.previous_node_inputs
            .iter()
            .map(|(step_id, field)| StepReference::new(step_id, field))
    }

    /// Declared dependencies that no value in `user_inputs` actually references.
    pub fn unreferenced_dependencies(&self) -> Vec<StepReference> {
        let refs = self.references();
        self.dependencies()
            .filter(|dep| !refs.contains(&dep))
            .collect()
    }
}
