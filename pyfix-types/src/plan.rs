use crate::StepParams;
use serde::{Deserialize, Serialize};

/// A validated transformation plan.
///
/// Constructed once at load time by `pyfix-plan` and immutable thereafter;
/// the pipeline never mutates a plan during execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformationPlan {
    pub name: String,
    pub description: String,

    /// Plan format version. Must be >= 0.1.
    pub version: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    pub transformations: Vec<TransformationStep>,
}

/// One step in a plan's ordered transformation sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformationStep {
    #[serde(rename = "type")]
    pub kind: StepKind,

    pub description: String,

    /// Registry key of the transformer to run. Required for
    /// `plugin_call` and `generator` steps; validated at plan load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_name: Option<String>,

    #[serde(default, skip_serializing_if = "StepParams::is_empty")]
    pub params: StepParams,
}

/// Step kind taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Run a registered transformer over the file's current content.
    PluginCall,
    /// Literal find/replace executed inline by the orchestrator.
    SimpleReplace,
    /// Site-local step; runs a plugin when `plugin_name` is present,
    /// otherwise recorded as a no-op.
    Custom,
    /// Run a registered generator; the file's current content must be
    /// empty.
    Generator,
}

impl StepKind {
    /// Whether `plugin_name` is mandatory for this kind.
    pub fn requires_plugin(self) -> bool {
        matches!(self, StepKind::PluginCall | StepKind::Generator)
    }

    pub fn label(self) -> &'static str {
        match self {
            StepKind::PluginCall => "plugin_call",
            StepKind::SimpleReplace => "simple_replace",
            StepKind::Custom => "custom",
            StepKind::Generator => "generator",
        }
    }
}
