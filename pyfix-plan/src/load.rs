use pyfix_types::MIN_PLAN_VERSION;
use pyfix_types::plan::{StepKind, TransformationPlan};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

/// Load-time plan errors. Always fatal to the whole plan; a plan is never
/// partially applied.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The document is not well-formed JSON.
    #[error("malformed plan document: {0}")]
    Malformed(String),

    /// The document is well-formed but violates the plan schema.
    #[error("schema violation at `{field}`: {message}")]
    SchemaViolation { field: String, message: String },
}

impl PlanError {
    fn violation(field: impl Into<String>, message: impl Into<String>) -> Self {
        PlanError::SchemaViolation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Parse and validate a plan document.
///
/// `known_plugins` is the set of currently-registered registry keys; a step
/// that names any other plugin rejects the whole document here, at load
/// time, instead of failing mid-run.
///
/// Pure: reads nothing beyond `document`.
pub fn parse_plan(
    document: &[u8],
    known_plugins: &BTreeSet<String>,
) -> Result<TransformationPlan, PlanError> {
    // Stage 1: well-formedness. Syntax problems are `Malformed`; everything
    // after this point is a schema violation.
    let value: serde_json::Value =
        serde_json::from_slice(document).map_err(|e| PlanError::Malformed(e.to_string()))?;

    // Stage 2: shape. The wire types carry `deny_unknown_fields`, so
    // unknown or mistyped fields surface here.
    let plan: TransformationPlan = serde_json::from_value(value).map_err(|e| {
        let message = e.to_string();
        PlanError::violation(field_from_serde_message(&message), message)
    })?;

    // Stage 3: rules serde cannot express.
    if plan.name.trim().is_empty() {
        return Err(PlanError::violation("name", "must be non-empty"));
    }
    if !(plan.version >= MIN_PLAN_VERSION) {
        return Err(PlanError::violation(
            "version",
            format!("must be >= {MIN_PLAN_VERSION}, got {}", plan.version),
        ));
    }
    if plan.transformations.is_empty() {
        return Err(PlanError::violation(
            "transformations",
            "must contain at least one step",
        ));
    }

    for (i, step) in plan.transformations.iter().enumerate() {
        let field = |suffix: &str| format!("transformations[{i}].{suffix}");

        if step.kind.requires_plugin() {
            match &step.plugin_name {
                None => {
                    return Err(PlanError::violation(
                        field("plugin_name"),
                        format!("required for {} steps", step.kind.label()),
                    ));
                }
                Some(name) if !known_plugins.contains(name) => {
                    return Err(PlanError::violation(
                        field("plugin_name"),
                        format!("unknown plugin `{name}`"),
                    ));
                }
                Some(_) => {}
            }
        } else if let Some(name) = &step.plugin_name
            && !known_plugins.contains(name)
        {
            // Optional plugin references (custom steps) are held to the
            // same standard: a dangling name must not reach the pipeline.
            return Err(PlanError::violation(
                field("plugin_name"),
                format!("unknown plugin `{name}`"),
            ));
        }

        if step.kind == StepKind::SimpleReplace {
            for key in ["find", "replace"] {
                if !step.params.get(key).is_some_and(|v| v.is_string()) {
                    return Err(PlanError::violation(
                        field(&format!("params.{key}")),
                        "simple_replace requires a string param",
                    ));
                }
            }
        }
    }

    debug!(
        plan = %plan.name,
        steps = plan.transformations.len(),
        "plan validated"
    );
    Ok(plan)
}

/// Best-effort field name from a serde_json error message.
///
/// serde reports offending fields in backticks ("unknown field `x`",
/// "missing field `y`"); fall back to the document root when absent.
fn field_from_serde_message(message: &str) -> String {
    if let Some(start) = message.find('`')
        && let Some(len) = message[start + 1..].find('`')
    {
        return message[start + 1..start + 1 + len].to_string();
    }
    "plan".to_string()
}
