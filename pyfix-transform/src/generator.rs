use crate::api::{TransformError, Transformer};
use pyfix_types::StepParams;
use pyfix_types::transformer::{Category, Preview, TransformerInfo};

/// Produces source text from nothing by expanding a template.
///
/// `{key}` placeholders are substituted from step params. Generators
/// ignore their input by contract: handing one non-empty input is a
/// programming error on the caller's side, not a recoverable condition.
pub struct TemplateGenerator {
    info: TransformerInfo,
    template: String,
}

impl TemplateGenerator {
    pub fn new(info: TransformerInfo, template: impl Into<String>) -> Self {
        Self {
            info,
            template: template.into(),
        }
    }

    /// The built-in preset: a minimal module skeleton with a docstring,
    /// a `main` entry point, and a main guard.
    pub fn module_scaffold() -> Self {
        Self::new(
            TransformerInfo {
                name: "Module scaffold".to_string(),
                description: "Generates a minimal Python module skeleton".to_string(),
                version: "1.0.0".to_string(),
                author: Some("pyfix".to_string()),
                category: Category::Generator,
            },
            "\"\"\"{description}\"\"\"\n\n\ndef main():\n    \"\"\"TODO: Describe main.\"\"\"\n\n\nif __name__ == \"__main__\":\n    main()\n",
        )
    }
}

impl Transformer for TemplateGenerator {
    fn metadata(&self) -> TransformerInfo {
        self.info.clone()
    }

    fn can_transform(&self, source: &str) -> bool {
        source.is_empty()
    }

    fn preview(&self, source: &str, _params: &StepParams) -> Preview {
        Preview {
            applicable: source.is_empty(),
            description: self.info.description.clone(),
            estimated_changes: 1,
        }
    }

    fn transform(&self, source: &str, params: &StepParams) -> Result<String, TransformError> {
        if !source.is_empty() {
            return Err(TransformError::Usage(
                "generator received non-empty input".to_string(),
            ));
        }

        let mut out = self.template.clone();
        for (key, value) in params {
            if key.starts_with('_') {
                continue;
            }
            let needle = format!("{{{key}}}");
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            out = out.replace(&needle, &text);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaffold_expands_description_param() {
        let mut params = StepParams::new();
        params.insert(
            "description".into(),
            serde_json::json!("Utility helpers."),
        );

        let out = TemplateGenerator::module_scaffold()
            .transform("", &params)
            .expect("generate");
        assert!(out.starts_with("\"\"\"Utility helpers.\"\"\"\n"));
        assert!(out.contains("if __name__ == \"__main__\":"));
        assert!(crate::python::parses_cleanly(&out));
    }

    #[test]
    fn non_empty_input_is_a_usage_error() {
        let err = TemplateGenerator::module_scaffold()
            .transform("x = 1\n", &StepParams::new())
            .unwrap_err();
        assert!(matches!(err, TransformError::Usage(_)));
    }

    #[test]
    fn can_transform_only_empty_input() {
        let generator = TemplateGenerator::module_scaffold();
        assert!(generator.can_transform(""));
        assert!(!generator.can_transform("x = 1"));
    }

    #[test]
    fn reserved_params_are_not_substituted() {
        let mut params = StepParams::new();
        params.insert("_secret".into(), serde_json::json!("hidden"));

        let generator = TemplateGenerator::new(
            TransformerInfo {
                name: "t".to_string(),
                description: "d".to_string(),
                version: "0".to_string(),
                author: None,
                category: Category::Generator,
            },
            "value: {_secret}\n",
        );
        let out = generator.transform("", &params).expect("generate");
        assert_eq!(out, "value: {_secret}\n");
    }
}
