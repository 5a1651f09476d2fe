use serde::Deserialize;

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// One plugin manifest file.
///
/// `transformers` stays raw JSON here so a single invalid spec can be
/// skipped without rejecting its siblings; see `Registry::discover`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginManifest {
    #[serde(default)]
    pub transformers: Vec<serde_json::Value>,
}

/// One transformer declaration inside a manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct TransformerSpec {
    /// Registry key. Defaults to the manifest file stem (suffixed with
    /// `.N` for the Nth extra spec in one file).
    #[serde(default)]
    pub key: Option<String>,

    pub name: String,
    pub description: String,

    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(flatten)]
    pub behavior: SpecBehavior,
}

/// Kind-specific configuration; the factory's instantiation table.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpecBehavior {
    /// Delegate to an external command-line tool.
    External {
        command: String,

        #[serde(default)]
        subcommand: Option<String>,

        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },

    /// Rewrite calls to a bare identifier into a qualified call.
    CallRewrite {
        target: String,
        replacement: String,

        #[serde(default)]
        import_module: Option<String>,
    },

    /// Generate file content from a template.
    Generator { template: String },
}
