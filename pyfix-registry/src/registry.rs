use crate::manifest::{PluginManifest, SpecBehavior, TransformerSpec};
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use pyfix_transform::{CallRewriter, ExternalWrapper, TemplateGenerator, Transformer};
use pyfix_types::transformer::{Category, TransformerInfo};
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Why one plugin candidate failed to load. Never fatal to discovery;
/// recorded so front-ends can surface it.
#[derive(Debug, Error, Clone)]
pub enum PluginLoadError {
    #[error("io error: {message}")]
    Io { message: String },

    #[error("manifest parse error: {message}")]
    Manifest { message: String },

    #[error("invalid transformer spec: {message}")]
    Invalid { message: String },
}

/// Where a registered transformer came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginOrigin {
    Builtin,
    Manifest(Utf8PathBuf),
}

/// One registry entry: the stable key plans refer to, plus the instance.
#[derive(Clone)]
pub struct RegisteredTransformer {
    pub key: String,
    pub origin: PluginOrigin,
    pub transformer: Arc<dyn Transformer>,
}

/// The registration table mapping plan `plugin_name` values to
/// transformer instances.
///
/// Read-heavy and rebuilt wholesale on [`Registry::reload`]; never
/// mutated field-by-field, so a populated registry is safe to share
/// read-only across concurrent runs.
pub struct Registry {
    plugin_dir: Option<Utf8PathBuf>,
    entries: BTreeMap<String, RegisteredTransformer>,
    failures: Vec<(Utf8PathBuf, PluginLoadError)>,
}

impl Registry {
    /// A registry holding only the built-in transformers.
    pub fn builtin() -> Self {
        let mut registry = Self {
            plugin_dir: None,
            entries: BTreeMap::new(),
            failures: vec![],
        };
        registry.register_builtins();
        registry
    }

    /// Register built-ins, then scan `plugin_dir` for `*.json` manifests.
    ///
    /// A missing or unreadable directory yields a consistent registry
    /// with built-ins only; one broken candidate never prevents the rest
    /// from loading.
    pub fn discover(plugin_dir: impl Into<Utf8PathBuf>) -> Self {
        let mut registry = Self::builtin();
        registry.plugin_dir = Some(plugin_dir.into());
        registry.scan();
        registry
    }

    /// Clear all registered instances and re-run discovery. Idempotent;
    /// leaves the registry consistent even when the plugin directory has
    /// disappeared since the last scan.
    pub fn reload(&mut self) {
        self.entries.clear();
        self.failures.clear();
        self.register_builtins();
        self.scan();
    }

    /// Look up a transformer by registry key.
    pub fn resolve(&self, key: &str) -> Option<Arc<dyn Transformer>> {
        self.entries.get(key).map(|e| Arc::clone(&e.transformer))
    }

    /// The set of currently-registered keys; the universe plan validation
    /// checks `plugin_name` against.
    pub fn keys(&self) -> BTreeSet<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &RegisteredTransformer> {
        self.entries.values()
    }

    /// Candidates that failed to load during the last discovery.
    pub fn load_failures(&self) -> &[(Utf8PathBuf, PluginLoadError)] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn register_builtins(&mut self) {
        for (key, transformer) in pyfix_transform::builtin_transformers() {
            self.register(key.to_string(), PluginOrigin::Builtin, transformer);
        }
    }

    fn register(&mut self, key: String, origin: PluginOrigin, transformer: Arc<dyn Transformer>) {
        if let Some(previous) = self.entries.get(&key) {
            warn!(
                key = %key,
                previous = ?previous.origin,
                replacement = ?origin,
                "registry key collision; later registration wins"
            );
        }
        self.entries.insert(
            key.clone(),
            RegisteredTransformer {
                key,
                origin,
                transformer,
            },
        );
    }

    fn scan(&mut self) {
        let Some(dir) = self.plugin_dir.clone() else {
            return;
        };
        if !dir.is_dir() {
            debug!(dir = %dir, "plugin directory absent; built-ins only");
            return;
        }

        let pattern = dir.join("*.json");
        let mut paths: Vec<Utf8PathBuf> = match glob::glob(pattern.as_str()) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .filter_map(|p| Utf8PathBuf::from_path_buf(p).ok())
                .collect(),
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "plugin scan failed");
                return;
            }
        };
        // Deterministic order matters: later files win collisions.
        paths.sort();

        for path in paths {
            self.load_manifest(&path);
        }
    }

    fn load_manifest(&mut self, path: &Utf8Path) {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path, error = %e, "skipping unreadable plugin manifest");
                self.failures.push((
                    path.to_path_buf(),
                    PluginLoadError::Io {
                        message: e.to_string(),
                    },
                ));
                return;
            }
        };

        let manifest: PluginManifest = match serde_json::from_str(&contents) {
            Ok(m) => m,
            Err(e) => {
                warn!(path = %path, error = %e, "skipping malformed plugin manifest");
                self.failures.push((
                    path.to_path_buf(),
                    PluginLoadError::Manifest {
                        message: e.to_string(),
                    },
                ));
                return;
            }
        };

        let stem = path.file_stem().unwrap_or("plugin").to_string();
        for (index, raw) in manifest.transformers.into_iter().enumerate() {
            let spec: TransformerSpec = match serde_json::from_value(raw) {
                Ok(s) => s,
                Err(e) => {
                    warn!(path = %path, index, error = %e, "skipping invalid transformer spec");
                    self.failures.push((
                        path.to_path_buf(),
                        PluginLoadError::Invalid {
                            message: format!("spec {index}: {e}"),
                        },
                    ));
                    continue;
                }
            };

            let key = spec.key.clone().unwrap_or_else(|| {
                if index == 0 {
                    stem.clone()
                } else {
                    format!("{stem}.{index}")
                }
            });

            match instantiate(&spec) {
                Ok(transformer) => {
                    debug!(path = %path, key = %key, "registered plugin transformer");
                    self.register(key, PluginOrigin::Manifest(path.to_path_buf()), transformer);
                }
                Err(e) => {
                    warn!(path = %path, key = %key, error = %e, "skipping transformer spec");
                    self.failures.push((path.to_path_buf(), e));
                }
            }
        }
    }
}

/// The factory: turn a validated spec into a live transformer.
fn instantiate(spec: &TransformerSpec) -> Result<Arc<dyn Transformer>, PluginLoadError> {
    let invalid = |message: &str| PluginLoadError::Invalid {
        message: message.to_string(),
    };

    let info = |category: Category| TransformerInfo {
        name: spec.name.clone(),
        description: spec.description.clone(),
        version: spec.version.clone(),
        author: spec.author.clone(),
        category,
    };

    match &spec.behavior {
        SpecBehavior::External {
            command,
            subcommand,
            timeout_secs,
        } => {
            if command.trim().is_empty() {
                return Err(invalid("external spec has an empty command"));
            }
            if *timeout_secs == 0 {
                return Err(invalid("external spec timeout must be positive"));
            }
            Ok(Arc::new(ExternalWrapper::new(
                info(Category::ExternalWrapper),
                command.clone(),
                subcommand.clone(),
                Duration::from_secs(*timeout_secs),
            )))
        }
        SpecBehavior::CallRewrite {
            target,
            replacement,
            import_module,
        } => {
            if target.trim().is_empty() || replacement.trim().is_empty() {
                return Err(invalid("call_rewrite spec needs target and replacement"));
            }
            Ok(Arc::new(CallRewriter::new(
                info(Category::Rewriter),
                target.clone(),
                replacement.clone(),
                import_module.clone(),
            )))
        }
        SpecBehavior::Generator { template } => {
            if template.is_empty() {
                return Err(invalid("generator spec has an empty template"));
            }
            Ok(Arc::new(TemplateGenerator::new(
                info(Category::Generator),
                template.clone(),
            )))
        }
    }
}
