//! Transformer discovery and registration.
//!
//! "Plugins" are declarative JSON manifests in a plugin directory, each
//! defining zero or more transformer specs that are instantiated behind
//! `Arc<dyn Transformer>` through a fixed, kind-keyed factory. Discovery
//! is tolerant: one broken manifest (or one broken spec inside a
//! manifest) is logged and skipped without affecting the rest.

mod manifest;
mod registry;

pub use manifest::{PluginManifest, SpecBehavior, TransformerSpec};
pub use registry::{PluginLoadError, PluginOrigin, RegisteredTransformer, Registry};
