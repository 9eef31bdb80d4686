//! Convention plugin lifecycle.
//!
//! [`ConventionPlugin::apply`] is the only entry point the build engine
//! calls. It holds the variant as a strategy object, so the order of shared
//! setup cannot be overridden by a variant:
//!
//! 1. classify the module's version token
//! 2. build a fresh [`ConventionContext`]
//! 3. apply every shared convention at most once
//! 4. call [`PluginVariant::apply_implementation`] exactly once
//!
//! Any failure in 1 to 3 returns before the variant hook runs.

use std::fmt;
use std::sync::Arc;

use tracing::Instrument;

use crate::build_type::{BuildType, UnknownBuildType};
use crate::context::ConventionContext;
use crate::convention::Convention;
use crate::error::{ConventionApplicationError, Result};
use crate::module::{ModuleConfiguration, ModuleDescriptor};
use crate::obs;

/// Module-specific delta applied on top of shared conventions.
///
/// Implementations are stateless strategies. They only touch the context
/// they are given and must not re-run shared setup.
pub trait PluginVariant: Send + Sync {
    /// Plugin id used for registry lookup.
    fn id(&self) -> &str;

    fn apply_implementation(&self, context: &mut ConventionContext) -> Result<()>;
}

/// Maps a version token to a build type.
pub type Classifier = fn(&str) -> std::result::Result<BuildType, UnknownBuildType>;

/// A variant bound to the shared conventions it runs after.
#[derive(Clone)]
pub struct ConventionPlugin {
    variant: Arc<dyn PluginVariant>,
    conventions: Vec<Arc<dyn Convention>>,
    classifier: Classifier,
}

impl ConventionPlugin {
    pub fn builder(variant: Arc<dyn PluginVariant>) -> ConventionPluginBuilder {
        ConventionPluginBuilder {
            variant,
            conventions: Vec::new(),
            classifier: BuildType::classify,
        }
    }

    pub fn id(&self) -> &str {
        self.variant.id()
    }

    /// Configure one module.
    pub async fn apply(&self, module: &ModuleDescriptor) -> Result<ModuleConfiguration> {
        let span = tracing::info_span!("keel.apply", module = %module.name, plugin = %self.id());
        self.run(module).instrument(span).await
    }

    async fn run(&self, module: &ModuleDescriptor) -> Result<ModuleConfiguration> {
        let build_type = (self.classifier)(&module.build_type).map_err(|source| {
            ConventionApplicationError::UnknownBuildType {
                module: module.name.clone(),
                source,
            }
        })?;

        let mut context = ConventionContext::new(module.clone(), build_type);
        obs::emit_application_started(&context.run_id(), &module.name, self.id(), build_type);

        for convention in &self.conventions {
            context.apply_convention(convention.as_ref()).await?;
        }

        self.variant.apply_implementation(&mut context)?;

        obs::emit_application_finished(&context.run_id(), &module.name, self.id());
        Ok(context.into_configuration())
    }
}

impl fmt::Debug for ConventionPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConventionPlugin")
            .field("variant", &self.variant.id())
            .field(
                "conventions",
                &self.conventions.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Builder for [`ConventionPlugin`].
pub struct ConventionPluginBuilder {
    variant: Arc<dyn PluginVariant>,
    conventions: Vec<Arc<dyn Convention>>,
    classifier: Classifier,
}

impl ConventionPluginBuilder {
    /// Append a shared convention. Registering the same name twice is
    /// harmless: the second registration is skipped at apply time.
    pub fn convention(mut self, convention: Arc<dyn Convention>) -> Self {
        self.conventions.push(convention);
        self
    }

    pub fn conventions(mut self, conventions: impl IntoIterator<Item = Arc<dyn Convention>>) -> Self {
        self.conventions.extend(conventions);
        self
    }

    /// Replace the build-type classifier.
    pub fn classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn build(self) -> ConventionPlugin {
        ConventionPlugin {
            variant: self.variant,
            conventions: self.conventions,
            classifier: self.classifier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{CountingConvention, FailingConvention, RecordingVariant};

    fn module(token: &str) -> ModuleDescriptor {
        ModuleDescriptor::new("blob", "1.0.0", token, "recording")
    }

    #[tokio::test]
    async fn test_hook_runs_once_after_conventions() {
        let variant = Arc::new(RecordingVariant::new("recording"));
        let plugin = ConventionPlugin::builder(variant.clone())
            .convention(Arc::new(CountingConvention::new("encoding")))
            .build();

        let config = plugin.apply(&module("snapshot")).await.unwrap();

        assert_eq!(variant.calls(), 1);
        assert_eq!(variant.seen_conventions(), vec![vec!["encoding".to_string()]]);
        assert_eq!(config.build_type, BuildType::Snapshot);
        assert!(config.has_plugin("recording"));
    }

    #[tokio::test]
    async fn test_classifier_failure_skips_hook() {
        fn always_fails(token: &str) -> std::result::Result<BuildType, UnknownBuildType> {
            Err(UnknownBuildType {
                token: token.to_string(),
            })
        }

        let variant = Arc::new(RecordingVariant::new("recording"));
        let convention = Arc::new(CountingConvention::new("encoding"));
        let plugin = ConventionPlugin::builder(variant.clone())
            .convention(convention.clone())
            .classifier(always_fails)
            .build();

        let err = plugin.apply(&module("release")).await.unwrap_err();

        assert!(matches!(err, ConventionApplicationError::UnknownBuildType { .. }));
        assert_eq!(variant.calls(), 0);
        assert_eq!(convention.calls(), 0);
    }

    #[tokio::test]
    async fn test_convention_failure_skips_hook() {
        let variant = Arc::new(RecordingVariant::new("recording"));
        let later = Arc::new(CountingConvention::new("later"));
        let plugin = ConventionPlugin::builder(variant.clone())
            .convention(Arc::new(FailingConvention::new("broken")))
            .convention(later.clone())
            .build();

        let err = plugin.apply(&module("release")).await.unwrap_err();

        assert!(matches!(err, ConventionApplicationError::Convention { .. }));
        assert_eq!(variant.calls(), 0);
        assert_eq!(later.calls(), 0);
    }

    #[tokio::test]
    async fn test_each_apply_uses_a_fresh_context() {
        let variant = Arc::new(RecordingVariant::new("recording"));
        let convention = Arc::new(CountingConvention::new("encoding"));
        let plugin = ConventionPlugin::builder(variant.clone())
            .convention(convention.clone())
            .build();

        plugin.apply(&module("patch")).await.unwrap();
        plugin.apply(&module("patch")).await.unwrap();

        assert_eq!(convention.calls(), 2);
        assert_eq!(variant.calls(), 2);
    }
}
