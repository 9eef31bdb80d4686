//! Build engine: plugin lookup, per-module application and retry.
//!
//! The engine plays the build-graph role toward the plugins. It applies each
//! module once per build, re-running the whole application when it fails
//! with a recoverable repository failure. Independent modules run
//! concurrently on their own tokio tasks and share no mutable state.

use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::info;

use crate::convention::{shared_conventions, Convention};
use crate::error::ConventionApplicationError;
use crate::module::{ModuleConfiguration, ModuleDescriptor};
use crate::obs;
use crate::plugin::ConventionPlugin;
use crate::registry::PluginRegistry;
use crate::repository::{RepositoryGuard, RepositoryResolver};
use crate::retry::{retry_recoverable, RetryPolicy};
use crate::settings::Manifest;

/// Failure applying conventions to a module through the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("module '{module}' requests unknown plugin '{plugin}'")]
    UnknownPlugin { module: String, plugin: String },

    #[error("{source} (after {attempts} attempt(s))")]
    Application {
        attempts: u32,
        #[source]
        source: ConventionApplicationError,
    },

    #[error("module '{module}' task aborted: {reason}")]
    TaskFailed { module: String, reason: String },
}

impl EngineError {
    /// The underlying convention error, if application ran at all.
    pub fn application_error(&self) -> Option<&ConventionApplicationError> {
        match self {
            EngineError::Application { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A successfully configured module.
#[derive(Debug, Clone)]
pub struct AppliedModule {
    pub configuration: ModuleConfiguration,
    pub attempts: u32,
}

/// Applies convention plugins to modules.
#[derive(Clone)]
pub struct BuildEngine {
    registry: PluginRegistry,
    conventions: Vec<Arc<dyn Convention>>,
    retry: RetryPolicy,
}

impl BuildEngine {
    /// Engine with the shared conventions derived from `manifest`.
    pub fn new(
        registry: PluginRegistry,
        manifest: &Manifest,
        resolver: Arc<dyn RepositoryResolver>,
    ) -> Self {
        let guard = RepositoryGuard::new(resolver);
        Self {
            registry,
            conventions: shared_conventions(
                manifest.project.group.clone(),
                guard,
                manifest.repositories.clone(),
            ),
            retry: manifest.retry.clone(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Append an extra shared convention after the built-in ones.
    pub fn with_convention(mut self, convention: Arc<dyn Convention>) -> Self {
        self.conventions.push(convention);
        self
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Build the plugin for a module's declared variant.
    pub fn plugin_for(&self, module: &ModuleDescriptor) -> Result<ConventionPlugin, EngineError> {
        let variant = self
            .registry
            .get(&module.plugin)
            .ok_or_else(|| EngineError::UnknownPlugin {
                module: module.name.clone(),
                plugin: module.plugin.clone(),
            })?;

        Ok(ConventionPlugin::builder(variant)
            .conventions(self.conventions.iter().cloned())
            .build())
    }

    /// Apply conventions to one module, retrying recoverable failures.
    pub async fn apply_module(&self, module: &ModuleDescriptor) -> Result<AppliedModule, EngineError> {
        let plugin = self.plugin_for(module)?;

        let (result, attempts) = retry_recoverable(&self.retry, |attempt| {
            info!(module = %module.name, attempt = attempt, "Applying conventions");
            plugin.apply(module)
        })
        .await;

        match result {
            Ok(configuration) => Ok(AppliedModule {
                configuration,
                attempts,
            }),
            Err(source) => {
                obs::emit_application_failed(&module.name, attempts, &source);
                Err(EngineError::Application { attempts, source })
            }
        }
    }

    /// Apply conventions to independent modules concurrently.
    ///
    /// Returns one outcome per module, in input order. A failing module does
    /// not stop the others.
    pub async fn apply_all(
        self: Arc<Self>,
        modules: Vec<ModuleDescriptor>,
    ) -> Vec<Result<AppliedModule, EngineError>> {
        let (names, tasks): (Vec<String>, Vec<JoinHandle<Result<AppliedModule, EngineError>>>) =
            modules
                .into_iter()
                .map(|module| {
                    let engine = Arc::clone(&self);
                    let name = module.name.clone();
                    let task = tokio::spawn(async move { engine.apply_module(&module).await });
                    (name, task)
                })
                .unzip();

        join_all(tasks)
            .await
            .into_iter()
            .zip(names)
            .map(|(joined, module)| {
                joined.unwrap_or_else(|e| {
                    Err(EngineError::TaskFailed {
                        module,
                        reason: e.to_string(),
                    })
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for BuildEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildEngine")
            .field("registry", &self.registry)
            .field(
                "conventions",
                &self.conventions.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field("retry", &self.retry)
            .finish()
    }
}
