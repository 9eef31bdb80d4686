//! Shared project conventions.
//!
//! A convention is a named, reusable piece of module configuration. The
//! plugin base applies each one at most once per [`ConventionContext`].
//! Three conventions ship with every plugin:
//!
//! - `versioning`: group and effective version (`-SNAPSHOT` for snapshots)
//! - `repositories`: guarded resolution of every admitted repository
//! - `dependency-resolution`: conflict and caching policy per build type

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::ConventionContext;
use crate::error::{ConventionApplicationError, Result};
use crate::module::DependencyResolution;
use crate::repository::{RepositoryGuard, RepositoryRequest};

pub const VERSIONING: &str = "versioning";
pub const REPOSITORIES: &str = "repositories";
pub const DEPENDENCY_RESOLUTION: &str = "dependency-resolution";

/// A named piece of shared module configuration.
#[async_trait]
pub trait Convention: Send + Sync {
    /// Stable name used to track application within a context.
    fn name(&self) -> &str;

    async fn apply(&self, context: &mut ConventionContext) -> Result<()>;
}

/// Sets the module group and its effective version.
#[derive(Debug, Clone, Default)]
pub struct VersioningConvention {
    default_group: Option<String>,
}

impl VersioningConvention {
    pub fn new(default_group: Option<String>) -> Self {
        Self { default_group }
    }
}

#[async_trait]
impl Convention for VersioningConvention {
    fn name(&self) -> &str {
        VERSIONING
    }

    async fn apply(&self, context: &mut ConventionContext) -> Result<()> {
        let base = context.module().version.trim().to_string();
        if base.is_empty() {
            return Err(ConventionApplicationError::Convention {
                module: context.module_name().to_string(),
                convention: VERSIONING.to_string(),
                reason: "module declares an empty version".to_string(),
            });
        }

        let version = match context.build_type().version_suffix() {
            Some(suffix) if !base.ends_with(suffix) => format!("{base}{suffix}"),
            _ => base,
        };
        let group = context
            .module()
            .group
            .clone()
            .or_else(|| self.default_group.clone());

        let config = context.configuration_mut();
        config.version = Some(version);
        config.group = group;
        Ok(())
    }
}

/// Resolves every configured repository admitted by the build type.
#[derive(Debug, Clone)]
pub struct RepositoriesConvention {
    guard: RepositoryGuard,
    repositories: Vec<RepositoryRequest>,
}

impl RepositoriesConvention {
    pub fn new(guard: RepositoryGuard, repositories: Vec<RepositoryRequest>) -> Self {
        Self {
            guard,
            repositories,
        }
    }
}

#[async_trait]
impl Convention for RepositoriesConvention {
    fn name(&self) -> &str {
        REPOSITORIES
    }

    async fn apply(&self, context: &mut ConventionContext) -> Result<()> {
        let build_type = context.build_type();

        for request in self.repositories.iter().filter(|r| r.accepts.admits(build_type)) {
            let resolved = self.guard.resolve(request).await.map_err(|source| {
                ConventionApplicationError::Repository {
                    module: context.module_name().to_string(),
                    source,
                }
            })?;
            context.configuration_mut().add_repository(resolved);
        }

        Ok(())
    }
}

/// Applies the dependency-resolution policy for the build type.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyResolutionConvention;

#[async_trait]
impl Convention for DependencyResolutionConvention {
    fn name(&self) -> &str {
        DEPENDENCY_RESOLUTION
    }

    async fn apply(&self, context: &mut ConventionContext) -> Result<()> {
        let policy = DependencyResolution::for_build_type(context.build_type());
        context.configuration_mut().dependency_resolution = Some(policy);
        Ok(())
    }
}

/// The conventions every plugin applies, in order.
pub fn shared_conventions(
    default_group: Option<String>,
    guard: RepositoryGuard,
    repositories: Vec<RepositoryRequest>,
) -> Vec<Arc<dyn Convention>> {
    vec![
        Arc::new(VersioningConvention::new(default_group)),
        Arc::new(RepositoriesConvention::new(guard, repositories)),
        Arc::new(DependencyResolutionConvention),
    ]
}
