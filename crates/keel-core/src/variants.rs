//! Built-in plugin variants.

use crate::context::ConventionContext;
use crate::error::{ConventionApplicationError, Result};
use crate::module::Publication;
use crate::plugin::PluginVariant;
use crate::repository::RepositoryAccepts;

pub const LIBRARY: &str = "library";
pub const PUBLISHED_LIBRARY: &str = "published-library";

/// Plain library: compiled, not exported, not published.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibraryVariant;

impl PluginVariant for LibraryVariant {
    fn id(&self) -> &str {
        LIBRARY
    }

    fn apply_implementation(&self, context: &mut ConventionContext) -> Result<()> {
        context.configuration_mut().apply_plugin("java");
        Ok(())
    }
}

/// Library that exports its API dependencies and publishes artifacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublishedLibraryVariant;

impl PublishedLibraryVariant {
    fn failure(context: &ConventionContext, reason: &str) -> ConventionApplicationError {
        ConventionApplicationError::Variant {
            module: context.module_name().to_string(),
            plugin: PUBLISHED_LIBRARY.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl PluginVariant for PublishedLibraryVariant {
    fn id(&self) -> &str {
        PUBLISHED_LIBRARY
    }

    fn apply_implementation(&self, context: &mut ConventionContext) -> Result<()> {
        let build_type = context.build_type();
        let config = context.configuration();

        let coordinates = config
            .coordinates()
            .ok_or_else(|| Self::failure(context, "publishing needs both a group and a version"))?;

        // Snapshot builds go to a snapshot-capable repository, stable builds
        // to a release-capable one; `all` repositories serve either.
        let target = config
            .repositories
            .iter()
            .find(|r| r.accepts.admits(build_type) && r.accepts != RepositoryAccepts::All)
            .or_else(|| config.repositories.iter().find(|r| r.accepts == RepositoryAccepts::All))
            .ok_or_else(|| Self::failure(context, "no resolved repository accepts this build type"))?;

        let publication = Publication {
            repository: target.name.clone(),
            url: target.url.clone(),
            coordinates,
        };

        let config = context.configuration_mut();
        config.apply_plugin("java-library");
        config.apply_plugin("maven-publish");
        config.publication = Some(publication);
        Ok(())
    }
}
