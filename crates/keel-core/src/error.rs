//! Error taxonomy for convention application.

use crate::build_type::UnknownBuildType;
use crate::repository::GuardError;

/// Failure while applying conventions to a module.
///
/// Any variant raised during shared setup means the plugin variant hook
/// never ran for that module.
#[derive(Debug, thiserror::Error)]
pub enum ConventionApplicationError {
    #[error("module '{module}': {source}")]
    UnknownBuildType {
        module: String,
        #[source]
        source: UnknownBuildType,
    },

    #[error("module '{module}': {source}")]
    Repository {
        module: String,
        #[source]
        source: GuardError,
    },

    #[error("module '{module}': convention '{convention}' failed: {reason}")]
    Convention {
        module: String,
        convention: String,
        reason: String,
    },

    #[error("module '{module}': plugin '{plugin}' failed: {reason}")]
    Variant {
        module: String,
        plugin: String,
        reason: String,
    },
}

impl ConventionApplicationError {
    /// Whether re-running the application may succeed unchanged.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ConventionApplicationError::Repository { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }

    pub fn module(&self) -> &str {
        match self {
            ConventionApplicationError::UnknownBuildType { module, .. }
            | ConventionApplicationError::Repository { module, .. }
            | ConventionApplicationError::Convention { module, .. }
            | ConventionApplicationError::Variant { module, .. } => module,
        }
    }
}

/// Result type for convention application.
pub type Result<T> = std::result::Result<T, ConventionApplicationError>;
