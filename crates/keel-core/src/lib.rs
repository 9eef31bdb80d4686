//! Keel Core Library
//!
//! Convention-based build orchestration for multi-module library projects:
//! - classify each build invocation by maturity ([`BuildType`])
//! - guard repository resolution, separating recoverable from fatal failures
//! - apply shared conventions once per module, then hand over to a
//!   [`PluginVariant`] for the module-specific delta

pub mod build_type;
pub mod context;
pub mod convention;
pub mod engine;
pub mod error;
pub mod fakes;
pub mod module;
pub mod obs;
pub mod plugin;
pub mod registry;
pub mod repository;
pub mod retry;
pub mod settings;
pub mod telemetry;
pub mod variants;

pub use build_type::{BuildType, UnknownBuildType};
pub use context::ConventionContext;
pub use convention::{
    shared_conventions, Convention, DependencyResolutionConvention, RepositoriesConvention,
    VersioningConvention,
};
pub use engine::{AppliedModule, BuildEngine, EngineError};
pub use error::{ConventionApplicationError, Result};
pub use module::{DependencyResolution, ModuleConfiguration, ModuleDescriptor, Publication};
pub use plugin::{Classifier, ConventionPlugin, ConventionPluginBuilder, PluginVariant};
pub use registry::PluginRegistry;
pub use repository::{
    classify_failure, CredentialsRef, FailureClass, GuardError, InvalidFailure, OfflineResolver,
    RecoverableRepositoryFailure, RepositoryAccepts, RepositoryGuard, RepositoryRequest,
    RepositoryResolver, ResolutionFailure, ResolutionState, ResolvedRepository,
};
pub use retry::{retry_recoverable, Recoverable, RetryPolicy};
pub use settings::{Manifest, ModuleEntry, ProjectSettings, SettingsError, BUILD_TYPE_ENV, MANIFEST_FILE};
pub use telemetry::init_tracing;
pub use variants::{LibraryVariant, PublishedLibraryVariant, LIBRARY, PUBLISHED_LIBRARY};

/// Keel version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
