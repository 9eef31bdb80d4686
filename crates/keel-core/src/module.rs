//! Module descriptors (input) and module configuration (output).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::build_type::BuildType;
use crate::repository::ResolvedRepository;

/// A module as declared to the build, with defaults already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    /// Module identifier, unique within the workspace.
    pub name: String,

    /// Maven-style group; falls back to the project group when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Base version, without maturity suffix.
    pub version: String,

    /// Raw version token fed to the build-type classifier.
    pub build_type: String,

    /// Plugin variant id used to configure the module.
    pub plugin: String,
}

impl ModuleDescriptor {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        build_type: impl Into<String>,
        plugin: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            group: None,
            version: version.into(),
            build_type: build_type.into(),
            plugin: plugin.into(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// Dependency-resolution policy applied to a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyResolution {
    pub fail_on_version_conflict: bool,
    pub allow_dynamic_versions: bool,
    pub cache_changing_modules_secs: u64,
}

impl DependencyResolution {
    const DAY_SECS: u64 = 24 * 60 * 60;

    pub fn for_build_type(build_type: BuildType) -> Self {
        if build_type.is_stable() {
            Self {
                fail_on_version_conflict: true,
                allow_dynamic_versions: false,
                cache_changing_modules_secs: Self::DAY_SECS,
            }
        } else {
            Self {
                fail_on_version_conflict: true,
                allow_dynamic_versions: true,
                cache_changing_modules_secs: 0,
            }
        }
    }
}

/// Where a published module's artifacts go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    pub repository: String,
    pub url: String,
    pub coordinates: String,
}

/// Observable configuration of one module after convention application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfiguration {
    pub module: String,
    pub build_type: BuildType,
    pub group: Option<String>,

    /// Effective version, set by the versioning convention.
    pub version: Option<String>,

    pub repositories: Vec<ResolvedRepository>,
    pub dependency_resolution: Option<DependencyResolution>,

    /// Build-tool plugin directives, in application order.
    pub plugins: Vec<String>,

    pub publication: Option<Publication>,

    /// Shared conventions in effect, in application order.
    pub conventions: Vec<String>,
}

impl ModuleConfiguration {
    pub fn new(module: impl Into<String>, build_type: BuildType) -> Self {
        Self {
            module: module.into(),
            build_type,
            group: None,
            version: None,
            repositories: Vec::new(),
            dependency_resolution: None,
            plugins: Vec::new(),
            publication: None,
            conventions: Vec::new(),
        }
    }

    /// Add a plugin directive. Returns `false` if it was already present.
    pub fn apply_plugin(&mut self, plugin_id: &str) -> bool {
        if self.has_plugin(plugin_id) {
            return false;
        }
        self.plugins.push(plugin_id.to_string());
        true
    }

    pub fn has_plugin(&self, plugin_id: &str) -> bool {
        self.plugins.iter().any(|p| p == plugin_id)
    }

    /// Add a repository, keyed by name. Returns `false` on duplicates.
    pub fn add_repository(&mut self, repository: ResolvedRepository) -> bool {
        if self.repositories.iter().any(|r| r.name == repository.name) {
            return false;
        }
        self.repositories.push(repository);
        true
    }

    /// `group:module:version`, when both group and version are known.
    pub fn coordinates(&self) -> Option<String> {
        match (&self.group, &self.version) {
            (Some(group), Some(version)) => Some(format!("{}:{}:{}", group, self.module, version)),
            _ => None,
        }
    }

    /// SHA-256 of the canonical JSON encoding.
    pub fn digest(&self) -> Result<String, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(hex::encode(hasher.finalize()))
    }
}
