//! Workspace manifest (`keel.toml`) and environment overrides.
//!
//! ```toml
//! [project]
//! group = "io.example"
//! build_type = "snapshot"
//!
//! [[repositories]]
//! name = "central"
//! url = "https://repo1.maven.org/maven2"
//!
//! [retry]
//! max_attempts = 3
//!
//! [[modules]]
//! name = "blob"
//! version = "1.4.0"
//! plugin = "published-library"
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::module::ModuleDescriptor;
use crate::repository::RepositoryRequest;
use crate::retry::RetryPolicy;
use crate::variants::LIBRARY;

/// Environment variable that overrides the version token of every module
/// for one build invocation. Read by the CLI and passed to
/// [`Manifest::module_descriptors_with`].
pub const BUILD_TYPE_ENV: &str = "KEEL_BUILD_TYPE";

/// Default manifest file name.
pub const MANIFEST_FILE: &str = "keel.toml";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read manifest {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("duplicate {kind} '{name}' in manifest")]
    Duplicate { kind: &'static str, name: String },

    #[error("module not found in manifest: {0}")]
    UnknownModule(String),
}

/// Project-wide defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSettings {
    #[serde(default)]
    pub group: Option<String>,

    /// Default version token for modules that declare none.
    #[serde(default = "default_build_type")]
    pub build_type: String,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            group: None,
            build_type: default_build_type(),
        }
    }
}

fn default_build_type() -> String {
    "snapshot".to_string()
}

fn default_plugin() -> String {
    LIBRARY.to_string()
}

/// A `[[modules]]` entry before defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEntry {
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    pub version: String,
    #[serde(default)]
    pub build_type: Option<String>,
    #[serde(default = "default_plugin")]
    pub plugin: String,
}

/// Parsed `keel.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub project: ProjectSettings,

    #[serde(default)]
    pub repositories: Vec<RepositoryRequest>,

    #[serde(default)]
    pub retry: RetryPolicy,

    #[serde(default)]
    pub modules: Vec<ModuleEntry>,
}

impl Manifest {
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let manifest: Manifest = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        let mut names = BTreeSet::new();
        for module in &self.modules {
            if !names.insert(module.name.as_str()) {
                return Err(SettingsError::Duplicate {
                    kind: "module",
                    name: module.name.clone(),
                });
            }
        }

        let mut names = BTreeSet::new();
        for repository in &self.repositories {
            if !names.insert(repository.name.as_str()) {
                return Err(SettingsError::Duplicate {
                    kind: "repository",
                    name: repository.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Module descriptors with defaults and an explicit token override.
    pub fn module_descriptors_with(&self, override_token: Option<&str>) -> Vec<ModuleDescriptor> {
        self.modules
            .iter()
            .map(|entry| ModuleDescriptor {
                name: entry.name.clone(),
                group: entry.group.clone(),
                version: entry.version.clone(),
                build_type: override_token
                    .map(str::to_string)
                    .or_else(|| entry.build_type.clone())
                    .unwrap_or_else(|| self.project.build_type.clone()),
                plugin: entry.plugin.clone(),
            })
            .collect()
    }

    /// Keep only the named modules, in the order given.
    pub fn select(
        descriptors: Vec<ModuleDescriptor>,
        names: &[String],
    ) -> Result<Vec<ModuleDescriptor>, SettingsError> {
        if names.is_empty() {
            return Ok(descriptors);
        }
        names
            .iter()
            .map(|name| {
                descriptors
                    .iter()
                    .find(|d| &d.name == name)
                    .cloned()
                    .ok_or_else(|| SettingsError::UnknownModule(name.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RepositoryAccepts;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MANIFEST: &str = r#"
[project]
group = "io.example"
build_type = "release"

[[repositories]]
name = "central"
url = "https://repo1.maven.org/maven2"

[[repositories]]
name = "snapshots"
url = "https://repo.example.com/snapshots"
accepts = "snapshots"
credentials = { username_env = "REPO_USER", password_env = "REPO_PASS" }

[retry]
max_attempts = 4

[[modules]]
name = "blob"
version = "1.4.0"
plugin = "published-library"

[[modules]]
name = "signal"
version = "0.9.0"
build_type = "patch"
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::from_toml_str(MANIFEST).unwrap();
        assert_eq!(manifest.project.group.as_deref(), Some("io.example"));
        assert_eq!(manifest.repositories.len(), 2);
        assert_eq!(manifest.repositories[1].accepts, RepositoryAccepts::Snapshots);
        assert!(manifest.repositories[1].credentials.is_some());
        assert_eq!(manifest.retry.max_attempts, 4);
        assert_eq!(manifest.modules[1].plugin, "library");
    }

    #[test]
    fn test_module_defaults_and_override() {
        let manifest = Manifest::from_toml_str(MANIFEST).unwrap();

        let descriptors = manifest.module_descriptors_with(None);
        assert_eq!(descriptors[0].build_type, "release");
        assert_eq!(descriptors[1].build_type, "patch");

        let overridden = manifest.module_descriptors_with(Some("snapshot"));
        assert!(overridden.iter().all(|d| d.build_type == "snapshot"));
    }

    #[test]
    fn test_empty_manifest_uses_defaults() {
        let manifest = Manifest::from_toml_str("").unwrap();
        assert_eq!(manifest.project.build_type, "snapshot");
        assert!(manifest.modules.is_empty());
        assert_eq!(manifest.retry, RetryPolicy::default());
    }

    #[test]
    fn test_duplicate_module_rejected() {
        let content = r#"
[[modules]]
name = "blob"
version = "1.0.0"

[[modules]]
name = "blob"
version = "2.0.0"
"#;
        let err = Manifest::from_toml_str(content).unwrap_err();
        assert!(matches!(err, SettingsError::Duplicate { kind: "module", .. }));
    }

    #[test]
    fn test_select_modules() {
        let manifest = Manifest::from_toml_str(MANIFEST).unwrap();
        let all = manifest.module_descriptors_with(None);

        let picked = Manifest::select(all.clone(), &["signal".to_string()]).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].name, "signal");

        assert_eq!(Manifest::select(all.clone(), &[]).unwrap().len(), 2);

        let err = Manifest::select(all, &["hibernate".to_string()]).unwrap_err();
        assert!(matches!(err, SettingsError::UnknownModule(name) if name == "hibernate"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();

        let manifest = Manifest::load(file.path()).unwrap();
        assert_eq!(manifest.modules.len(), 2);

        let missing = Manifest::load(Path::new("/nonexistent/keel.toml")).unwrap_err();
        assert!(matches!(missing, SettingsError::Io { .. }));
    }
}
