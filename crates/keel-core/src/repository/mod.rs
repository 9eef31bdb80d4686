//! Remote dependency repositories and the guard around their resolution.
//!
//! Resolution itself belongs to an external collaborator implementing
//! [`RepositoryResolver`]. This module only defines the request/response
//! shapes, the typed failures a resolver may report, and the
//! [`RepositoryGuard`] that sorts those failures into recoverable and fatal.

pub mod failure;
pub mod guard;
pub mod offline;

pub use failure::{InvalidFailure, RecoverableRepositoryFailure, ResolutionFailure};
pub use guard::{classify_failure, FailureClass, GuardError, RepositoryGuard, ResolutionState};
pub use offline::OfflineResolver;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::build_type::BuildType;

/// Which build types a repository serves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryAccepts {
    /// Stable artifacts only (patch and release builds).
    Releases,
    /// Snapshot artifacts only.
    Snapshots,
    #[default]
    All,
}

impl RepositoryAccepts {
    pub fn admits(&self, build_type: BuildType) -> bool {
        match self {
            RepositoryAccepts::Releases => build_type.is_stable(),
            RepositoryAccepts::Snapshots => !build_type.is_stable(),
            RepositoryAccepts::All => true,
        }
    }
}

/// Reference to credentials held in environment variables.
///
/// Only the variable names travel through configuration; the resolver reads
/// the values at call time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsRef {
    pub username_env: String,
    pub password_env: String,
}

/// Repository descriptor handed to the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRequest {
    /// Logical repository name (e.g. `central`).
    pub name: String,

    /// Base URL of the repository.
    pub url: String,

    /// Build types this repository serves.
    #[serde(default)]
    pub accepts: RepositoryAccepts,

    /// Optional credentials reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<CredentialsRef>,
}

impl RepositoryRequest {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            accepts: RepositoryAccepts::All,
            credentials: None,
        }
    }

    pub fn accepting(mut self, accepts: RepositoryAccepts) -> Self {
        self.accepts = accepts;
        self
    }

    pub fn with_credentials(mut self, username_env: &str, password_env: &str) -> Self {
        self.credentials = Some(CredentialsRef {
            username_env: username_env.to_string(),
            password_env: password_env.to_string(),
        });
        self
    }
}

/// A repository the resolver confirmed as usable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedRepository {
    pub name: String,
    pub url: String,
    pub accepts: RepositoryAccepts,
}

impl ResolvedRepository {
    pub fn from_request(request: &RepositoryRequest) -> Self {
        Self {
            name: request.name.clone(),
            url: request.url.clone(),
            accepts: request.accepts,
        }
    }
}

/// External collaborator that resolves repository descriptors.
///
/// Implementations own their transport and timeout configuration; the guard
/// adds none of its own.
#[async_trait]
pub trait RepositoryResolver: Send + Sync {
    async fn resolve(
        &self,
        request: &RepositoryRequest,
    ) -> Result<ResolvedRepository, ResolutionFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_admits_by_stability() {
        assert!(RepositoryAccepts::Snapshots.admits(BuildType::Snapshot));
        assert!(!RepositoryAccepts::Snapshots.admits(BuildType::Patch));
        assert!(!RepositoryAccepts::Releases.admits(BuildType::Snapshot));
        assert!(RepositoryAccepts::Releases.admits(BuildType::Patch));
        assert!(RepositoryAccepts::Releases.admits(BuildType::Release));
        for build_type in BuildType::ALL {
            assert!(RepositoryAccepts::All.admits(build_type));
        }
    }

    #[test]
    fn test_request_builder() {
        let request = RepositoryRequest::new("internal", "https://repo.example.com/maven")
            .accepting(RepositoryAccepts::Snapshots)
            .with_credentials("REPO_USER", "REPO_PASS");

        assert_eq!(request.accepts, RepositoryAccepts::Snapshots);
        let creds = request.credentials.expect("credentials set");
        assert_eq!(creds.username_env, "REPO_USER");
        assert_eq!(creds.password_env, "REPO_PASS");
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let request: RepositoryRequest =
            serde_json::from_str(r#"{"name":"central","url":"https://repo1.maven.org/maven2"}"#)
                .unwrap();
        assert_eq!(request.accepts, RepositoryAccepts::All);
        assert!(request.credentials.is_none());
    }
}
