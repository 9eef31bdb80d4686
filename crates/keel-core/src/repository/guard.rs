//! Recoverable/fatal classification around repository resolution.
//!
//! Each call walks `Attempting -> {Succeeded, RecoverableFailed, FatalFailed}`.
//! The guard never retries: a recoverable failure is handed back to the
//! caller, which owns the retry policy.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use super::failure::{RecoverableRepositoryFailure, ResolutionFailure};
use super::{RepositoryRequest, RepositoryResolver, ResolvedRepository};

/// Outcome class of a failed resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Transient: the same call may succeed later.
    Recoverable,
    /// Retrying is futile without a configuration change.
    Fatal,
}

/// Per-attempt state of a single guarded resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Attempting,
    Succeeded,
    RecoverableFailed,
    FatalFailed,
}

impl ResolutionState {
    /// Whether the overall build may re-enter `Attempting` from this state.
    pub fn allows_reattempt(&self) -> bool {
        matches!(self, ResolutionState::RecoverableFailed)
    }
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolutionState::Attempting => "attempting",
            ResolutionState::Succeeded => "succeeded",
            ResolutionState::RecoverableFailed => "recoverable_failed",
            ResolutionState::FatalFailed => "fatal_failed",
        };
        f.write_str(name)
    }
}

/// Classify a resolver failure.
///
/// Timeouts, connection resets and HTTP 5xx are recoverable. Authentication
/// failures, malformed URLs, HTTP 4xx and anything unlisted are fatal.
pub fn classify_failure(failure: &ResolutionFailure) -> FailureClass {
    match failure {
        ResolutionFailure::Timeout { .. } | ResolutionFailure::ConnectionReset { .. } => {
            FailureClass::Recoverable
        }
        ResolutionFailure::Http { status, .. } if (500..600).contains(status) => {
            FailureClass::Recoverable
        }
        ResolutionFailure::Http { .. }
        | ResolutionFailure::Authentication { .. }
        | ResolutionFailure::MalformedUrl { .. }
        | ResolutionFailure::Transport { .. } => FailureClass::Fatal,
    }
}

/// Error surfaced by [`RepositoryGuard::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    #[error(transparent)]
    Recoverable(#[from] RecoverableRepositoryFailure),

    /// The resolver's own failure, passed through untouched.
    #[error(transparent)]
    Fatal(ResolutionFailure),
}

impl GuardError {
    pub fn is_recoverable(&self) -> bool {
        self.state().allows_reattempt()
    }

    pub fn state(&self) -> ResolutionState {
        match self {
            GuardError::Recoverable(_) => ResolutionState::RecoverableFailed,
            GuardError::Fatal(_) => ResolutionState::FatalFailed,
        }
    }
}

/// Wraps a [`RepositoryResolver`] and classifies its failures.
#[derive(Clone)]
pub struct RepositoryGuard {
    resolver: Arc<dyn RepositoryResolver>,
}

impl RepositoryGuard {
    pub fn new(resolver: Arc<dyn RepositoryResolver>) -> Self {
        Self { resolver }
    }

    /// Resolve one repository, classifying any failure.
    pub async fn resolve(
        &self,
        request: &RepositoryRequest,
    ) -> Result<ResolvedRepository, GuardError> {
        debug!(repository = %request.name, state = %ResolutionState::Attempting, "Resolving repository");

        match self.resolver.resolve(request).await {
            Ok(resolved) => {
                debug!(repository = %request.name, state = %ResolutionState::Succeeded, "Repository resolved");
                Ok(resolved)
            }
            Err(failure) => {
                let message = failure.to_string();
                let err = match classify_failure(&failure) {
                    FailureClass::Recoverable => {
                        GuardError::Recoverable(RecoverableRepositoryFailure::new(
                            format!("repository '{}' is temporarily unavailable", request.name),
                            failure,
                        ))
                    }
                    FailureClass::Fatal => GuardError::Fatal(failure),
                };
                warn!(
                    repository = %request.name,
                    state = %err.state(),
                    error = %message,
                    "Repository resolution failed"
                );
                Err(err)
            }
        }
    }
}

impl fmt::Debug for RepositoryGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryGuard").finish_non_exhaustive()
    }
}
