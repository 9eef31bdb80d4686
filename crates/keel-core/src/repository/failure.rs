//! Typed resolution failures and the recoverable wrapper.

use std::error::Error;
use std::fmt;

/// Failure reported by a [`RepositoryResolver`](super::RepositoryResolver).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionFailure {
    #[error("timed out resolving {url}")]
    Timeout { url: String },

    #[error("connection reset while resolving {url}")]
    ConnectionReset { url: String },

    #[error("repository {url} answered HTTP {status}")]
    Http { url: String, status: u16 },

    #[error("authentication rejected by {url}")]
    Authentication { url: String },

    #[error("malformed repository URL {url:?}: {reason}")]
    MalformedUrl { url: String, reason: String },

    /// Any other transport-level error (DNS, TLS, refused connection).
    #[error("transport error resolving {url}: {reason}")]
    Transport { url: String, reason: String },
}

impl ResolutionFailure {
    /// URL of the repository the failure refers to.
    pub fn url(&self) -> &str {
        match self {
            ResolutionFailure::Timeout { url }
            | ResolutionFailure::ConnectionReset { url }
            | ResolutionFailure::Http { url, .. }
            | ResolutionFailure::Authentication { url }
            | ResolutionFailure::MalformedUrl { url, .. }
            | ResolutionFailure::Transport { url, .. } => url,
        }
    }
}

/// Rejected attempt to build a [`RecoverableRepositoryFailure`] with neither
/// a message nor a cause.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("recoverable repository failure needs a message or a cause")]
pub struct InvalidFailure;

/// Transient repository failure; retrying the same resolution may succeed.
///
/// Always carries a message, a cause, or both. The cause is owned outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoverableRepositoryFailure {
    message: Option<String>,
    cause: Option<ResolutionFailure>,
}

impl RecoverableRepositoryFailure {
    /// Build a failure from an optional message and an optional cause.
    ///
    /// A blank message counts as absent.
    pub fn try_new(
        message: Option<String>,
        cause: Option<ResolutionFailure>,
    ) -> Result<Self, InvalidFailure> {
        let message = message.filter(|m| !m.trim().is_empty());
        if message.is_none() && cause.is_none() {
            return Err(InvalidFailure);
        }
        Ok(Self { message, cause })
    }

    /// Wrap a cause with a message.
    pub fn new(message: impl Into<String>, cause: ResolutionFailure) -> Self {
        let message = message.into();
        Self {
            message: (!message.trim().is_empty()).then_some(message),
            cause: Some(cause),
        }
    }

    /// Wrap a cause with no extra message.
    pub fn from_cause(cause: ResolutionFailure) -> Self {
        Self {
            message: None,
            cause: Some(cause),
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn cause(&self) -> Option<&ResolutionFailure> {
        self.cause.as_ref()
    }

    /// Give up the wrapper and take the original cause back.
    pub fn into_cause(self) -> Option<ResolutionFailure> {
        self.cause
    }
}

impl fmt::Display for RecoverableRepositoryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.message, &self.cause) {
            (Some(message), Some(cause)) => write!(f, "{message}: {cause}"),
            (Some(message), None) => f.write_str(message),
            (None, Some(cause)) => write!(f, "recoverable repository failure: {cause}"),
            (None, None) => f.write_str("recoverable repository failure"),
        }
    }
}

impl Error for RecoverableRepositoryFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_ref().map(|c| c as &(dyn Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reset() -> ResolutionFailure {
        ResolutionFailure::ConnectionReset {
            url: "https://repo.example.com".to_string(),
        }
    }

    #[test]
    fn test_try_new_requires_message_or_cause() {
        assert_eq!(
            RecoverableRepositoryFailure::try_new(None, None),
            Err(InvalidFailure)
        );
        assert_eq!(
            RecoverableRepositoryFailure::try_new(Some("   ".to_string()), None),
            Err(InvalidFailure)
        );
    }

    #[test]
    fn test_try_new_message_only() {
        let failure =
            RecoverableRepositoryFailure::try_new(Some("mirror busy".to_string()), None).unwrap();
        assert_eq!(failure.message(), Some("mirror busy"));
        assert!(failure.cause().is_none());
        assert!(failure.source().is_none());
        assert_eq!(failure.to_string(), "mirror busy");
    }

    #[test]
    fn test_cause_is_exposed_as_source() {
        let failure = RecoverableRepositoryFailure::new("central unavailable", reset());
        let source = failure.source().expect("source present");
        assert_eq!(source.to_string(), reset().to_string());
        assert!(failure.to_string().starts_with("central unavailable: "));
        assert_eq!(failure.into_cause(), Some(reset()));
    }

    #[test]
    fn test_blank_message_falls_back_to_cause() {
        let failure = RecoverableRepositoryFailure::new("", reset());
        assert!(failure.message().is_none());
        assert!(failure.to_string().contains("connection reset"));
    }

    #[test]
    fn test_failure_url_accessor() {
        let failure = ResolutionFailure::Http {
            url: "https://repo.example.com".to_string(),
            status: 503,
        };
        assert_eq!(failure.url(), "https://repo.example.com");
    }
}
