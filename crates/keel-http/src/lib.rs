//! HTTP repository resolver
//!
//! Implements [`RepositoryResolver`] on top of `reqwest`: a repository is
//! usable when its base URL answers a `HEAD` (or, if the server refuses
//! `HEAD`, a `GET`) with a success status. Transport errors and status codes
//! are reported as typed [`ResolutionFailure`]s; deciding which of them are
//! worth retrying is left to [`keel_core::RepositoryGuard`].

use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use async_trait::async_trait;
use keel_core::{RepositoryRequest, RepositoryResolver, ResolutionFailure, ResolvedRepository};
use reqwest::{Method, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResolverConfig {
    /// Per-request timeout
    pub timeout_secs: u64,
    /// Connect timeout
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpResolverConfig {
    fn default() -> Self {
        HttpResolverConfig {
            timeout_secs: std::env::var("KEEL_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            connect_timeout_secs: 10,
            user_agent: format!("keel/{}", keel_core::VERSION),
        }
    }
}

impl HttpResolverConfig {
    /// Create a config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }
}

#[derive(Debug, thiserror::Error)]
#[error("failed to build HTTP client: {0}")]
pub struct HttpResolverError(#[from] reqwest::Error);

/// `reqwest`-backed repository resolver
#[derive(Debug, Clone)]
pub struct HttpResolver {
    client: reqwest::Client,
}

impl HttpResolver {
    pub fn new(config: HttpResolverConfig) -> Result<Self, HttpResolverError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;
        Ok(HttpResolver { client })
    }

    /// Create a resolver from environment variables
    pub fn from_env() -> Result<Self, HttpResolverError> {
        Self::new(HttpResolverConfig::from_env())
    }

    async fn probe(
        &self,
        method: Method,
        url: &Url,
        request: &RepositoryRequest,
    ) -> Result<StatusCode, ResolutionFailure> {
        let mut builder = self.client.request(method, url.clone());
        if let Some(creds) = &request.credentials {
            let username = read_credential(&creds.username_env, &request.url)?;
            let password = read_credential(&creds.password_env, &request.url)?;
            builder = builder.basic_auth(username, Some(password));
        }

        builder
            .send()
            .await
            .map(|response| response.status())
            .map_err(|err| transport_failure(&request.url, &err))
    }
}

#[async_trait]
impl RepositoryResolver for HttpResolver {
    async fn resolve(
        &self,
        request: &RepositoryRequest,
    ) -> Result<ResolvedRepository, ResolutionFailure> {
        let url = parse_url(&request.url)?;

        let mut status = self.probe(Method::HEAD, &url, request).await?;
        if status == StatusCode::METHOD_NOT_ALLOWED {
            debug!(repository = %request.name, "HEAD not allowed, probing with GET");
            status = self.probe(Method::GET, &url, request).await?;
        }

        check_status(&request.url, status)?;
        debug!(repository = %request.name, status = status.as_u16(), "Repository reachable");
        Ok(ResolvedRepository::from_request(request))
    }
}

/// Parse a repository URL, accepting only http(s).
pub fn parse_url(raw: &str) -> Result<Url, ResolutionFailure> {
    let url = Url::parse(raw).map_err(|e| ResolutionFailure::MalformedUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ResolutionFailure::MalformedUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

/// Map a response status to success or a typed failure.
pub fn check_status(url: &str, status: StatusCode) -> Result<(), ResolutionFailure> {
    if status.is_success() || status.is_redirection() {
        return Ok(());
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ResolutionFailure::Authentication {
            url: url.to_string(),
        });
    }
    Err(ResolutionFailure::Http {
        url: url.to_string(),
        status: status.as_u16(),
    })
}

fn read_credential(var: &str, url: &str) -> Result<String, ResolutionFailure> {
    std::env::var(var).map_err(|_| {
        debug!(variable = %var, "Credential variable not set");
        ResolutionFailure::Authentication {
            url: url.to_string(),
        }
    })
}

fn transport_failure(url: &str, err: &reqwest::Error) -> ResolutionFailure {
    if err.is_timeout() {
        return ResolutionFailure::Timeout {
            url: url.to_string(),
        };
    }

    match dropped_connection(err) {
        Some(Dropped::TimedOut) => ResolutionFailure::Timeout {
            url: url.to_string(),
        },
        Some(Dropped::Reset) => ResolutionFailure::ConnectionReset {
            url: url.to_string(),
        },
        None => ResolutionFailure::Transport {
            url: url.to_string(),
            reason: err.to_string(),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dropped {
    Reset,
    TimedOut,
}

/// Walk the source chain for a connection the peer dropped mid-exchange.
///
/// Covers an RST (`ConnectionReset` and friends) as well as a clean close
/// before the response arrived, which hyper reports as an incomplete message.
fn dropped_connection(err: &reqwest::Error) -> Option<Dropped> {
    let mut source = err.source();
    while let Some(inner) = source {
        if let Some(io_err) = inner.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::UnexpectedEof => return Some(Dropped::Reset),
                io::ErrorKind::TimedOut => return Some(Dropped::TimedOut),
                _ => {}
            }
        }
        if let Some(hyper_err) = inner.downcast_ref::<hyper::Error>() {
            if hyper_err.is_incomplete_message() {
                return Some(Dropped::Reset);
            }
        }
        source = inner.source();
    }
    None
}
