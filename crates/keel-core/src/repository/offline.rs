//! Resolver that accepts every well-formed repository without touching the
//! network. Used by `keel apply --offline`.

use async_trait::async_trait;

use super::{RepositoryRequest, RepositoryResolver, ResolutionFailure, ResolvedRepository};

const SCHEMES: [&str; 3] = ["https://", "http://", "file://"];

#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineResolver;

#[async_trait]
impl RepositoryResolver for OfflineResolver {
    async fn resolve(
        &self,
        request: &RepositoryRequest,
    ) -> Result<ResolvedRepository, ResolutionFailure> {
        let has_host = SCHEMES
            .iter()
            .find_map(|scheme| request.url.strip_prefix(scheme))
            .is_some_and(|rest| !rest.is_empty());

        if !has_host {
            return Err(ResolutionFailure::MalformedUrl {
                url: request.url.clone(),
                reason: "expected an http(s) or file URL".to_string(),
            });
        }

        Ok(ResolvedRepository::from_request(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_accepts_well_formed_urls() {
        let request = RepositoryRequest::new("central", "https://repo1.maven.org/maven2");
        let resolved = OfflineResolver.resolve(&request).await.unwrap();
        assert_eq!(resolved.name, "central");
        assert_eq!(resolved.url, request.url);
    }

    #[tokio::test]
    async fn test_offline_rejects_malformed_urls() {
        for url in ["repo1.maven.org", "https://", "ftp://mirror"] {
            let request = RepositoryRequest::new("bad", url);
            let err = OfflineResolver.resolve(&request).await.unwrap_err();
            assert!(matches!(err, ResolutionFailure::MalformedUrl { .. }), "{url}");
        }
    }
}
