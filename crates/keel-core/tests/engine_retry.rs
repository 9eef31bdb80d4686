//! Caller-side retry of recoverable repository failures through the engine.

use std::sync::Arc;

use keel_core::fakes::ScriptedResolver;
use keel_core::{
    BuildEngine, ConventionApplicationError, EngineError, GuardError, Manifest, ModuleDescriptor,
    PluginRegistry, ResolutionFailure, RetryPolicy,
};

const MANIFEST: &str = r#"
[project]
group = "io.example"

[[repositories]]
name = "central"
url = "https://repo1.maven.org/maven2"

[[repositories]]
name = "snapshots"
url = "https://repo.example.com/snapshots"
accepts = "snapshots"
"#;

fn engine(resolver: Arc<ScriptedResolver>, attempts: u32) -> BuildEngine {
    let manifest = Manifest::from_toml_str(MANIFEST).expect("manifest");
    BuildEngine::new(PluginRegistry::builtin(), &manifest, resolver)
        .with_retry_policy(RetryPolicy::immediate(attempts))
}

fn reset() -> ResolutionFailure {
    ResolutionFailure::ConnectionReset {
        url: "https://repo1.maven.org/maven2".to_string(),
    }
}

/// Scenario: connection reset -> recoverable -> retried once -> success.
#[tokio::test]
async fn test_connection_reset_retried_once_then_succeeds() {
    let resolver = Arc::new(ScriptedResolver::new().then_fail(reset()));
    let module = ModuleDescriptor::new("data", "2.0.0", "snapshot", "published-library");

    let applied = engine(resolver.clone(), 3)
        .apply_module(&module)
        .await
        .expect("apply should recover");

    assert_eq!(applied.attempts, 2);
    // Attempt 1: central fails. Attempt 2: central + snapshots succeed.
    assert_eq!(resolver.calls(), 3);

    let config = applied.configuration;
    assert_eq!(config.version.as_deref(), Some("2.0.0-SNAPSHOT"));
    assert_eq!(config.repositories.len(), 2);
    assert_eq!(config.publication.unwrap().repository, "snapshots");
}

#[tokio::test]
async fn test_recoverable_failure_surfaces_when_attempts_run_out() {
    let resolver = Arc::new(ScriptedResolver::new().then_fail(reset()).then_fail(reset()));
    let module = ModuleDescriptor::new("data", "2.0.0", "release", "library");

    let err = engine(resolver, 2).apply_module(&module).await.unwrap_err();

    match err {
        EngineError::Application { attempts, source } => {
            assert_eq!(attempts, 2);
            assert!(source.is_recoverable());
            match source {
                ConventionApplicationError::Repository {
                    source: GuardError::Recoverable(failure),
                    ..
                } => assert_eq!(failure.into_cause(), Some(reset())),
                other => panic!("unexpected error: {other}"),
            }
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_fatal_failure_is_not_retried() {
    let resolver = Arc::new(ScriptedResolver::new().then_fail(ResolutionFailure::Http {
        url: "https://repo1.maven.org/maven2".to_string(),
        status: 403,
    }));
    let module = ModuleDescriptor::new("data", "2.0.0", "release", "library");

    let err = engine(resolver.clone(), 5).apply_module(&module).await.unwrap_err();

    let source = err.application_error().expect("application error");
    assert!(!source.is_recoverable());
    assert_eq!(resolver.calls(), 1);
}

#[tokio::test]
async fn test_modules_applied_independently() {
    let resolver = Arc::new(ScriptedResolver::new());
    let engine = Arc::new(engine(resolver, 1));
    let modules = vec![
        ModuleDescriptor::new("blob", "1.0.0", "snapshot", "library"),
        ModuleDescriptor::new("hibernate", "1.0.0", "nightly", "library"),
        ModuleDescriptor::new("signal", "1.0.0", "patch", "published-library"),
    ];

    let outcomes = engine.apply_all(modules).await;

    assert!(outcomes[0].is_ok());
    assert!(outcomes[1].is_err());
    let signal = &outcomes[2].as_ref().unwrap().configuration;
    assert_eq!(signal.version.as_deref(), Some("1.0.0"));
    // Patch builds skip the snapshot-only repository.
    assert_eq!(signal.repositories.len(), 1);
}
