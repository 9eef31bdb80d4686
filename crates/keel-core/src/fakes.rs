//! In-memory fakes for the plugin lifecycle (testing only)
//!
//! Provides a scripted repository resolver, a hook-counting plugin variant
//! and conventions that count or fail, all without network access.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::context::ConventionContext;
use crate::convention::Convention;
use crate::error::{ConventionApplicationError, Result};
use crate::plugin::PluginVariant;
use crate::repository::{
    RepositoryRequest, RepositoryResolver, ResolutionFailure, ResolvedRepository,
};

// ---------------------------------------------------------------------------
// ScriptedResolver
// ---------------------------------------------------------------------------

/// Resolver that replays queued failures, then succeeds.
#[derive(Debug, Default)]
pub struct ScriptedResolver {
    failures: Mutex<VecDeque<ResolutionFailure>>,
    calls: AtomicUsize,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next call with `failure`. Calls beyond the script succeed.
    pub fn then_fail(self, failure: ResolutionFailure) -> Self {
        self.failures.lock().unwrap().push_back(failure);
        self
    }

    /// Number of `resolve` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepositoryResolver for ScriptedResolver {
    async fn resolve(
        &self,
        request: &RepositoryRequest,
    ) -> std::result::Result<ResolvedRepository, ResolutionFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failures.lock().unwrap().pop_front() {
            Some(failure) => Err(failure),
            None => Ok(ResolvedRepository::from_request(request)),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingVariant
// ---------------------------------------------------------------------------

/// Variant that records each hook invocation and applies its own id.
#[derive(Debug)]
pub struct RecordingVariant {
    id: String,
    calls: AtomicUsize,
    seen_conventions: Mutex<Vec<Vec<String>>>,
}

impl RecordingVariant {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            calls: AtomicUsize::new(0),
            seen_conventions: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Conventions in effect at each hook invocation.
    pub fn seen_conventions(&self) -> Vec<Vec<String>> {
        self.seen_conventions.lock().unwrap().clone()
    }
}

impl PluginVariant for RecordingVariant {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply_implementation(&self, context: &mut ConventionContext) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_conventions
            .lock()
            .unwrap()
            .push(context.configuration().conventions.clone());
        context.configuration_mut().apply_plugin(&self.id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Conventions
// ---------------------------------------------------------------------------

/// Convention that counts how often its body runs.
///
/// Each run appends a `<name>-marker` directive without deduplication, so a
/// second run would be visible in the module configuration.
#[derive(Debug)]
pub struct CountingConvention {
    name: String,
    calls: AtomicUsize,
}

impl CountingConvention {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Convention for CountingConvention {
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, context: &mut ConventionContext) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        context
            .configuration_mut()
            .plugins
            .push(format!("{}-marker", self.name));
        Ok(())
    }
}

/// Convention that always fails.
#[derive(Debug)]
pub struct FailingConvention {
    name: String,
}

impl FailingConvention {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl Convention for FailingConvention {
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, context: &mut ConventionContext) -> Result<()> {
        Err(ConventionApplicationError::Convention {
            module: context.module_name().to_string(),
            convention: self.name.clone(),
            reason: "scripted failure".to_string(),
        })
    }
}
