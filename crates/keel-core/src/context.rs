//! Per-module state threaded through one plugin application.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::build_type::BuildType;
use crate::convention::Convention;
use crate::error::Result;
use crate::module::{ModuleConfiguration, ModuleDescriptor};
use crate::obs;

/// State for a single `apply` run on a single module.
///
/// Owned by exactly one application run and dropped when it completes; it
/// is never shared between modules.
#[derive(Debug)]
pub struct ConventionContext {
    run_id: Uuid,
    module: ModuleDescriptor,
    build_type: BuildType,
    applied: BTreeSet<String>,
    configuration: ModuleConfiguration,
}

impl ConventionContext {
    pub fn new(module: ModuleDescriptor, build_type: BuildType) -> Self {
        let configuration = ModuleConfiguration::new(module.name.clone(), build_type);
        Self {
            run_id: Uuid::new_v4(),
            module,
            build_type,
            applied: BTreeSet::new(),
            configuration,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn module(&self) -> &ModuleDescriptor {
        &self.module
    }

    pub fn module_name(&self) -> &str {
        &self.module.name
    }

    pub fn build_type(&self) -> BuildType {
        self.build_type
    }

    pub fn configuration(&self) -> &ModuleConfiguration {
        &self.configuration
    }

    pub fn configuration_mut(&mut self) -> &mut ModuleConfiguration {
        &mut self.configuration
    }

    pub fn is_applied(&self, convention: &str) -> bool {
        self.applied.contains(convention)
    }

    /// Apply a shared convention unless it already ran in this context.
    ///
    /// Returns `Ok(false)` when the convention was skipped. A convention is
    /// only marked applied once it succeeded.
    pub(crate) async fn apply_convention(&mut self, convention: &dyn Convention) -> Result<bool> {
        let name = convention.name().to_string();
        if self.is_applied(&name) {
            obs::emit_convention_skipped(&self.module.name, &name);
            return Ok(false);
        }

        convention.apply(self).await?;

        self.configuration.conventions.push(name.clone());
        self.applied.insert(name.clone());
        obs::emit_convention_applied(&self.module.name, &name);
        Ok(true)
    }

    /// Consume the context, yielding the module configuration.
    pub fn into_configuration(self) -> ModuleConfiguration {
        self.configuration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::CountingConvention;

    fn context() -> ConventionContext {
        ConventionContext::new(
            ModuleDescriptor::new("blob", "1.0.0", "snapshot", "library"),
            BuildType::Snapshot,
        )
    }

    #[tokio::test]
    async fn test_convention_applied_once_per_context() {
        let mut ctx = context();
        let convention = CountingConvention::new("encoding");

        assert!(ctx.apply_convention(&convention).await.unwrap());
        let once = ctx.configuration().clone();

        assert!(!ctx.apply_convention(&convention).await.unwrap());
        assert_eq!(convention.calls(), 1);
        assert_eq!(ctx.configuration(), &once);
        assert!(ctx.is_applied("encoding"));
    }

    #[tokio::test]
    async fn test_fresh_context_has_nothing_applied() {
        let ctx = context();
        assert!(!ctx.is_applied("versioning"));
        assert!(ctx.configuration().conventions.is_empty());
        assert_eq!(ctx.configuration().build_type, BuildType::Snapshot);
        assert_eq!(ctx.module_name(), "blob");
    }

    #[test]
    fn test_run_ids_are_unique() {
        assert_ne!(context().run_id(), context().run_id());
    }
}
