//! Plugin-id lookup.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::plugin::PluginVariant;
use crate::variants::{LibraryVariant, PublishedLibraryVariant};

/// Registered plugin variants keyed by id.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    variants: BTreeMap<String, Arc<dyn PluginVariant>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in `library` and `published-library`.
    pub fn builtin() -> Self {
        Self::new()
            .with(Arc::new(LibraryVariant))
            .with(Arc::new(PublishedLibraryVariant))
    }

    /// Register a variant, replacing any previous one with the same id.
    pub fn with(mut self, variant: Arc<dyn PluginVariant>) -> Self {
        self.variants.insert(variant.id().to_string(), variant);
        self
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn PluginVariant>> {
        self.variants.get(id).cloned()
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        self.variants.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry").field("ids", &self.ids()).finish()
    }
}
