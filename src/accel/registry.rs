//! Engine registry.

use super::software::SoftwareEngine;
use super::traits::{AcceleratorEngine, EngineProvider};
use crate::error::{AcceleratorInitError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Engine name the element opens unless configured otherwise.
pub const DEFAULT_ENGINE_NAME: &str = "codecServer";

/// Maps engine names to the providers that open them.
///
/// [`EngineRegistry::new`] registers the CPU reference engine under
/// [`DEFAULT_ENGINE_NAME`]; hardware backends and test doubles are added with
/// [`register`](Self::register).
pub struct EngineRegistry {
    providers: HashMap<String, Arc<dyn EngineProvider>>,
}

impl EngineRegistry {
    /// Create a registry with the built-in engines.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(DEFAULT_ENGINE_NAME, open_software);
        registry
    }

    /// Create a registry with no engines.
    pub fn empty() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register (or replace) the provider for `name`.
    pub fn register<P>(&mut self, name: &str, provider: P)
    where
        P: EngineProvider + 'static,
    {
        self.providers.insert(name.to_string(), Arc::new(provider));
    }

    /// Open the engine registered as `name`.
    pub fn open(
        &self,
        name: &str,
    ) -> std::result::Result<Box<dyn AcceleratorEngine>, AcceleratorInitError> {
        let provider = self
            .providers
            .get(name)
            .ok_or_else(|| AcceleratorInitError::EngineOpen {
                engine: name.to_string(),
                reason: "no engine registered under this name".into(),
            })?;

        provider
            .open(name)
            .map_err(|e| AcceleratorInitError::EngineOpen {
                engine: name.to_string(),
                reason: e.to_string(),
            })
    }

    /// Check if an engine name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// List registered engine names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Built-in engine providers

fn open_software(name: &str) -> Result<Box<dyn AcceleratorEngine>> {
    Ok(Box::new(SoftwareEngine::new(name)))
}

impl std::fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("engines", &self.names())
            .finish()
    }
}
