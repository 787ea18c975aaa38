//! Generator dispatch.
//!
//! Backends are registered by name; the dispatcher holds no knowledge of
//! their output format.

use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;

use crate::tree::Scope;

mod json;
mod xstate;

pub use json::JsonGenerator;
pub use xstate::XstateGenerator;

/// Analyzed scopes, keyed by logical path, in cache registration order.
pub type AnalyzedScopes = [(String, Arc<Scope>)];

#[derive(Debug, Error)]
#[error("Unknown generator `{0}`")]
pub struct UnknownGenerator(pub String);

#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    pub disable_callbacks: bool,
}

pub trait Generator {
    fn generate(&self, scopes: &AnalyzedScopes, opts: &GenerateOptions) -> String;
}

pub struct GeneratorRegistry {
    backends: IndexMap<String, Box<dyn Generator>>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        GeneratorRegistry {
            backends: IndexMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("json", Box::new(JsonGenerator));
        registry.register("xstate", Box::new(XstateGenerator));
        registry
    }

    pub fn register(&mut self, name: &str, backend: Box<dyn Generator>) {
        self.backends.insert(name.to_string(), backend);
    }

    pub fn generate(
        &self,
        name: &str,
        scopes: &AnalyzedScopes,
        opts: &GenerateOptions,
    ) -> Result<String, UnknownGenerator> {
        let backend = self
            .backends
            .get(name)
            .ok_or_else(|| UnknownGenerator(name.to_string()))?;
        Ok(backend.generate(scopes, opts))
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
#[path = "../tests/t_generate.rs"]
mod tests;
