//! Explicit model registry.

use super::{DefinitionError, ModelDefinition};
use tracing::debug;

/// Ordered set of registered models.
///
/// Registration order is the declaration order used when generating
/// migrations; it is stable for the lifetime of the registry.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelDefinition>,
    reserved: Vec<String>,
}

impl ModelRegistry {
    /// Create an empty registry that reserves the bookkeeping collection.
    pub fn new() -> Self {
        Self {
            models: Vec::new(),
            reserved: vec![crate::migration::LEDGER_COLLECTION.to_string()],
        }
    }

    /// Register a model.
    ///
    /// Rejects duplicate model names, duplicate collection names, and
    /// reserved collection names.
    pub fn register(&mut self, model: ModelDefinition) -> Result<&mut Self, DefinitionError> {
        let collection = model.collection();
        if model.name.is_empty() || collection.is_empty() {
            return Err(DefinitionError::EmptyName);
        }

        if self.get(&model.name).is_some() {
            return Err(DefinitionError::DuplicateModel(model.name));
        }

        if self.reserved.iter().any(|r| *r == collection) {
            return Err(DefinitionError::ReservedCollection {
                collection,
                model: model.name,
            });
        }

        if let Some(existing) = self.models.iter().find(|m| m.collection() == collection) {
            return Err(DefinitionError::DuplicateCollection {
                collection,
                model: model.name,
                existing: existing.name.clone(),
            });
        }

        debug!(model = %model.name, collection = %collection, "registered model");
        self.models.push(model);
        Ok(self)
    }

    /// Register a model, consuming and returning the registry.
    pub fn with_model(mut self, model: ModelDefinition) -> Result<Self, DefinitionError> {
        self.register(model)?;
        Ok(self)
    }

    /// All models in registration order.
    pub fn discover(&self) -> &[ModelDefinition] {
        &self.models
    }

    /// Look up a model by name.
    pub fn get(&self, name: &str) -> Option<&ModelDefinition> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether no model is registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
