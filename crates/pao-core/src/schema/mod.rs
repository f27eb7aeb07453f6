//! Schema compilation.
//!
//! Translates one [`ModelDefinition`](crate::model::ModelDefinition) into the
//! validation document, indexes, and edge collections the database needs.

mod compiler;
mod document;

pub use compiler::{CompiledSchema, SchemaCompiler};
pub use document::{
    CollectionSchema, EdgeDefinition, IndexSpec, JsonType, PropertySchema, SchemaRule,
};
