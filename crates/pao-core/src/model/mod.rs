//! Declarative model definitions.
//!
//! Models describe one collection each: its fields, indexes, and outgoing
//! edges. They are registered explicitly in a [`ModelRegistry`], whose order
//! drives the order of generated migrations.

mod definition;
mod edge;
mod error;
mod field;
mod index;
mod naming;
mod registry;

pub use definition::{Level, ModelDefinition};
pub use edge::{edge_collection_name, EdgeDef, ModelRef};
pub use error::DefinitionError;
pub use field::{ElementType, FieldDef, FieldType};
pub use index::{IndexDef, IndexFields, IndexKind};
pub use naming::{default_collection_name, pluralize};
pub use registry::ModelRegistry;
