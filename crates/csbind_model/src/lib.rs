//! Language-neutral model of the native API surface that bindings are
//! generated from.
//!
//! The model is an arena: packages and classes live in flat vectors and
//! refer to each other through [`PackageId`] and [`ClassId`]. It is built
//! once, either programmatically through [`ModelBuilder`] or from a YAML
//! description through [`parse_model`], and is read-only afterwards.

pub mod builder;
pub mod error;
pub mod loader;
pub mod model;
pub mod types;

pub use builder::ModelBuilder;
pub use error::{ModelError, ModelResult};
pub use loader::parse_model;
pub use model::{
    Ancestors, Class, ClassId, ClassModel, Function, FunctionIndex, FunctionKind, Package,
    PackageId, Param, Property,
};
pub use types::TypeRef;
