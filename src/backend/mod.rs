//! Backend adapters.
//!
//! An adapter turns its parsing library's values into [`DocumentNode`]s and
//! drives a [`DocumentReader`] over them. Nothing outside this module names a
//! parsing library's types.
//!
//! [`DocumentNode`]: crate::DocumentNode
//! [`DocumentReader`]: crate::DocumentReader

pub mod json;
pub mod yaml;

pub use json::JsonBackend;
pub use yaml::YamlBackend;
