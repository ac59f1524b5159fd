//! # gltf-ext: Extension Registry for Schema-Extensible Documents
//!
//! glTF documents pair a fixed core schema with an open-ended set of named
//! extensions whose shape the core parser cannot know in advance. This crate
//! lets applications register, ahead of time, how each extension becomes a
//! typed value, and wires those registrations into document parsing.
//!
//! ## Features
//!
//! - **Extension registry**: (host kind, extension name) → parser capability,
//!   either custom logic or a simple structural binding
//! - **Property-type registry**: (host kind, property name) → declared type for
//!   lazy, on-demand conversion
//! - **Backend-agnostic document nodes**: a sum-typed snapshot with total
//!   indexing and serde-based structural conversion
//! - **Interception hook**: unrecognized fields are resolved against the
//!   registries and stored in the host's lazily allocated property bag
//! - **Backends**: serde_json and serde_yaml adapters
//!
//! ## Example
//!
//! ```
//! use gltf_ext::schema::{Root, RootExtensions};
//! use gltf_ext::{Extensible, Interceptor, JsonBackend, Registries};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize, PartialEq)]
//! struct MyCustomRootExtension {
//!     data: i32,
//! }
//!
//! // done once at application setup
//! let mut registries = Registries::new();
//! registries
//!     .extensions
//!     .register_simple::<RootExtensions, MyCustomRootExtension>("UNITY_my_custom_rootExtension");
//!
//! let text = r#"{
//!     "asset": { "version": "2.0" },
//!     "extensions": { "UNITY_my_custom_rootExtension": { "data": 1 } }
//! }"#;
//!
//! let mut interceptor = Interceptor::new(&registries);
//! let root: Root = JsonBackend::parse_str(&mut interceptor, text).unwrap();
//!
//! let extensions = root.extensions.as_ref().unwrap();
//! let custom = extensions
//!     .generic_properties()
//!     .and_then(|bag| bag.get_as::<MyCustomRootExtension>("UNITY_my_custom_rootExtension"));
//! assert_eq!(custom, Some(&MyCustomRootExtension { data: 1 }));
//! ```

// Core modules
pub mod error;
pub mod node;
pub mod host;
pub mod parser;
pub mod registry;
pub mod intercept;
pub mod reader;
pub mod config;

// Parsing backends
pub mod backend;

// Minimal glTF host schema
pub mod schema;

// Re-export key types
pub use error::{ConfigError, ConversionError, PropertyError, ReadError, RegistrationError};
pub use node::{DocumentNode, NodeDeserializer, Number, Scalar};
pub use host::{Extensible, HostKind, PropertyBag, PropertyValue};
pub use parser::{CustomParser, ExtensionValue, ParserCapability, SimpleBinding};
pub use registry::{DeclaredType, ExtensionRegistry, PropertyTypeRegistry, Registries};
pub use intercept::{ConversionFailure, Interceptor, UnrecognizedFieldSink};
pub use reader::{DocumentReader, HostSchema};
pub use config::{ExtensionConfig, FailurePolicy};
pub use backend::{JsonBackend, YamlBackend};
