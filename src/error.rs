//! Error types shared across the crate.
//!
//! Registry failures are reported as booleans by the plain `register*` API and
//! as [`RegistrationError`] by the `try_register*` variants. Structural
//! conversion of document nodes is the only hard failure in the core and is
//! reported as [`ConversionError`].

use std::fmt;
use std::path::PathBuf;

/// Structural conversion of a [`DocumentNode`](crate::DocumentNode) into a
/// requested shape failed.
///
/// `path` locates the offending node relative to the node the conversion
/// started from (`data`, `items.[2].name`). It is empty when the root node
/// itself did not match.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Conversion error{}: {message}", display_path(.path))]
pub struct ConversionError {
    pub message: String,
    pub path: String,
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!(" at '{}'", path)
    }
}

impl ConversionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: String::new(),
        }
    }

    /// Prefix the error location with the segment of the enclosing node.
    pub(crate) fn at(mut self, segment: &str) -> Self {
        if self.path.is_empty() {
            self.path = segment.to_string();
        } else {
            self.path = format!("{}.{}", segment, self.path);
        }
        self
    }
}

impl serde::de::Error for ConversionError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        ConversionError::new(msg.to_string())
    }
}

/// Why a registration was rejected.
///
/// The boolean `register*` methods collapse both causes to `false`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("Registration error: extension or property name must not be empty")]
    InvalidName,

    #[error("Registration error: '{name}' is already registered on {host}")]
    AlreadyRegistered { host: &'static str, name: String },
}

/// Failure while reading a document into host entities.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReadError {
    #[error("Parse error: {host} must be an object, found {found}")]
    NotAMapping {
        host: &'static str,
        found: &'static str,
    },

    #[error("Parse error: '{field}' on {host} must be an array, found {found}")]
    NotASequence {
        host: &'static str,
        field: String,
        found: &'static str,
    },

    #[error("Required field '{field}' is missing on {host}")]
    RequiredFieldMissing { host: &'static str, field: String },

    #[error("Schema error in {host}: {source}")]
    Schema {
        host: &'static str,
        #[source]
        source: ConversionError,
    },

    #[error("Extension error: '{name}' on {host}: {source}")]
    Extension {
        host: &'static str,
        name: String,
        #[source]
        source: ConversionError,
    },

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Failure on the lazy conversion path through the property-type registry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropertyError {
    #[error("Property '{name}' is not declared on {host}")]
    NotDeclared { host: &'static str, name: String },

    #[error("Property '{name}' on {host} is declared as {declared}, requested {requested}")]
    TypeMismatch {
        host: &'static str,
        name: String,
        declared: &'static str,
        requested: &'static str,
    },

    #[error("Property '{name}' on {host} was already resolved to {resolved} at parse time")]
    AlreadyResolved {
        host: &'static str,
        name: String,
        resolved: &'static str,
    },

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Failure while loading an [`ExtensionConfig`](crate::ExtensionConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_error_path() {
        let err = ConversionError::new("invalid type").at("data").at("outer");
        assert_eq!(err.path, "outer.data");
        assert_eq!(
            err.to_string(),
            "Conversion error at 'outer.data': invalid type"
        );
    }

    #[test]
    fn test_conversion_error_without_path() {
        let err = ConversionError::new("value is missing");
        assert_eq!(err.to_string(), "Conversion error: value is missing");
    }

    #[test]
    fn test_registration_error_display() {
        let err = RegistrationError::AlreadyRegistered {
            host: "Root",
            name: "X_ext".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Registration error: 'X_ext' is already registered on Root"
        );
    }
}
