//! The interception point between a backend parser and the registries.
//!
//! Backend adapters report every field of a host object that has no
//! statically declared member through [`UnrecognizedFieldSink`]. The
//! [`Interceptor`] resolves the extension registry for the field, converts
//! the node with the registered capability (or keeps it raw), and stores the
//! result in the host's property bag.

use crate::config::{ExtensionConfig, FailurePolicy};
use crate::error::{ConversionError, ReadError};
use crate::host::{Extensible, HostKind, PropertyValue};
use crate::node::DocumentNode;
use crate::registry::Registries;

/// Callback contract implemented for backend adapters.
///
/// Called once per (host instance, unrecognized key, value). The sink never
/// influences how the backend parses the rest of the document, except that
/// returning an error stops the read.
pub trait UnrecognizedFieldSink {
    fn unrecognized_field<H: Extensible>(
        &mut self,
        host: &mut H,
        key: &str,
        value: DocumentNode,
    ) -> Result<(), ReadError>;
}

/// A registered parser that rejected its node.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionFailure {
    pub host: HostKind,
    pub name: String,
    pub error: ConversionError,
}

/// Resolves unrecognized fields against a borrowed [`Registries`] set.
#[derive(Debug)]
pub struct Interceptor<'r> {
    registries: &'r Registries,
    policy: FailurePolicy,
    failures: Vec<ConversionFailure>,
}

impl<'r> Interceptor<'r> {
    pub fn new(registries: &'r Registries) -> Self {
        Self {
            registries,
            policy: FailurePolicy::default(),
            failures: Vec::new(),
        }
    }

    pub fn with_config(registries: &'r Registries, config: &ExtensionConfig) -> Self {
        Self {
            policy: config.failure_policy,
            ..Self::new(registries)
        }
    }

    pub fn registries(&self) -> &'r Registries {
        self.registries
    }

    /// Failures recorded so far, in document order.
    pub fn failures(&self) -> &[ConversionFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<ConversionFailure> {
        self.failures
    }

    /// Resolve one field without storing it.
    ///
    /// Unregistered names pass the node through unchanged.
    pub fn resolve(
        &self,
        host: HostKind,
        key: &str,
        node: DocumentNode,
    ) -> Result<PropertyValue, (DocumentNode, ConversionError)> {
        match self.registries.extensions.get_parser(host, key) {
            Some(parser) => match parser.deserialize(&node) {
                Ok(value) => Ok(PropertyValue::Resolved(value)),
                Err(error) => Err((node, error)),
            },
            None => Ok(PropertyValue::Raw(node)),
        }
    }
}

impl UnrecognizedFieldSink for Interceptor<'_> {
    fn unrecognized_field<H: Extensible>(
        &mut self,
        host: &mut H,
        key: &str,
        value: DocumentNode,
    ) -> Result<(), ReadError> {
        let kind = HostKind::of::<H>();
        tracing::trace!("Unrecognized field '{}' on {}", key, kind);

        let resolved = match self.resolve(kind, key, value) {
            Ok(resolved) => resolved,
            Err((node, error)) => {
                tracing::warn!("Extension '{}' on {} failed to convert: {}", key, kind, error);
                if self.policy == FailurePolicy::Abort {
                    return Err(ReadError::Extension {
                        host: kind.name(),
                        name: key.to_string(),
                        source: error,
                    });
                }
                self.failures.push(ConversionFailure {
                    host: kind,
                    name: key.to_string(),
                    error: error.clone(),
                });
                PropertyValue::Failed { node, error }
            }
        };

        host.generic_properties_or_init().insert(key, resolved);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::PropertyBag;
    use serde::Deserialize;

    #[derive(Default)]
    struct RootExtensions {
        generic_properties: Option<PropertyBag>,
    }

    impl Extensible for RootExtensions {
        const KIND_NAME: &'static str = "RootExtensions";

        fn generic_properties(&self) -> Option<&PropertyBag> {
            self.generic_properties.as_ref()
        }

        fn generic_properties_mut(&mut self) -> &mut Option<PropertyBag> {
            &mut self.generic_properties
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Data {
        data: i32,
    }

    fn data_node(data: DocumentNode) -> DocumentNode {
        [("data".to_string(), data)].into_iter().collect()
    }

    fn registries() -> Registries {
        let mut registries = Registries::new();
        registries
            .extensions
            .register_simple::<RootExtensions, Data>("X_ext");
        registries
    }

    #[test]
    fn test_registered_extension_is_converted() {
        let registries = registries();
        let mut interceptor = Interceptor::new(&registries);
        let mut host = RootExtensions::default();

        interceptor
            .unrecognized_field(&mut host, "X_ext", data_node(DocumentNode::from(1u64)))
            .unwrap();

        let bag = host.generic_properties().unwrap();
        assert_eq!(bag.get_as::<Data>("X_ext"), Some(&Data { data: 1 }));
        assert!(interceptor.failures().is_empty());
    }

    #[test]
    fn test_unregistered_extension_passes_through() {
        let registries = registries();
        let mut interceptor = Interceptor::new(&registries);
        let mut host = RootExtensions::default();
        let node = data_node(DocumentNode::from(1u64));

        interceptor
            .unrecognized_field(&mut host, "Y_ext", node.clone())
            .unwrap();

        let stored = host.generic_properties().unwrap().node("Y_ext").unwrap();
        assert_eq!(stored, &node);
        assert_eq!(stored.convert_to::<Data>().unwrap(), Data { data: 1 });
    }

    #[test]
    fn test_bag_stays_unallocated_without_fields() {
        let registries = registries();
        let interceptor = Interceptor::new(&registries);
        let host = RootExtensions::default();
        assert!(host.generic_properties().is_none());
        assert!(interceptor.failures().is_empty());
    }

    #[test]
    fn test_failure_is_recorded() {
        let registries = registries();
        let mut interceptor = Interceptor::new(&registries);
        let mut host = RootExtensions::default();

        interceptor
            .unrecognized_field(
                &mut host,
                "X_ext",
                data_node(DocumentNode::from("not-a-number")),
            )
            .unwrap();
        interceptor
            .unrecognized_field(&mut host, "Y_ext", DocumentNode::from(true))
            .unwrap();

        let value = host.generic_property("X_ext").unwrap();
        assert!(value.error().is_some());
        assert_eq!(value.node().unwrap()["data"].as_str(), Some("not-a-number"));
        assert!(host.generic_properties().unwrap().contains("Y_ext"));

        let failures = interceptor.into_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].name, "X_ext");
        assert_eq!(failures[0].host, HostKind::of::<RootExtensions>());
        assert_eq!(failures[0].error.path, "data");
    }

    #[test]
    fn test_failure_aborts_under_abort_policy() {
        let registries = registries();
        let config = ExtensionConfig {
            failure_policy: FailurePolicy::Abort,
            ..ExtensionConfig::default()
        };
        let mut interceptor = Interceptor::with_config(&registries, &config);
        let mut host = RootExtensions::default();

        let result = interceptor.unrecognized_field(
            &mut host,
            "X_ext",
            data_node(DocumentNode::from("not-a-number")),
        );
        assert!(matches!(result, Err(ReadError::Extension { ref name, .. }) if name == "X_ext"));
        assert!(host.generic_properties().is_none());
    }
}
