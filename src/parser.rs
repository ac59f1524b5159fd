//! Parser capabilities: the registered logic that turns a document node into
//! a typed extension value.
//!
//! A capability is one of two variants, picked explicitly by the registrant:
//! custom conversion logic, or a simple binding that converts the node
//! structurally into a target type.

use std::any::{Any, TypeId};
use std::fmt;

use serde::de::DeserializeOwned;

use crate::error::ConversionError;
use crate::node::DocumentNode;

/// A type-erased extension value.
pub struct ExtensionValue {
    value: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl ExtensionValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Recover the concrete value, or get `self` back if it is not a `T`.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        let type_name = self.type_name;
        match self.value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(Self { value, type_name }),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for ExtensionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExtensionValue({})", self.type_name)
    }
}

/// Custom conversion logic for one extension.
///
/// Implementations are constructed once at registration time and reused for
/// every occurrence of the extension.
pub trait CustomParser: Send + Sync {
    fn deserialize(&self, node: &DocumentNode) -> Result<ExtensionValue, ConversionError>;
}

/// Closures can be registered directly.
impl<F> CustomParser for F
where
    F: Fn(&DocumentNode) -> Result<ExtensionValue, ConversionError> + Send + Sync,
{
    fn deserialize(&self, node: &DocumentNode) -> Result<ExtensionValue, ConversionError> {
        self(node)
    }
}

/// Direct structural conversion into a target type, with no extra logic.
#[derive(Clone, Copy)]
pub struct SimpleBinding {
    convert: fn(&DocumentNode) -> Result<ExtensionValue, ConversionError>,
    target: TypeId,
    target_name: &'static str,
}

fn convert_into<T>(node: &DocumentNode) -> Result<ExtensionValue, ConversionError>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    node.convert_to::<T>().map(ExtensionValue::new)
}

impl SimpleBinding {
    pub fn of<T>() -> Self
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        Self {
            convert: convert_into::<T>,
            target: TypeId::of::<T>(),
            target_name: std::any::type_name::<T>(),
        }
    }

    pub fn targets<T: 'static>(&self) -> bool {
        self.target == TypeId::of::<T>()
    }

    pub fn target_name(&self) -> &'static str {
        self.target_name
    }
}

impl fmt::Debug for SimpleBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SimpleBinding({})", self.target_name)
    }
}

/// The unit of logic registered for one (host kind, extension name) pair.
pub enum ParserCapability {
    Custom(Box<dyn CustomParser>),
    SimpleBinding(SimpleBinding),
}

impl ParserCapability {
    pub fn custom(parser: impl CustomParser + 'static) -> Self {
        ParserCapability::Custom(Box::new(parser))
    }

    pub fn simple<T>() -> Self
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        ParserCapability::SimpleBinding(SimpleBinding::of::<T>())
    }

    pub fn deserialize(&self, node: &DocumentNode) -> Result<ExtensionValue, ConversionError> {
        match self {
            ParserCapability::Custom(parser) => parser.deserialize(node),
            ParserCapability::SimpleBinding(binding) => (binding.convert)(node),
        }
    }
}

impl fmt::Debug for ParserCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserCapability::Custom(_) => write!(f, "Custom"),
            ParserCapability::SimpleBinding(binding) => binding.fmt(f),
        }
    }
}
