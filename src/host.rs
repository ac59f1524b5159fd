//! Host entities and their generic property bags.
//!
//! Any schema type that may carry extension data implements [`Extensible`].
//! Its runtime identity, [`HostKind`], is half of every registry key; the
//! other half is the extension or property name.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;

use crate::error::ConversionError;
use crate::node::DocumentNode;
use crate::parser::ExtensionValue;

/// A schema type that accepts data outside its statically declared members.
///
/// # Example
///
/// ```
/// use gltf_ext::{Extensible, PropertyBag};
///
/// #[derive(Default)]
/// struct RootExtensions {
///     generic_properties: Option<PropertyBag>,
/// }
///
/// impl Extensible for RootExtensions {
///     const KIND_NAME: &'static str = "RootExtensions";
///
///     fn generic_properties(&self) -> Option<&PropertyBag> {
///         self.generic_properties.as_ref()
///     }
///
///     fn generic_properties_mut(&mut self) -> &mut Option<PropertyBag> {
///         &mut self.generic_properties
///     }
/// }
/// ```
pub trait Extensible: 'static {
    /// Name of the host kind in diagnostics
    const KIND_NAME: &'static str;

    /// The bag, or `None` while no unrecognized field has been seen.
    fn generic_properties(&self) -> Option<&PropertyBag>;

    fn generic_properties_mut(&mut self) -> &mut Option<PropertyBag>;

    /// Allocate the bag on first use. Once allocated it stays allocated.
    fn generic_properties_or_init(&mut self) -> &mut PropertyBag {
        self.generic_properties_mut()
            .get_or_insert_with(PropertyBag::default)
    }

    fn generic_property(&self, name: &str) -> Option<&PropertyValue> {
        self.generic_properties().and_then(|bag| bag.get(name))
    }
}

/// Identity of a host entity type.
///
/// Equality and hashing use the type identity only; the name is carried for
/// messages.
#[derive(Clone, Copy)]
pub struct HostKind {
    id: TypeId,
    name: &'static str,
}

impl HostKind {
    pub fn of<H: Extensible>() -> Self {
        Self {
            id: TypeId::of::<H>(),
            name: H::KIND_NAME,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for HostKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for HostKind {}

impl Hash for HostKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for HostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostKind({})", self.name)
    }
}

impl fmt::Display for HostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Value stored for one unrecognized field.
#[derive(Debug)]
pub enum PropertyValue {
    /// Output of a registered parser capability
    Resolved(ExtensionValue),
    /// No parser was registered; the node is kept for on-demand conversion
    Raw(DocumentNode),
    /// A registered parser rejected the node
    Failed {
        node: DocumentNode,
        error: ConversionError,
    },
}

impl PropertyValue {
    /// The resolved value, if it was resolved to `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            PropertyValue::Resolved(value) => value.downcast_ref(),
            _ => None,
        }
    }

    /// The unconverted node of a pass-through or failed value.
    pub fn node(&self) -> Option<&DocumentNode> {
        match self {
            PropertyValue::Raw(node) | PropertyValue::Failed { node, .. } => Some(node),
            PropertyValue::Resolved(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ConversionError> {
        match self {
            PropertyValue::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, PropertyValue::Resolved(_))
    }
}

/// Per-entity store of unrecognized fields, in document order.
#[derive(Debug, Default)]
pub struct PropertyBag {
    entries: IndexMap<String, PropertyValue>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `name`, returning any value it replaces.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: PropertyValue,
    ) -> Option<PropertyValue> {
        self.entries.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries.get(name)
    }

    /// Typed access to a value resolved at parse time.
    pub fn get_as<T: 'static>(&self, name: &str) -> Option<&T> {
        self.get(name).and_then(PropertyValue::downcast_ref)
    }

    /// The raw node stored under `name`, if it was not resolved.
    pub fn node(&self, name: &str) -> Option<&DocumentNode> {
        self.get(name).and_then(PropertyValue::node)
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.entries.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Mesh {
        generic_properties: Option<PropertyBag>,
    }

    impl Extensible for Mesh {
        const KIND_NAME: &'static str = "Mesh";

        fn generic_properties(&self) -> Option<&PropertyBag> {
            self.generic_properties.as_ref()
        }

        fn generic_properties_mut(&mut self) -> &mut Option<PropertyBag> {
            &mut self.generic_properties
        }
    }

    struct Skin;

    impl Extensible for Skin {
        const KIND_NAME: &'static str = "Skin";

        fn generic_properties(&self) -> Option<&PropertyBag> {
            None
        }

        fn generic_properties_mut(&mut self) -> &mut Option<PropertyBag> {
            unreachable!("not used in tests")
        }
    }

    #[test]
    fn test_host_kind_identity() {
        assert_eq!(HostKind::of::<Mesh>(), HostKind::of::<Mesh>());
        assert_ne!(HostKind::of::<Mesh>(), HostKind::of::<Skin>());
        assert_eq!(HostKind::of::<Skin>().to_string(), "Skin");
    }

    #[test]
    fn test_bag_is_lazy_and_never_shrinks_back() {
        let mut mesh = Mesh::default();
        assert!(mesh.generic_properties().is_none());

        mesh.generic_properties_or_init()
            .insert("X_ext", PropertyValue::Raw(DocumentNode::from(1u64)));
        assert_eq!(mesh.generic_properties().map(PropertyBag::len), Some(1));

        mesh.generic_properties_or_init().remove("X_ext");
        let bag = mesh.generic_properties().expect("bag stays allocated");
        assert!(bag.is_empty());
    }

    #[test]
    fn test_typed_and_raw_access() {
        let mut bag = PropertyBag::new();
        bag.insert("A_typed", PropertyValue::Resolved(ExtensionValue::new(7u32)));
        bag.insert("B_raw", PropertyValue::Raw(DocumentNode::from("x")));

        assert_eq!(bag.get_as::<u32>("A_typed"), Some(&7));
        assert_eq!(bag.get_as::<i64>("A_typed"), None);
        assert!(bag.node("A_typed").is_none());
        assert_eq!(bag.node("B_raw").and_then(DocumentNode::as_str), Some("x"));

        let names: Vec<&str> = bag.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["A_typed", "B_raw"]);
    }
}
