//! Extension and property-type registries.
//!
//! Both registries map a (host kind, name) key to a value: a
//! [`ParserCapability`] for extensions, a [`DeclaredType`] for custom
//! properties. Registration is first-writer-wins; a second registration for
//! an existing key fails and leaves the original mapping in place.
//!
//! The registries live in an explicit [`Registries`] value. Registration
//! takes `&mut Registries` and reading a document borrows `&Registries`, so
//! all registration is finished before any parse that uses the set begins.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;

use crate::config::ExtensionConfig;
use crate::error::{PropertyError, RegistrationError};
use crate::host::{Extensible, HostKind, PropertyValue};
use crate::parser::{CustomParser, ParserCapability};

/// `VENDOR_feature_name`
const VENDOR_PREFIX_PATTERN: &str = "^[A-Z0-9]+_[A-Za-z0-9_]+$";

fn follows_vendor_convention(name: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(VENDOR_PREFIX_PATTERN).ok())
        .as_ref()
        .map_or(true, |re| re.is_match(name))
}

/// Two-level map shared by both registries.
struct KeyedTable<V> {
    entries: HashMap<HostKind, HashMap<String, V>>,
    warn_on_unprefixed_names: bool,
}

impl<V> Default for KeyedTable<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            warn_on_unprefixed_names: true,
        }
    }
}

impl<V> KeyedTable<V> {
    /// `make` runs only when the key is valid and vacant.
    fn try_insert(
        &mut self,
        host: HostKind,
        name: &str,
        make: impl FnOnce() -> V,
    ) -> Result<(), RegistrationError> {
        if name.is_empty() {
            return Err(RegistrationError::InvalidName);
        }

        let names = self.entries.entry(host).or_default();
        if names.contains_key(name) {
            return Err(RegistrationError::AlreadyRegistered {
                host: host.name(),
                name: name.to_string(),
            });
        }

        if self.warn_on_unprefixed_names && !follows_vendor_convention(name) {
            tracing::warn!(
                "'{}' on {} does not follow the VENDOR_feature naming convention",
                name,
                host
            );
        }

        names.insert(name.to_string(), make());
        Ok(())
    }

    fn remove(&mut self, host: HostKind, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        let Some(names) = self.entries.get_mut(&host) else {
            return false;
        };
        let removed = names.remove(name).is_some();
        if names.is_empty() {
            self.entries.remove(&host);
        }
        removed
    }

    fn get(&self, host: HostKind, name: &str) -> Option<&V> {
        if name.is_empty() {
            return None;
        }
        self.entries.get(&host).and_then(|names| names.get(name))
    }

    fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    fn names(&self, host: HostKind) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .entries
            .get(&host)
            .map(|names| names.keys().map(String::as_str).collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }
}

/// Maps (host kind, extension name) to the parser capability for it.
///
/// # Example
///
/// ```
/// use gltf_ext::{Extensible, ExtensionRegistry, HostKind, PropertyBag};
/// use serde::Deserialize;
///
/// #[derive(Default)]
/// struct RootExtensions { generic_properties: Option<PropertyBag> }
///
/// impl Extensible for RootExtensions {
///     const KIND_NAME: &'static str = "RootExtensions";
///     fn generic_properties(&self) -> Option<&PropertyBag> { self.generic_properties.as_ref() }
///     fn generic_properties_mut(&mut self) -> &mut Option<PropertyBag> { &mut self.generic_properties }
/// }
///
/// #[derive(Deserialize)]
/// struct MyCustomRootExtension { data: i32 }
///
/// let mut registry = ExtensionRegistry::new();
/// assert!(registry.register_simple::<RootExtensions, MyCustomRootExtension>("UNITY_my_custom_rootExtension"));
/// assert!(!registry.register_simple::<RootExtensions, MyCustomRootExtension>("UNITY_my_custom_rootExtension"));
/// assert!(registry.is_registered(HostKind::of::<RootExtensions>(), "UNITY_my_custom_rootExtension"));
/// ```
#[derive(Default)]
pub struct ExtensionRegistry {
    parsers: KeyedTable<ParserCapability>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the capability built by `factory` under `(host, name)`.
    ///
    /// The factory is invoked exactly once, and only if the registration
    /// succeeds.
    pub fn try_register(
        &mut self,
        host: HostKind,
        name: &str,
        factory: impl FnOnce() -> ParserCapability,
    ) -> Result<(), RegistrationError> {
        self.parsers.try_insert(host, name, factory)?;
        tracing::debug!("Registered extension parser '{}' on {}", name, host);
        Ok(())
    }

    /// Returns `false` for an empty name or an already registered key.
    pub fn register(
        &mut self,
        host: HostKind,
        name: &str,
        factory: impl FnOnce() -> ParserCapability,
    ) -> bool {
        self.try_register(host, name, factory).is_ok()
    }

    /// Register a default-constructed custom parser `P` for host `H`.
    pub fn register_parser<H, P>(&mut self, name: &str) -> bool
    where
        H: Extensible,
        P: CustomParser + Default + 'static,
    {
        self.register(HostKind::of::<H>(), name, || {
            ParserCapability::custom(P::default())
        })
    }

    /// Register a simple binding converting the extension into `T`.
    pub fn register_simple<H, T>(&mut self, name: &str) -> bool
    where
        H: Extensible,
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.register(HostKind::of::<H>(), name, ParserCapability::simple::<T>)
    }

    pub fn unregister(&mut self, host: HostKind, name: &str) -> bool {
        let removed = self.parsers.remove(host, name);
        if removed {
            tracing::debug!("Unregistered extension parser '{}' on {}", name, host);
        }
        removed
    }

    pub fn is_registered(&self, host: HostKind, name: &str) -> bool {
        self.parsers.get(host, name).is_some()
    }

    /// Lookup only; an absent registration is not an error.
    pub fn get_parser(&self, host: HostKind, name: &str) -> Option<&ParserCapability> {
        self.parsers.get(host, name)
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered extension names for `host`, sorted.
    pub fn names(&self, host: HostKind) -> Vec<&str> {
        self.parsers.names(host)
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("len", &self.len())
            .finish()
    }
}

/// Declared shape of a custom property. Carries no conversion logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclaredType {
    id: TypeId,
    name: &'static str,
}

impl DeclaredType {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Maps (host kind, property name) to the declared type of its values.
#[derive(Default)]
pub struct PropertyTypeRegistry {
    types: KeyedTable<DeclaredType>,
}

impl PropertyTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_register_type(
        &mut self,
        host: HostKind,
        name: &str,
        declared: DeclaredType,
    ) -> Result<(), RegistrationError> {
        self.types.try_insert(host, name, || declared)?;
        tracing::debug!(
            "Registered custom property '{}' on {} as {}",
            name,
            host,
            declared.name()
        );
        Ok(())
    }

    pub fn register_type(&mut self, host: HostKind, name: &str, declared: DeclaredType) -> bool {
        self.try_register_type(host, name, declared).is_ok()
    }

    /// Declare that `name` on host `H` holds values of type `T`.
    pub fn register<H: Extensible, T: 'static>(&mut self, name: &str) -> bool {
        self.register_type(HostKind::of::<H>(), name, DeclaredType::of::<T>())
    }

    pub fn unregister(&mut self, host: HostKind, name: &str) -> bool {
        let removed = self.types.remove(host, name);
        if removed {
            tracing::debug!("Unregistered custom property '{}' on {}", name, host);
        }
        removed
    }

    pub fn is_registered(&self, host: HostKind, name: &str) -> bool {
        self.types.get(host, name).is_some()
    }

    pub fn declared_type(&self, host: HostKind, name: &str) -> Option<DeclaredType> {
        self.types.get(host, name).copied()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn names(&self, host: HostKind) -> Vec<&str> {
        self.types.names(host)
    }
}

impl fmt::Debug for PropertyTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyTypeRegistry")
            .field("len", &self.len())
            .finish()
    }
}

/// The registry set handed to a parse.
#[derive(Debug, Default)]
pub struct Registries {
    pub extensions: ExtensionRegistry,
    pub properties: PropertyTypeRegistry,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &ExtensionConfig) -> Self {
        let mut registries = Self::default();
        registries.extensions.parsers.warn_on_unprefixed_names = config.warn_on_unprefixed_names;
        registries.properties.types.warn_on_unprefixed_names = config.warn_on_unprefixed_names;
        registries
    }

    /// Convert a pass-through property of `host` into its declared type.
    ///
    /// Returns `Ok(None)` when the host carries no value under `name`.
    pub fn convert_property<H, T>(&self, host: &H, name: &str) -> Result<Option<T>, PropertyError>
    where
        H: Extensible,
        T: DeserializeOwned + 'static,
    {
        let kind = HostKind::of::<H>();
        let declared = self.properties.declared_type(kind, name).ok_or_else(|| {
            PropertyError::NotDeclared {
                host: kind.name(),
                name: name.to_string(),
            }
        })?;
        if !declared.is::<T>() {
            return Err(PropertyError::TypeMismatch {
                host: kind.name(),
                name: name.to_string(),
                declared: declared.name(),
                requested: std::any::type_name::<T>(),
            });
        }

        match host.generic_property(name) {
            None => Ok(None),
            Some(PropertyValue::Resolved(value)) => Err(PropertyError::AlreadyResolved {
                host: kind.name(),
                name: name.to_string(),
                resolved: value.type_name(),
            }),
            Some(PropertyValue::Raw(node)) | Some(PropertyValue::Failed { node, .. }) => {
                Ok(Some(node.convert_to::<T>()?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::PropertyBag;
    use crate::node::DocumentNode;
    use crate::parser::ExtensionValue;
    use crate::ConversionError;
    use serde::Deserialize;

    #[derive(Default)]
    struct Root {
        generic_properties: Option<PropertyBag>,
    }

    impl Extensible for Root {
        const KIND_NAME: &'static str = "Root";

        fn generic_properties(&self) -> Option<&PropertyBag> {
            self.generic_properties.as_ref()
        }

        fn generic_properties_mut(&mut self) -> &mut Option<PropertyBag> {
            &mut self.generic_properties
        }
    }

    #[derive(Default)]
    struct Node {
        generic_properties: Option<PropertyBag>,
    }

    impl Extensible for Node {
        const KIND_NAME: &'static str = "Node";

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

    #[derive(Debug, Deserialize, PartialEq)]
    struct Other {
        other: String,
    }

    #[derive(Default)]
    struct Doubler;

    impl CustomParser for Doubler {
        fn deserialize(&self, node: &DocumentNode) -> Result<ExtensionValue, ConversionError> {
            Ok(ExtensionValue::new(node["data"].convert_to::<i32>()? * 2))
        }
    }

    fn data_node(data: u64) -> DocumentNode {
        [("data".to_string(), DocumentNode::from(data))]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_register_is_first_writer_wins() {
        let mut registry = ExtensionRegistry::new();
        let root = HostKind::of::<Root>();

        assert!(registry.register_simple::<Root, Data>("X_ext"));
        assert!(!registry.register_simple::<Root, Other>("X_ext"));
        assert_eq!(registry.len(), 1);

        match registry.get_parser(root, "X_ext") {
            Some(ParserCapability::SimpleBinding(binding)) => assert!(binding.targets::<Data>()),
            other => panic!("unexpected capability: {:?}", other),
        }
    }

    #[test]
    fn test_try_register_distinguishes_failures() {
        let mut registry = ExtensionRegistry::new();
        let root = HostKind::of::<Root>();

        assert_eq!(
            registry.try_register(root, "", ParserCapability::simple::<Data>),
            Err(RegistrationError::InvalidName)
        );
        registry
            .try_register(root, "X_ext", ParserCapability::simple::<Data>)
            .unwrap();
        assert_eq!(
            registry.try_register(root, "X_ext", ParserCapability::simple::<Data>),
            Err(RegistrationError::AlreadyRegistered {
                host: "Root",
                name: "X_ext".to_string()
            })
        );
    }

    #[test]
    fn test_factory_not_invoked_on_failure() {
        let mut registry = ExtensionRegistry::new();
        let root = HostKind::of::<Root>();
        assert!(registry.register_simple::<Root, Data>("X_ext"));

        let mut invoked = false;
        assert!(!registry.register(root, "X_ext", || {
            invoked = true;
            ParserCapability::simple::<Other>()
        }));
        assert!(!registry.register(root, "", || {
            invoked = true;
            ParserCapability::simple::<Other>()
        }));
        assert!(!invoked);
    }

    #[test]
    fn test_empty_name_behaves_as_absent() {
        let mut registry = ExtensionRegistry::new();
        let root = HostKind::of::<Root>();

        assert!(!registry.register_simple::<Root, Data>(""));
        assert!(!registry.is_registered(root, ""));
        assert!(!registry.unregister(root, ""));
        assert!(registry.get_parser(root, "").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister() {
        let mut registry = ExtensionRegistry::new();
        let root = HostKind::of::<Root>();

        assert!(!registry.unregister(root, "X_ext"));
        assert!(registry.register_simple::<Root, Data>("X_ext"));
        assert!(registry.unregister(root, "X_ext"));
        assert!(!registry.is_registered(root, "X_ext"));
        assert!(registry.get_parser(root, "X_ext").is_none());
        assert!(registry.register_simple::<Root, Other>("X_ext"));
    }

    #[test]
    fn test_keys_are_scoped_by_host_kind() {
        let mut registry = ExtensionRegistry::new();

        assert!(registry.register_simple::<Root, Data>("X_ext"));
        assert!(registry.register_parser::<Node, Doubler>("X_ext"));
        assert!(!registry.is_registered(HostKind::of::<Node>(), "Y_ext"));

        let node_parser = registry
            .get_parser(HostKind::of::<Node>(), "X_ext")
            .unwrap();
        let value = node_parser.deserialize(&data_node(21)).unwrap();
        assert_eq!(value.downcast_ref::<i32>(), Some(&42));
        assert_eq!(registry.names(HostKind::of::<Root>()), vec!["X_ext"]);
    }

    #[test]
    fn test_unprefixed_names_are_accepted() {
        let mut registry = ExtensionRegistry::new();
        assert!(registry.register_simple::<Root, Data>("lowercase"));
        assert!(!follows_vendor_convention("lowercase"));
        assert!(follows_vendor_convention("KHR_materials_emissive_strength"));
    }

    #[test]
    fn test_property_type_registry() {
        let mut properties = PropertyTypeRegistry::new();
        let root = HostKind::of::<Root>();

        assert!(properties.register::<Root, Data>("X_prop"));
        assert!(!properties.register::<Root, Other>("X_prop"));
        assert!(!properties.register::<Root, Data>(""));
        assert!(!properties.is_registered(root, ""));
        assert!(!properties.unregister(root, ""));
        assert!(properties.declared_type(root, "").is_none());
        assert_eq!(properties.len(), 1);
        assert!(properties.declared_type(root, "X_prop").unwrap().is::<Data>());
        assert!(properties.unregister(root, "X_prop"));
        assert!(!properties.is_registered(root, "X_prop"));
        assert!(!properties.unregister(root, "X_prop"));
    }

    #[test]
    fn test_convert_property_lazily() {
        let mut registries = Registries::new();
        assert!(registries.properties.register::<Root, Data>("X_prop"));

        let mut root = Root::default();
        assert_eq!(
            registries.convert_property::<Root, Data>(&root, "X_prop"),
            Ok(None)
        );

        root.generic_properties_or_init()
            .insert("X_prop", PropertyValue::Raw(data_node(3)));
        assert_eq!(
            registries.convert_property::<Root, Data>(&root, "X_prop"),
            Ok(Some(Data { data: 3 }))
        );
        assert!(matches!(
            registries.convert_property::<Root, Other>(&root, "X_prop"),
            Err(PropertyError::TypeMismatch { .. })
        ));
        assert!(matches!(
            registries.convert_property::<Root, Data>(&root, "Z_prop"),
            Err(PropertyError::NotDeclared { .. })
        ));
    }

    #[test]
    fn test_convert_property_already_resolved() {
        let mut registries = Registries::new();
        assert!(registries.properties.register::<Root, Data>("X_prop"));

        let mut root = Root::default();
        root.generic_properties_or_init().insert(
            "X_prop",
            PropertyValue::Resolved(ExtensionValue::new(Data { data: 1 })),
        );

        assert!(matches!(
            registries.convert_property::<Root, Data>(&root, "X_prop"),
            Err(PropertyError::AlreadyResolved { host: "Root", ref name, .. }) if name == "X_prop"
        ));
        assert_eq!(
            root.generic_properties().unwrap().get_as::<Data>("X_prop"),
            Some(&Data { data: 1 })
        );
    }

    #[test]
    fn test_convert_property_from_failed_value() {
        let mut registries = Registries::new();
        assert!(registries.properties.register::<Root, Data>("X_prop"));
        assert!(registries.properties.register::<Root, Data>("Z_prop"));

        let bad: DocumentNode = [("data".to_string(), DocumentNode::from("s"))]
            .into_iter()
            .collect();
        let mut root = Root::default();
        let bag = root.generic_properties_or_init();
        bag.insert(
            "X_prop",
            PropertyValue::Failed {
                node: data_node(4),
                error: ConversionError::new("rejected"),
            },
        );
        bag.insert(
            "Z_prop",
            PropertyValue::Failed {
                node: bad,
                error: ConversionError::new("rejected"),
            },
        );

        assert_eq!(
            registries.convert_property::<Root, Data>(&root, "X_prop"),
            Ok(Some(Data { data: 4 }))
        );
        match registries.convert_property::<Root, Data>(&root, "Z_prop") {
            Err(PropertyError::Conversion(error)) => assert_eq!(error.path, "data"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
