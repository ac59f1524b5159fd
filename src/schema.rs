//! A minimal subset of the glTF 2.0 schema.
//!
//! Only enough of the schema to host extensions at the usual places: the
//! root, its `asset`, nodes, materials, and the `extensions` objects of the
//! root, nodes and materials. Members not listed here are unrecognized and
//! end up in the host's property bag.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::ReadError;
use crate::host::{Extensible, PropertyBag};
use crate::intercept::UnrecognizedFieldSink;
use crate::node::DocumentNode;
use crate::reader::{DocumentReader, HostSchema};

macro_rules! extensible {
    ($($host:ident),+ $(,)?) => {$(
        impl Extensible for $host {
            const KIND_NAME: &'static str = stringify!($host);

            fn generic_properties(&self) -> Option<&PropertyBag> {
                self.generic_properties.as_ref()
            }

            fn generic_properties_mut(&mut self) -> &mut Option<PropertyBag> {
                &mut self.generic_properties
            }
        }
    )+};
}

extensible!(Root, Asset, Node, Material, RootExtensions, NodeExtensions, MaterialExtensions);

/// Document root.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Root {
    #[serde(skip)]
    pub asset: Asset,
    #[serde(default)]
    pub extensions_used: Vec<String>,
    #[serde(default)]
    pub extensions_required: Vec<String>,
    pub scene: Option<u32>,
    #[serde(skip)]
    pub nodes: Vec<Node>,
    #[serde(skip)]
    pub materials: Vec<Material>,
    #[serde(skip)]
    pub extensions: Option<RootExtensions>,
    pub extras: Option<DocumentNode>,
    #[serde(skip)]
    generic_properties: Option<PropertyBag>,
}

impl HostSchema for Root {
    const FIELDS: &'static [&'static str] = &[
        "asset",
        "extensionsUsed",
        "extensionsRequired",
        "scene",
        "nodes",
        "materials",
        "extensions",
        "extras",
    ];

    fn read_nested<S: UnrecognizedFieldSink>(
        &mut self,
        reader: &mut DocumentReader<'_, S>,
        declared: &mut IndexMap<String, DocumentNode>,
    ) -> Result<(), ReadError> {
        self.asset = reader.read_required_host::<Asset, Self>(declared, "asset")?;
        self.nodes = reader.read_nested_hosts::<Node, Self>(declared, "nodes")?;
        self.materials = reader.read_nested_hosts::<Material, Self>(declared, "materials")?;
        self.extensions = reader.read_nested_host(declared, "extensions")?;
        Ok(())
    }
}

impl Root {
    /// Extensions listed as required that `supported` does not contain.
    pub fn unsupported_required_extensions<'a>(&'a self, supported: &[&str]) -> Vec<&'a str> {
        self.extensions_required
            .iter()
            .map(String::as_str)
            .filter(|name| !supported.contains(name))
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub version: String,
    pub min_version: Option<String>,
    pub generator: Option<String>,
    pub copyright: Option<String>,
    pub extras: Option<DocumentNode>,
    #[serde(skip)]
    generic_properties: Option<PropertyBag>,
}

impl HostSchema for Asset {
    const FIELDS: &'static [&'static str] =
        &["version", "minVersion", "generator", "copyright", "extras"];
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub name: Option<String>,
    #[serde(default)]
    pub children: Vec<u32>,
    pub mesh: Option<u32>,
    pub camera: Option<u32>,
    pub translation: Option<[f32; 3]>,
    pub rotation: Option<[f32; 4]>,
    pub scale: Option<[f32; 3]>,
    #[serde(skip)]
    pub extensions: Option<NodeExtensions>,
    pub extras: Option<DocumentNode>,
    #[serde(skip)]
    generic_properties: Option<PropertyBag>,
}

impl HostSchema for Node {
    const FIELDS: &'static [&'static str] = &[
        "name",
        "children",
        "mesh",
        "camera",
        "translation",
        "rotation",
        "scale",
        "extensions",
        "extras",
    ];

    fn read_nested<S: UnrecognizedFieldSink>(
        &mut self,
        reader: &mut DocumentReader<'_, S>,
        declared: &mut IndexMap<String, DocumentNode>,
    ) -> Result<(), ReadError> {
        self.extensions = reader.read_nested_host(declared, "extensions")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlphaMode {
    #[default]
    Opaque,
    Mask,
    Blend,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub name: Option<String>,
    #[serde(default)]
    pub alpha_mode: AlphaMode,
    pub alpha_cutoff: Option<f32>,
    #[serde(default)]
    pub double_sided: bool,
    pub emissive_factor: Option<[f32; 3]>,
    #[serde(skip)]
    pub extensions: Option<MaterialExtensions>,
    pub extras: Option<DocumentNode>,
    #[serde(skip)]
    generic_properties: Option<PropertyBag>,
}

impl HostSchema for Material {
    const FIELDS: &'static [&'static str] = &[
        "name",
        "alphaMode",
        "alphaCutoff",
        "doubleSided",
        "emissiveFactor",
        "extensions",
        "extras",
    ];

    fn read_nested<S: UnrecognizedFieldSink>(
        &mut self,
        reader: &mut DocumentReader<'_, S>,
        declared: &mut IndexMap<String, DocumentNode>,
    ) -> Result<(), ReadError> {
        self.extensions = reader.read_nested_host(declared, "extensions")?;
        Ok(())
    }
}

/// `extensions` object of the root. Every key is an extension name, so none
/// is statically declared here.
#[derive(Debug, Default, Deserialize)]
pub struct RootExtensions {
    #[serde(skip)]
    generic_properties: Option<PropertyBag>,
}

impl HostSchema for RootExtensions {
    const FIELDS: &'static [&'static str] = &[];
}

#[derive(Debug, Deserialize)]
pub struct LightReference {
    pub light: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct NodeExtensions {
    #[serde(rename = "KHR_lights_punctual")]
    pub lights_punctual: Option<LightReference>,
    #[serde(skip)]
    generic_properties: Option<PropertyBag>,
}

impl HostSchema for NodeExtensions {
    const FIELDS: &'static [&'static str] = &["KHR_lights_punctual"];
}

#[derive(Debug, Deserialize)]
pub struct EmissiveStrength {
    #[serde(rename = "emissiveStrength", default = "default_emissive_strength")]
    pub emissive_strength: f32,
}

fn default_emissive_strength() -> f32 {
    1.0
}

#[derive(Debug, Default, Deserialize)]
pub struct MaterialExtensions {
    #[serde(rename = "KHR_materials_emissive_strength")]
    pub emissive_strength: Option<EmissiveStrength>,
    #[serde(skip)]
    generic_properties: Option<PropertyBag>,
}

impl HostSchema for MaterialExtensions {
    const FIELDS: &'static [&'static str] = &["KHR_materials_emissive_strength"];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::JsonBackend;
    use crate::intercept::Interceptor;
    use crate::registry::Registries;

    fn read_root(text: &str) -> Root {
        let registries = Registries::new();
        let mut interceptor = Interceptor::new(&registries);
        JsonBackend::parse_str(&mut interceptor, text).unwrap()
    }

    #[test]
    fn test_unsupported_required_extensions() {
        let root = read_root(
            r#"{
                "asset": { "version": "2.0" },
                "extensionsRequired": ["KHR_lights_punctual", "VENDOR_required"]
            }"#,
        );

        assert_eq!(
            root.unsupported_required_extensions(&["KHR_lights_punctual"]),
            vec!["VENDOR_required"]
        );
        assert_eq!(
            root.unsupported_required_extensions(&[]),
            vec!["KHR_lights_punctual", "VENDOR_required"]
        );
        assert!(root
            .unsupported_required_extensions(&["VENDOR_required", "KHR_lights_punctual"])
            .is_empty());
    }

    #[test]
    fn test_no_required_extensions() {
        let root = read_root(r#"{ "asset": { "version": "2.0" } }"#);
        assert!(root.extensions_required.is_empty());
        assert!(root.unsupported_required_extensions(&[]).is_empty());

        let root = read_root(r#"{ "asset": { "version": "2.0" }, "extensionsRequired": [] }"#);
        assert!(root.unsupported_required_extensions(&["X_ext"]).is_empty());
    }
}
