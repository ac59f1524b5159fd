//! serde_yaml adapter.
//!
//! Builds nodes through the generic `Deserialize` impl of [`DocumentNode`].

use crate::error::ReadError;
use crate::intercept::UnrecognizedFieldSink;
use crate::node::DocumentNode;
use crate::reader::{DocumentReader, HostSchema};

/// Reads YAML text shaped like a glTF document into host entities.
pub struct YamlBackend;

impl YamlBackend {
    pub fn parse_str<H, S>(sink: &mut S, text: &str) -> Result<H, ReadError>
    where
        H: HostSchema,
        S: UnrecognizedFieldSink,
    {
        let node: DocumentNode =
            serde_yaml::from_str(text).map_err(|e| ReadError::Backend(e.to_string()))?;
        DocumentReader::new(sink).read_host(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_to_node() {
        let node: DocumentNode = serde_yaml::from_str("a:\n  data: 1\nb: [x, 2.5]\n").unwrap();
        assert_eq!(node["a"]["data"].as_u64(), Some(1));
        assert_eq!(node["b"][0].as_str(), Some("x"));
        assert_eq!(node["b"][1].as_f64(), Some(2.5));
    }
}
