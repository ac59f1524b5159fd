//! serde_json adapter.

use serde_json::Value;

use crate::error::ReadError;
use crate::intercept::UnrecognizedFieldSink;
use crate::node::{DocumentNode, Number, Scalar};
use crate::reader::{DocumentReader, HostSchema};

impl From<Value> for DocumentNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => DocumentNode::null(),
            Value::Bool(b) => DocumentNode::from(b),
            Value::Number(n) => {
                let number = if let Some(u) = n.as_u64() {
                    Number::PosInt(u)
                } else if let Some(i) = n.as_i64() {
                    Number::NegInt(i)
                } else {
                    Number::Float(n.as_f64().unwrap_or(f64::NAN))
                };
                DocumentNode::Scalar(Scalar::Number(number))
            }
            Value::String(s) => DocumentNode::from(s),
            Value::Array(items) => {
                DocumentNode::Sequence(items.into_iter().map(DocumentNode::from).collect())
            }
            Value::Object(entries) => entries
                .into_iter()
                .map(|(k, v)| (k, DocumentNode::from(v)))
                .collect(),
        }
    }
}

/// Reads glTF JSON text into host entities.
pub struct JsonBackend;

impl JsonBackend {
    /// Parse `text` and read the root host `H`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use gltf_ext::{Interceptor, JsonBackend, Registries, schema::Root};
    ///
    /// let registries = Registries::new();
    /// let mut interceptor = Interceptor::new(&registries);
    /// let root: Root = JsonBackend::parse_str(&mut interceptor, text)?;
    /// ```
    pub fn parse_str<H, S>(sink: &mut S, text: &str) -> Result<H, ReadError>
    where
        H: HostSchema,
        S: UnrecognizedFieldSink,
    {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ReadError::Backend(e.to_string()))?;
        Self::parse_value(sink, value)
    }

    pub fn parse_slice<H, S>(sink: &mut S, bytes: &[u8]) -> Result<H, ReadError>
    where
        H: HostSchema,
        S: UnrecognizedFieldSink,
    {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| ReadError::Backend(e.to_string()))?;
        Self::parse_value(sink, value)
    }

    pub fn parse_value<H, S>(sink: &mut S, value: Value) -> Result<H, ReadError>
    where
        H: HostSchema,
        S: UnrecognizedFieldSink,
    {
        DocumentReader::new(sink).read_host(DocumentNode::from(value))
    }
}
