//! Backend-agnostic document nodes.
//!
//! A [`DocumentNode`] is an immutable snapshot of one position in a parsed
//! document tree. Backend adapters build nodes from their own value types
//! (see [`crate::backend`]) and the rest of the crate only ever sees nodes,
//! never a parsing library's types.
//!
//! Indexing is total: looking up a key that is absent, or indexing a node
//! that is not a mapping, yields the [`DocumentNode::Missing`] sentinel, so
//! chained lookups such as `node["a"]["b"]` never panic. Converting a missing
//! node into a required shape fails with a [`ConversionError`]; converting it
//! into an `Option<T>` yields `None`.
//!
//! Conversion never coerces between scalar kinds. A string is not parsed as a
//! number, and a float is not accepted for an integer type even when it is
//! integral: `{"data": 1.0}` does not convert into `struct { data: i32 }`.

mod de;

use std::fmt;
use std::ops::Index;

use indexmap::IndexMap;
use serde::de::{Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

use crate::error::ConversionError;

pub use de::NodeDeserializer;

static MISSING: DocumentNode = DocumentNode::Missing;

/// One node of a parsed document.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DocumentNode {
    /// Sentinel returned when indexing an absent key or position.
    #[default]
    Missing,
    Scalar(Scalar),
    Sequence(Vec<DocumentNode>),
    Mapping(IndexMap<String, DocumentNode>),
}

/// Leaf values of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

/// Numbers keep the integer/float distinction of the source text so that
/// conversion never silently truncates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    PosInt(u64),
    NegInt(i64),
    Float(f64),
}

impl DocumentNode {
    pub fn null() -> Self {
        DocumentNode::Scalar(Scalar::Null)
    }

    /// Short name of the node's shape, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            DocumentNode::Missing => "missing",
            DocumentNode::Scalar(Scalar::Null) => "null",
            DocumentNode::Scalar(Scalar::Bool(_)) => "boolean",
            DocumentNode::Scalar(Scalar::Number(_)) => "number",
            DocumentNode::Scalar(Scalar::String(_)) => "string",
            DocumentNode::Sequence(_) => "array",
            DocumentNode::Mapping(_) => "object",
        }
    }

    /// Child bound to `key`, or the missing sentinel.
    pub fn get(&self, key: &str) -> &DocumentNode {
        match self {
            DocumentNode::Mapping(entries) => entries.get(key).unwrap_or(&MISSING),
            _ => &MISSING,
        }
    }

    /// Element at `index`, or the missing sentinel.
    pub fn at(&self, index: usize) -> &DocumentNode {
        match self {
            DocumentNode::Sequence(items) => items.get(index).unwrap_or(&MISSING),
            _ => &MISSING,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, DocumentNode::Missing)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DocumentNode::Scalar(Scalar::Null))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DocumentNode::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DocumentNode::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DocumentNode::Scalar(Scalar::Number(Number::PosInt(u))) => i64::try_from(*u).ok(),
            DocumentNode::Scalar(Scalar::Number(Number::NegInt(i))) => Some(*i),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            DocumentNode::Scalar(Scalar::Number(Number::PosInt(u))) => Some(*u),
            _ => None,
        }
    }

    /// Any number as a float, integers included.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DocumentNode::Scalar(Scalar::Number(n)) => Some(match *n {
                Number::PosInt(u) => u as f64,
                Number::NegInt(i) => i as f64,
                Number::Float(f) => f,
            }),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[DocumentNode]> {
        match self {
            DocumentNode::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, DocumentNode>> {
        match self {
            DocumentNode::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Number of children of a sequence or mapping; zero for anything else.
    pub fn len(&self) -> usize {
        match self {
            DocumentNode::Sequence(items) => items.len(),
            DocumentNode::Mapping(entries) => entries.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert the node into `T` by structural matching.
    ///
    /// Scalars, sequences and nested mappings are matched recursively against
    /// the shape `T` describes through its `Deserialize` impl. Types are never
    /// coerced: a string is not a number and a float is not an integer.
    ///
    /// # Example
    ///
    /// ```
    /// use gltf_ext::DocumentNode;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize, Debug, PartialEq)]
    /// struct Ext { data: i32 }
    ///
    /// let node: DocumentNode = [("data".to_string(), DocumentNode::from(1u64))]
    ///     .into_iter()
    ///     .collect();
    /// assert_eq!(node.convert_to::<Ext>().unwrap(), Ext { data: 1 });
    /// ```
    pub fn convert_to<'a, T>(&'a self) -> Result<T, ConversionError>
    where
        T: Deserialize<'a>,
    {
        T::deserialize(NodeDeserializer::new(self))
    }
}

impl Index<&str> for DocumentNode {
    type Output = DocumentNode;

    fn index(&self, key: &str) -> &DocumentNode {
        self.get(key)
    }
}

impl Index<usize> for DocumentNode {
    type Output = DocumentNode;

    fn index(&self, index: usize) -> &DocumentNode {
        self.at(index)
    }
}

impl From<bool> for DocumentNode {
    fn from(value: bool) -> Self {
        DocumentNode::Scalar(Scalar::Bool(value))
    }
}

impl From<u64> for DocumentNode {
    fn from(value: u64) -> Self {
        DocumentNode::Scalar(Scalar::Number(Number::PosInt(value)))
    }
}

impl From<i64> for DocumentNode {
    fn from(value: i64) -> Self {
        if value < 0 {
            DocumentNode::Scalar(Scalar::Number(Number::NegInt(value)))
        } else {
            DocumentNode::Scalar(Scalar::Number(Number::PosInt(value as u64)))
        }
    }
}

impl From<f64> for DocumentNode {
    fn from(value: f64) -> Self {
        DocumentNode::Scalar(Scalar::Number(Number::Float(value)))
    }
}

impl From<&str> for DocumentNode {
    fn from(value: &str) -> Self {
        DocumentNode::Scalar(Scalar::String(value.to_string()))
    }
}

impl From<String> for DocumentNode {
    fn from(value: String) -> Self {
        DocumentNode::Scalar(Scalar::String(value))
    }
}

impl From<Vec<DocumentNode>> for DocumentNode {
    fn from(items: Vec<DocumentNode>) -> Self {
        DocumentNode::Sequence(items)
    }
}

impl FromIterator<(String, DocumentNode)> for DocumentNode {
    fn from_iter<I: IntoIterator<Item = (String, DocumentNode)>>(iter: I) -> Self {
        DocumentNode::Mapping(iter.into_iter().collect())
    }
}

/// Renders the node as compact JSON text. The missing sentinel renders as
/// `null`.
impl fmt::Display for DocumentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentNode::Missing | DocumentNode::Scalar(Scalar::Null) => write!(f, "null"),
            DocumentNode::Scalar(Scalar::Bool(b)) => write!(f, "{}", b),
            DocumentNode::Scalar(Scalar::Number(n)) => write!(f, "{}", n),
            DocumentNode::Scalar(Scalar::String(s)) => write_json_string(f, s),
            DocumentNode::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            DocumentNode::Mapping(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write_json_string(f, key)?;
                    write!(f, ":{}", value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::PosInt(u) => write!(f, "{}", u),
            Number::NegInt(i) => write!(f, "{}", i),
            Number::Float(fl) if fl.is_finite() => write!(f, "{:?}", fl),
            // JSON has no representation for NaN or infinities
            Number::Float(_) => write!(f, "null"),
        }
    }
}

fn write_json_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "\"")?;
    for c in s.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            c if (c as u32) < 0x20 => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "\"")
}

/// Any serde data format can produce a snapshot directly.
impl<'de> Deserialize<'de> for DocumentNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = DocumentNode;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "any document value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<DocumentNode, E> {
        Ok(DocumentNode::from(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<DocumentNode, E> {
        Ok(DocumentNode::from(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<DocumentNode, E> {
        Ok(DocumentNode::from(v))
    }

    fn visit_f64<E>(self, v: f64) -> Result<DocumentNode, E> {
        Ok(DocumentNode::from(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<DocumentNode, E> {
        Ok(DocumentNode::from(v))
    }

    fn visit_string<E>(self, v: String) -> Result<DocumentNode, E> {
        Ok(DocumentNode::from(v))
    }

    fn visit_unit<E>(self) -> Result<DocumentNode, E> {
        Ok(DocumentNode::null())
    }

    fn visit_none<E>(self) -> Result<DocumentNode, E> {
        Ok(DocumentNode::null())
    }

    fn visit_some<D>(self, deserializer: D) -> Result<DocumentNode, D::Error>
    where
        D: Deserializer<'de>,
    {
        DocumentNode::deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<DocumentNode, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(DocumentNode::Sequence(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<DocumentNode, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = IndexMap::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, DocumentNode>()? {
            entries.insert(key, value);
        }
        Ok(DocumentNode::Mapping(entries))
    }
}
