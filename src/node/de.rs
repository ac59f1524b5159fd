//! Structural conversion of document nodes through serde.

use std::slice;

use indexmap::map;
use serde::de::value::{BorrowedStrDeserializer, StrDeserializer};
use serde::de::{
    self, DeserializeSeed, Deserializer, EnumAccess, Error as _, IntoDeserializer, MapAccess,
    SeqAccess, Unexpected, VariantAccess, Visitor,
};
use serde::forward_to_deserialize_any;

use super::{DocumentNode, Number, Scalar};
use crate::error::ConversionError;

/// A `serde::Deserializer` reading from a borrowed [`DocumentNode`].
///
/// Strings are handed out borrowed, so shapes holding `&str` can be
/// converted without copying.
#[derive(Debug, Clone, Copy)]
pub struct NodeDeserializer<'de> {
    node: &'de DocumentNode,
}

impl<'de> NodeDeserializer<'de> {
    pub fn new(node: &'de DocumentNode) -> Self {
        Self { node }
    }

    fn unexpected(&self) -> Unexpected<'de> {
        match self.node {
            DocumentNode::Missing => Unexpected::Other("missing value"),
            DocumentNode::Scalar(Scalar::Null) => Unexpected::Unit,
            DocumentNode::Scalar(Scalar::Bool(b)) => Unexpected::Bool(*b),
            DocumentNode::Scalar(Scalar::Number(Number::PosInt(u))) => Unexpected::Unsigned(*u),
            DocumentNode::Scalar(Scalar::Number(Number::NegInt(i))) => Unexpected::Signed(*i),
            DocumentNode::Scalar(Scalar::Number(Number::Float(f))) => Unexpected::Float(*f),
            DocumentNode::Scalar(Scalar::String(s)) => Unexpected::Str(s),
            DocumentNode::Sequence(_) => Unexpected::Seq,
            DocumentNode::Mapping(_) => Unexpected::Map,
        }
    }
}

impl<'de> IntoDeserializer<'de, ConversionError> for NodeDeserializer<'de> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

fn visit_sequence<'de, V>(
    items: &'de [DocumentNode],
    visitor: V,
) -> Result<V::Value, ConversionError>
where
    V: Visitor<'de>,
{
    let mut access = SeqRef {
        iter: items.iter().enumerate(),
    };
    let value = visitor.visit_seq(&mut access)?;
    let remaining = access.iter.len();
    if remaining == 0 {
        Ok(value)
    } else {
        Err(ConversionError::invalid_length(
            items.len(),
            &"fewer elements in array",
        ))
    }
}

fn visit_mapping<'de, V>(
    entries: &'de indexmap::IndexMap<String, DocumentNode>,
    visitor: V,
) -> Result<V::Value, ConversionError>
where
    V: Visitor<'de>,
{
    let mut access = MapRef {
        iter: entries.iter(),
        pending: None,
    };
    visitor.visit_map(&mut access)
}

impl<'de> Deserializer<'de> for NodeDeserializer<'de> {
    type Error = ConversionError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, ConversionError>
    where
        V: Visitor<'de>,
    {
        match self.node {
            DocumentNode::Missing => Err(ConversionError::new("value is missing")),
            DocumentNode::Scalar(Scalar::Null) => visitor.visit_unit(),
            DocumentNode::Scalar(Scalar::Bool(b)) => visitor.visit_bool(*b),
            DocumentNode::Scalar(Scalar::Number(Number::PosInt(u))) => visitor.visit_u64(*u),
            DocumentNode::Scalar(Scalar::Number(Number::NegInt(i))) => visitor.visit_i64(*i),
            DocumentNode::Scalar(Scalar::Number(Number::Float(f))) => visitor.visit_f64(*f),
            DocumentNode::Scalar(Scalar::String(s)) => visitor.visit_borrowed_str(s),
            DocumentNode::Sequence(items) => visit_sequence(items, visitor),
            DocumentNode::Mapping(entries) => visit_mapping(entries, visitor),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, ConversionError>
    where
        V: Visitor<'de>,
    {
        match self.node {
            DocumentNode::Missing | DocumentNode::Scalar(Scalar::Null) => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, ConversionError>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, ConversionError>
    where
        V: Visitor<'de>,
    {
        match self.node {
            DocumentNode::Scalar(Scalar::String(s)) => {
                let variant: StrDeserializer<'_, ConversionError> = s.as_str().into_deserializer();
                visitor.visit_enum(variant)
            }
            DocumentNode::Mapping(entries) if entries.len() == 1 => {
                let (variant, value) = entries
                    .first()
                    .ok_or_else(|| ConversionError::new("empty enum object"))?;
                visitor.visit_enum(EnumRef { variant, value })
            }
            _ => Err(ConversionError::invalid_type(
                self.unexpected(),
                &"string or single-key object",
            )),
        }
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value, ConversionError>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct
        identifier
    }
}

struct SeqRef<'de> {
    iter: std::iter::Enumerate<slice::Iter<'de, DocumentNode>>,
}

impl<'de> SeqAccess<'de> for SeqRef<'de> {
    type Error = ConversionError;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, ConversionError>
    where
        T: DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((index, node)) => seed
                .deserialize(NodeDeserializer::new(node))
                .map(Some)
                .map_err(|e| e.at(&format!("[{}]", index))),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapRef<'de> {
    iter: map::Iter<'de, String, DocumentNode>,
    pending: Option<(&'de str, &'de DocumentNode)>,
}

impl<'de> MapAccess<'de> for MapRef<'de> {
    type Error = ConversionError;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, ConversionError>
    where
        K: DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.pending = Some((key.as_str(), value));
                seed.deserialize(BorrowedStrDeserializer::new(key.as_str()))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, ConversionError>
    where
        V: DeserializeSeed<'de>,
    {
        let (key, value) = self
            .pending
            .take()
            .ok_or_else(|| ConversionError::new("value requested before key"))?;
        seed.deserialize(NodeDeserializer::new(value))
            .map_err(|e| e.at(key))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumRef<'de> {
    variant: &'de str,
    value: &'de DocumentNode,
}

impl<'de> EnumAccess<'de> for EnumRef<'de> {
    type Error = ConversionError;
    type Variant = VariantRef<'de>;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, VariantRef<'de>), ConversionError>
    where
        V: DeserializeSeed<'de>,
    {
        let variant =
            seed.deserialize(BorrowedStrDeserializer::<ConversionError>::new(self.variant))?;
        Ok((
            variant,
            VariantRef {
                variant: self.variant,
                value: self.value,
            },
        ))
    }
}

struct VariantRef<'de> {
    variant: &'de str,
    value: &'de DocumentNode,
}

impl<'de> VariantAccess<'de> for VariantRef<'de> {
    type Error = ConversionError;

    fn unit_variant(self) -> Result<(), ConversionError> {
        match self.value {
            DocumentNode::Scalar(Scalar::Null) => Ok(()),
            _ => Err(ConversionError::invalid_type(
                NodeDeserializer::new(self.value).unexpected(),
                &"unit variant",
            )
            .at(self.variant)),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value, ConversionError>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(NodeDeserializer::new(self.value))
            .map_err(|e| e.at(self.variant))
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value, ConversionError>
    where
        V: Visitor<'de>,
    {
        match self.value {
            DocumentNode::Sequence(items) => {
                visit_sequence(items, visitor).map_err(|e| e.at(self.variant))
            }
            _ => Err(de::Error::invalid_type(
                NodeDeserializer::new(self.value).unexpected(),
                &"tuple variant",
            )),
        }
    }

    fn struct_variant<V>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, ConversionError>
    where
        V: Visitor<'de>,
    {
        match self.value {
            DocumentNode::Mapping(entries) => {
                visit_mapping(entries, visitor).map_err(|e| e.at(self.variant))
            }
            _ => Err(de::Error::invalid_type(
                NodeDeserializer::new(self.value).unexpected(),
                &"struct variant",
            )),
        }
    }
}
