//! Backend-agnostic document reader.
//!
//! Walks a [`DocumentNode`] tree host by host. For each host object the
//! statically declared members (see [`HostSchema::FIELDS`]) are bound through
//! structural conversion and every other key is reported to the
//! [`UnrecognizedFieldSink`].

use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use crate::error::ReadError;
use crate::host::Extensible;
use crate::intercept::UnrecognizedFieldSink;
use crate::node::DocumentNode;

/// A host entity type with a static schema.
pub trait HostSchema: Extensible + DeserializeOwned {
    /// Keys bound to statically declared members. Keys outside this list are
    /// unrecognized and go to the sink.
    const FIELDS: &'static [&'static str];

    /// Bind members that are themselves hosts.
    ///
    /// Such members are listed in [`FIELDS`](Self::FIELDS) but skipped by the
    /// host's `Deserialize` impl; `declared` holds the declared members not yet
    /// consumed.
    fn read_nested<S: UnrecognizedFieldSink>(
        &mut self,
        _reader: &mut DocumentReader<'_, S>,
        _declared: &mut IndexMap<String, DocumentNode>,
    ) -> Result<(), ReadError> {
        Ok(())
    }
}

/// Reads host entities, reporting unrecognized fields to a sink.
pub struct DocumentReader<'s, S> {
    sink: &'s mut S,
}

impl<'s, S: UnrecognizedFieldSink> DocumentReader<'s, S> {
    pub fn new(sink: &'s mut S) -> Self {
        Self { sink }
    }

    /// Read one host object.
    pub fn read_host<H: HostSchema>(&mut self, node: DocumentNode) -> Result<H, ReadError> {
        let entries = match node {
            DocumentNode::Mapping(entries) => entries,
            other => {
                return Err(ReadError::NotAMapping {
                    host: H::KIND_NAME,
                    found: other.kind(),
                })
            }
        };

        let mut declared = IndexMap::with_capacity(H::FIELDS.len());
        let mut unrecognized = Vec::new();
        for (key, value) in entries {
            if H::FIELDS.contains(&key.as_str()) {
                declared.insert(key, value);
            } else {
                unrecognized.push((key, value));
            }
        }

        let declared_node = DocumentNode::Mapping(declared);
        let mut host: H = declared_node
            .convert_to()
            .map_err(|source| ReadError::Schema {
                host: H::KIND_NAME,
                source,
            })?;

        if let DocumentNode::Mapping(mut declared) = declared_node {
            host.read_nested(self, &mut declared)?;
        }

        for (key, value) in unrecognized {
            self.sink.unrecognized_field(&mut host, &key, value)?;
        }

        Ok(host)
    }

    /// Take the nested host under `key`, if present and not null.
    pub fn read_nested_host<H: HostSchema>(
        &mut self,
        declared: &mut IndexMap<String, DocumentNode>,
        key: &str,
    ) -> Result<Option<H>, ReadError> {
        match declared.shift_remove(key) {
            None => Ok(None),
            Some(node) if node.is_null() => Ok(None),
            Some(node) => self.read_host(node).map(Some),
        }
    }

    /// Like [`read_nested_host`](Self::read_nested_host), for a required member.
    pub fn read_required_host<H: HostSchema, P: Extensible>(
        &mut self,
        declared: &mut IndexMap<String, DocumentNode>,
        key: &str,
    ) -> Result<H, ReadError> {
        self.read_nested_host(declared, key)?
            .ok_or_else(|| ReadError::RequiredFieldMissing {
                host: P::KIND_NAME,
                field: key.to_string(),
            })
    }

    /// Take an array of nested hosts under `key`; absent means empty.
    pub fn read_nested_hosts<H: HostSchema, P: Extensible>(
        &mut self,
        declared: &mut IndexMap<String, DocumentNode>,
        key: &str,
    ) -> Result<Vec<H>, ReadError> {
        match declared.shift_remove(key) {
            None => Ok(Vec::new()),
            Some(DocumentNode::Sequence(items)) => items
                .into_iter()
                .map(|item| self.read_host(item))
                .collect(),
            Some(other) => Err(ReadError::NotASequence {
                host: P::KIND_NAME,
                field: key.to_string(),
                found: other.kind(),
            }),
        }
    }
}
