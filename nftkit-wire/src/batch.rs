//! The serialized form of a batch.
//!
//! A batch is an ordered JSON array of `{op: {kind: spec}}` entries. The `nft` JSON API expects
//! that array wrapped in a document:
//!
//! ```text
//! { "nftables": [ { "add": { "table": { ... } } }, { "add": { "chain": { ... } } } ] }
//! ```
//!
//! [`SerializedBatch`] keeps the bare array and produces the document on demand, so the same
//! value can be handed to any submitter regardless of what it expects.

use std::fmt;

use serde_json::{Map, Value};

use crate::{command::single_entry, Command, WireError, DOCUMENT_KEY};

/// An immutable, already serialized batch (or query) ready to be handed to a submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedBatch {
    entries: Vec<Value>,
}

impl SerializedBatch {
    /// Serializes a sequence of commands, preserving their order. This cannot fail.
    pub fn encode<'a>(commands: impl IntoIterator<Item = &'a Command>) -> Self {
        Self { entries: commands.into_iter().map(Command::to_wire).collect() }
    }

    /// Wraps raw wire entries. Used for query documents, which are not [`Command`]s.
    pub fn from_entries(entries: Vec<Value>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Value] {
        &self.entries
    }

    /// The bare wire array.
    pub fn to_array(&self) -> Value {
        Value::Array(self.entries.clone())
    }

    /// The `{"nftables": [...]}` document understood by `nft -j -f`.
    pub fn to_document(&self) -> Value {
        let mut document = Map::with_capacity(1);
        document.insert(DOCUMENT_KEY.to_string(), self.to_array());
        Value::Object(document)
    }

    /// Parses the serialized commands back, in order.
    pub fn commands(&self) -> Result<Vec<Command>, WireError> {
        self.entries.iter().map(Command::from_wire).collect()
    }

    /// Parses either a bare wire array or an `{"nftables": [...]}` document.
    pub fn parse(input: &str) -> Result<Self, WireError> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, WireError> {
        let entries = match value {
            Value::Array(entries) => entries,
            ref document @ Value::Object(_) => {
                let (key, inner) = single_entry(document, "document")?;
                if key != DOCUMENT_KEY {
                    return Err(WireError::malformed(
                        "document",
                        format!("expected top-level key {DOCUMENT_KEY:?}, found {key:?}"),
                    ));
                }
                inner
                    .as_array()
                    .cloned()
                    .ok_or_else(|| WireError::malformed("document", "expected an array"))?
            }
            other => {
                return Err(WireError::malformed(
                    "batch",
                    format!("expected an array or a document, got {other}"),
                ))
            }
        };

        Ok(Self { entries })
    }
}

impl fmt::Display for SerializedBatch {
    /// Writes the compact JSON form of the bare array.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_array())
    }
}
