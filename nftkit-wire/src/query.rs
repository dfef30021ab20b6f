//! Read-only `list` documents.
//!
//! Queries never mutate the ruleset. They are serialized like a batch with a single `list`
//! entry so they can travel through the same submitters; the answer is decoded with
//! [`crate::response::Listing`].

use serde_json::{json, Value};

use crate::{Family, SerializedBatch};

/// Something that can be listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Everything, in every family.
    Ruleset,
    Table { family: Family, name: String },
    Chain { family: Family, table: String, name: String },
    Set { family: Family, table: String, name: String },
    Map { family: Family, table: String, name: String },
}

impl Query {
    pub fn table(family: Family, name: impl Into<String>) -> Self {
        Self::Table { family, name: name.into() }
    }

    pub fn chain(family: Family, table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Chain { family, table: table.into(), name: name.into() }
    }

    pub fn set(family: Family, table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Set { family, table: table.into(), name: name.into() }
    }

    pub fn map(family: Family, table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Map { family, table: table.into(), name: name.into() }
    }

    pub fn to_wire(&self) -> Value {
        let object = match self {
            Self::Ruleset => json!({ "ruleset": null }),
            Self::Table { family, name } => json!({ "table": { "family": family, "name": name } }),
            Self::Chain { family, table, name } => {
                json!({ "chain": { "family": family, "table": table, "name": name } })
            }
            Self::Set { family, table, name } => {
                json!({ "set": { "family": family, "table": table, "name": name } })
            }
            Self::Map { family, table, name } => {
                json!({ "map": { "family": family, "table": table, "name": name } })
            }
        };

        json!({ "list": object })
    }

    pub fn serialize(&self) -> SerializedBatch {
        SerializedBatch::from_entries(vec![self.to_wire()])
    }
}
