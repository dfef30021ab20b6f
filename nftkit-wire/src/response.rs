//! Decoding of `nft -j` output.
//!
//! A successful `list` answers with a document whose first entry is usually a `metainfo`
//! object, followed by one single-key object per listed item:
//!
//! ```text
//! {"nftables": [
//!     {"metainfo": {"version": "1.0.9", "json_schema_version": 1}},
//!     {"table": {"family": "inet", "name": "filter", "handle": 1}},
//!     {"chain": {"family": "inet", "table": "filter", "name": "input", ...}}
//! ]}
//! ```
//!
//! Mutating batches produce no output at all, which decodes to an empty [`Listing`].

use serde_json::Value;

use crate::{command::single_entry, Kind, Spec, SerializedBatch, WireError};

/// Version information reported by `nft`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metainfo {
    pub version: Option<String>,
    pub release_name: Option<String>,
    pub json_schema_version: Option<u64>,
}

/// A single object found in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedObject {
    pub kind: Kind,
    pub spec: Spec,
}

impl ListedObject {
    pub fn name(&self) -> Option<&str> {
        self.spec.get("name").and_then(Value::as_str)
    }

    pub fn handle(&self) -> Option<u64> {
        self.spec.get("handle").and_then(Value::as_u64)
    }
}

/// The decoded answer of an `nft -j` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub metainfo: Option<Metainfo>,
    pub objects: Vec<ListedObject>,
}

impl Listing {
    /// Decodes raw `nft -j` stdout. Empty output is a valid, empty listing.
    pub fn parse(output: &str) -> Result<Self, WireError> {
        if output.trim().is_empty() {
            return Ok(Self::default());
        }

        let document = SerializedBatch::parse(output)?;
        Self::from_entries(document.entries())
    }

    pub fn from_entries(entries: &[Value]) -> Result<Self, WireError> {
        let mut listing = Self::default();

        for entry in entries {
            let (key, body) = single_entry(entry, "listing entry")?;

            if key == "metainfo" {
                listing.metainfo = Some(Metainfo {
                    version: body.get("version").and_then(Value::as_str).map(str::to_string),
                    release_name: body
                        .get("release_name")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    json_schema_version: body.get("json_schema_version").and_then(Value::as_u64),
                });
                continue;
            }

            // nft lists objects this crate does not model (ct helpers, secmarks, ...).
            let Ok(kind) = key.parse::<Kind>() else {
                tracing::debug!(key, "skipping unsupported object in listing");
                continue;
            };

            let spec = body
                .as_object()
                .cloned()
                .ok_or_else(|| WireError::malformed("listing entry", format!("{key} is not an object")))?;

            listing.objects.push(ListedObject { kind, spec });
        }

        Ok(listing)
    }

    /// Iterates over the listed objects of one kind.
    pub fn of_kind(&self, kind: Kind) -> impl Iterator<Item = &ListedObject> {
        self.objects.iter().filter(move |o| o.kind == kind)
    }
}
