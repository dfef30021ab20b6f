//! Ambient scope carried between builder calls.
//!
//! A call that names a table, chain, set or map (as its main object or alongside it) leaves that
//! name behind, so later calls can omit it. Calls whose main object is a rule, element or
//! stateful object never change the context.

use nftkit_wire::{Family, Kind};
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::{value::FieldBag, BuildError, Result};

/// Scope fields extracted from one field bag. `None` leaves a slot untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextFields {
    pub family: Option<Family>,
    pub table: Option<String>,
    pub chain: Option<String>,
    /// The set or map an element belongs to.
    pub collection: Option<(Kind, String)>,
    /// The key type of `collection`, e.g. `ipv4_addr` or `inet_service`.
    pub collection_type: Option<Value>,
}

impl ContextFields {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// An immutable snapshot of the ambient scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    family: Family,
    table: Option<String>,
    chain: Option<String>,
    collection: Option<String>,
    collection_kind: Option<Kind>,
    collection_type: Option<Value>,
    /// Whether each collection named so far is a set or a map.
    collection_kinds: FxHashMap<String, Kind>,
}

impl Context {
    pub fn new(family: Family) -> Self {
        Self { family, ..Default::default() }
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn chain(&self) -> Option<&str> {
        self.chain.as_deref()
    }

    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    /// Whether the current collection is a set or a map, if known.
    pub fn collection_kind(&self) -> Option<Kind> {
        self.collection_kind
    }

    pub fn collection_type(&self) -> Option<&Value> {
        self.collection_type.as_ref()
    }

    /// Returns a copy with the given slots overwritten.
    ///
    /// Naming a different collection without a type forgets the previous collection's type.
    pub fn merge(&self, fields: &ContextFields) -> Self {
        let mut next = self.clone();

        if let Some(family) = fields.family {
            next.family = family;
        }
        if let Some(table) = &fields.table {
            next.table = Some(table.clone());
        }
        if let Some(chain) = &fields.chain {
            next.chain = Some(chain.clone());
        }
        if let Some((kind, name)) = &fields.collection {
            if next.collection.as_ref() != Some(name) || next.collection_kind != Some(*kind) {
                next.collection_type = None;
            }
            next.collection = Some(name.clone());
            next.collection_kind = Some(*kind);
            next.collection_kinds.insert(name.clone(), *kind);
        }
        if let Some(ty) = &fields.collection_type {
            next.collection_type = Some(ty.clone());
        }

        next
    }

    /// Returns a copy with slots explicitly overwritten or cleared.
    ///
    /// Accepted keys are `family`, `table`, `chain`, `collection`, `collectionType` and
    /// `collectionKind`. A `null` or empty string clears a slot; clearing `family` restores
    /// `default_family`. Clearing is not checked here: a call that needs the cleared slot fails
    /// later with [`BuildError::MissingContext`].
    ///
    /// Selecting a collection named earlier in the session restores whether it is a set or a
    /// map; `collectionKind` states it for collections the session has not seen.
    pub fn set(&self, fields: &FieldBag, default_family: Family) -> Result<Self> {
        let mut next = self.clone();

        for (key, _) in fields.iter() {
            let value = fields.json(key)?.unwrap_or(&Value::Null);

            match key {
                "family" => {
                    next.family = match string_or_clear(key, value)? {
                        None => default_family,
                        Some(name) => parse_family(name)?,
                    }
                }
                "table" => next.table = string_or_clear(key, value)?.map(str::to_string),
                "chain" => next.chain = string_or_clear(key, value)?.map(str::to_string),
                "collection" => {
                    let collection = string_or_clear(key, value)?.map(str::to_string);
                    if collection != next.collection {
                        next.collection_type = None;
                        next.collection_kind =
                            collection.as_ref().and_then(|name| next.collection_kinds.get(name)).copied();
                    }
                    next.collection = collection;
                }
                _ => {}
            }
        }

        // Applied last, so a type given together with a new collection sticks.
        for (key, _) in fields.iter() {
            let value = fields.json(key)?.unwrap_or(&Value::Null);

            match key {
                "family" | "table" | "chain" | "collection" => {}
                "collectionType" => {
                    next.collection_type = match value {
                        Value::Null => None,
                        Value::String(s) if s.is_empty() => None,
                        Value::String(_) | Value::Array(_) => Some(value.clone()),
                        _ => {
                            return Err(BuildError::invalid_field(
                                key,
                                "expected a type name or a list of type names",
                            ))
                        }
                    }
                }
                "collectionKind" => {
                    next.collection_kind = match string_or_clear(key, value)? {
                        None => None,
                        Some("set") => Some(Kind::Set),
                        Some("map") => Some(Kind::Map),
                        Some(_) => {
                            return Err(BuildError::InvalidEnum {
                                field: key.to_string(),
                                allowed: vec!["set", "map"],
                            })
                        }
                    };
                    if let (Some(name), Some(kind)) = (&next.collection, next.collection_kind) {
                        next.collection_kinds.insert(name.clone(), kind);
                    }
                }
                other => return Err(BuildError::invalid_field(other, "not a context field")),
            }
        }

        Ok(next)
    }
}

/// Parses a family name, listing the accepted names on failure.
pub(crate) fn parse_family(name: &str) -> Result<Family> {
    name.parse::<Family>()
        .map_err(|_| BuildError::InvalidEnum { field: "family".into(), allowed: Family::names() })
}

fn string_or_clear<'a>(key: &str, value: &'a Value) -> Result<Option<&'a str>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        _ => Err(BuildError::invalid_field(key, "expected a string or null")),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::fields;

    fn scoped() -> Context {
        Context::new(Family::Inet).merge(&ContextFields {
            table: Some("filter".into()),
            chain: Some("input".into()),
            collection: Some((Kind::Set, "blocked".into())),
            collection_type: Some(json!("ipv4_addr")),
            ..Default::default()
        })
    }

    #[test]
    fn merge_overwrites_only_named_slots() {
        let ctx = scoped().merge(&ContextFields { chain: Some("forward".into()), ..Default::default() });

        assert_eq!(ctx.family(), Family::Inet);
        assert_eq!(ctx.table(), Some("filter"));
        assert_eq!(ctx.chain(), Some("forward"));
        assert_eq!(ctx.collection_type(), Some(&json!("ipv4_addr")));
    }

    #[test]
    fn changing_collection_forgets_its_type() {
        let same = scoped()
            .merge(&ContextFields { collection: Some((Kind::Set, "blocked".into())), ..Default::default() });
        assert_eq!(same.collection_type(), Some(&json!("ipv4_addr")));

        let other = scoped()
            .merge(&ContextFields { collection: Some((Kind::Map, "ports".into())), ..Default::default() });
        assert_eq!(other.collection(), Some("ports"));
        assert_eq!(other.collection_kind(), Some(Kind::Map));
        assert_eq!(other.collection_type(), None);
    }

    #[test]
    fn set_overwrites_and_clears() {
        let ctx = scoped()
            .set(&fields! { "chain" => Value::Null, "table" => "nat", "family" => "ip6" }, Family::Ip)
            .unwrap();

        assert_eq!(ctx.chain(), None);
        assert_eq!(ctx.table(), Some("nat"));
        assert_eq!(ctx.family(), Family::Ip6);

        let ctx = ctx.set(&fields! { "family" => "" }, Family::Ip).unwrap();
        assert_eq!(ctx.family(), Family::Ip);

        let ctx = ctx
            .set(&fields! { "collection" => "ports", "collectionType" => "inet_service" }, Family::Ip)
            .unwrap();
        assert_eq!(ctx.collection(), Some("ports"));
        assert_eq!(ctx.collection_type(), Some(&json!("inet_service")));
    }

    #[test]
    fn set_remembers_collection_kinds() {
        let ctx = scoped()
            .merge(&ContextFields { collection: Some((Kind::Map, "svc".into())), ..Default::default() })
            .set(&fields! { "collection" => "other" }, Family::Ip)
            .unwrap();
        assert_eq!(ctx.collection_kind(), None);

        let ctx = ctx.set(&fields! { "collection" => "svc" }, Family::Ip).unwrap();
        assert_eq!(ctx.collection_kind(), Some(Kind::Map));

        let ctx = ctx
            .set(&fields! { "collection" => "fresh", "collectionKind" => "map" }, Family::Ip)
            .unwrap();
        assert_eq!(ctx.collection_kind(), Some(Kind::Map));

        let ctx = ctx.set(&fields! { "collection" => "blocked" }, Family::Ip).unwrap();
        assert_eq!(ctx.collection_kind(), Some(Kind::Set));
        let ctx = ctx.set(&fields! { "collection" => "fresh" }, Family::Ip).unwrap();
        assert_eq!(ctx.collection_kind(), Some(Kind::Map));

        assert!(matches!(
            ctx.set(&fields! { "collectionKind" => "list" }, Family::Ip),
            Err(BuildError::InvalidEnum { field, .. }) if field == "collectionKind"
        ));
    }

    #[test]
    fn set_rejects_bad_input() {
        let ctx = Context::default();

        assert_eq!(
            ctx.set(&fields! { "family" => "ipx" }, Family::Ip).unwrap_err(),
            BuildError::InvalidEnum { field: "family".into(), allowed: Family::names() }
        );
        assert!(matches!(
            ctx.set(&fields! { "table" => 7 }, Family::Ip),
            Err(BuildError::InvalidField { field, .. }) if field == "table"
        ));
        assert!(matches!(
            ctx.set(&fields! { "hook" => "input" }, Family::Ip),
            Err(BuildError::InvalidField { field, .. }) if field == "hook"
        ));
    }
}
