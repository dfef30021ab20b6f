//! Picks the main object of a field bag.
//!
//! Every key that identifies a kind is a candidate. The candidate with the highest priority is
//! the main object; the others must be scope kinds (table, chain, set, map) and become context:
//!
//! ```text
//!   { table: "filter", chain: "input", rule: [...] }
//!     table (0) -> context.table
//!     chain (1) -> context.chain
//!     rule  (2) -> main object
//! ```
//!
//! Lower-priority kinds without a context slot (rule, flowtable, counter, quota, limit) are kept
//! in [`Classified::unscoped`] and rejected when commands are built.

use nftkit_wire::{Kind, Operation};
use serde_json::Value;

use crate::{
    context::{parse_family, ContextFields},
    registry::{self, Schema},
    value::{FieldBag, FieldValue},
    BuildError, Result,
};

/// The outcome of classifying a field bag.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub kind: Kind,
    /// The bag key the main object was found under, e.g. `rules` for a rule list.
    pub key: &'static str,
    pub value: FieldValue,
    /// Scope named alongside the main object, plus `family` if given.
    pub context: ContextFields,
    /// Lower-priority kinds found alongside the main object that cannot act as its scope.
    pub unscoped: Vec<(Kind, &'static str)>,
}

impl Classified {
    pub fn schema(&self) -> &'static Schema {
        registry::schema_of(self.kind)
    }

    /// Whether the main object is a list of rules rather than a single one.
    pub fn is_plural(&self) -> bool {
        self.kind == Kind::Rule && self.key != self.schema().keys[0]
    }

    /// The context left behind once `operation` succeeded.
    ///
    /// Scope objects record themselves, `family` sticks only together with a table, and adding
    /// a set or map records its key type.
    pub fn scope_update(&self, operation: Operation, fields: &FieldBag) -> ContextFields {
        let mut update = self.context.clone();
        let name = self.value.as_str().filter(|s| !s.is_empty()).map(str::to_string);

        match self.kind {
            Kind::Table => update.table = name,
            // The old name is gone once the rename applies.
            Kind::Chain if operation == Operation::Rename => {
                update.chain = fields
                    .get("newname")
                    .and_then(FieldValue::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string);
            }
            Kind::Chain => update.chain = name,
            Kind::Set | Kind::Map => {
                update.collection = name.map(|n| (self.kind, n));
                if operation == Operation::Add {
                    update.collection_type =
                        fields.get("type").and_then(FieldValue::as_json).cloned();
                }
            }
            _ => {}
        }

        if update.table.is_none() {
            update.family = None;
        }

        update
    }
}

/// Finds the main object and the scope carried by `fields`.
///
/// Key order never matters: the result only depends on which keys are present.
pub fn classify(fields: &FieldBag) -> Result<Classified> {
    let mut found: Vec<(&'static Schema, &'static str)> = Vec::new();

    for key in fields.keys() {
        let Some(schema) = registry::schema_for_key(key) else { continue };
        let key = schema.keys.iter().copied().find(|k| *k == key).unwrap_or(schema.keys[0]);

        // Two aliases of the same kind, e.g. `rule` and `rules`.
        if let Some((_, other)) = found.iter().find(|(s, _)| s.kind == schema.kind) {
            let mut candidates = vec![*other, key];
            candidates.sort_unstable();
            return Err(BuildError::AmbiguousObject { candidates });
        }
        found.push((schema, key));
    }

    let top = found.iter().map(|(s, _)| s.priority).max().ok_or(BuildError::NoObject)?;

    let mut main: Vec<_> = found.iter().filter(|(s, _)| s.priority == top).collect();
    if main.len() > 1 {
        let mut candidates: Vec<_> = main.iter().map(|(_, key)| *key).collect();
        candidates.sort_unstable();
        return Err(BuildError::AmbiguousObject { candidates });
    }
    let (schema, key) = *main.remove(0);

    let mut context = ContextFields::default();
    let mut collections = Vec::new();
    let mut unscoped = Vec::new();

    for (scope, scope_key) in found.iter().filter(|(s, _)| s.priority < top) {
        if !scope.is_scope() {
            unscoped.push((scope.kind, *scope_key));
            continue;
        }

        let name = scope_name(fields, scope_key)?;
        match scope.kind {
            Kind::Table => context.table = Some(name),
            Kind::Chain => context.chain = Some(name),
            _ => collections.push((scope.kind, *scope_key, name)),
        }
    }

    if collections.len() > 1 {
        let mut candidates: Vec<_> = collections.iter().map(|(_, key, _)| *key).collect();
        candidates.sort_unstable();
        return Err(BuildError::AmbiguousObject { candidates });
    }
    context.collection = collections.pop().map(|(kind, _, name)| (kind, name));

    if let Some(family) = fields.json("family")? {
        let name = family
            .as_str()
            .ok_or_else(|| BuildError::invalid_field("family", "expected a string"))?;
        context.family = Some(parse_family(name)?);
    }

    let value = fields.get(key).cloned().unwrap_or(FieldValue::Json(Value::Null));

    unscoped.sort_unstable_by_key(|(_, key)| *key);

    Ok(Classified { kind: schema.kind, key, value, context, unscoped })
}

fn scope_name(fields: &FieldBag, key: &str) -> Result<String> {
    match fields.json(key)? {
        Some(Value::String(name)) if !name.is_empty() => Ok(name.clone()),
        _ => Err(BuildError::invalid_field(key, "expected a non-empty name")),
    }
}
