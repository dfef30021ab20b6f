//! Turns a classified field bag into normalized commands.

use nftkit_wire::{Command, Kind, Operation, Spec};
use serde_json::Value;

use crate::{
    classify::Classified,
    context::Context,
    registry::{self, check_element, FieldSpec, Schema, Scope, ValueSlot},
    value::{FieldBag, FieldValue, RuleExpr},
    BuildError, Result,
};

/// Builds the commands for `operation` on the classified main object.
///
/// Scope is resolved from the bag first and `context` second. Nothing is mutated: the caller
/// decides whether to keep the result.
pub fn build(
    operation: Operation,
    classified: &Classified,
    fields: &FieldBag,
    context: &Context,
) -> Result<Vec<Command>> {
    let schema = classified.schema();

    if !schema.supports(operation) {
        return Err(unsupported(operation, schema.kind, schema.operations));
    }
    if classified.is_plural() && !matches!(operation, Operation::Add | Operation::Insert) {
        return Err(unsupported(operation, schema.kind, &[Operation::Add, Operation::Insert]));
    }
    if let Some((kind, key)) = classified.unscoped.first() {
        return Err(BuildError::invalid_field(
            *key,
            format!("{kind} cannot be used as context for {}", schema.kind),
        ));
    }

    let scope = context.merge(&classified.context);
    let mut entries = resolve_scope(schema, &scope)?;

    entries.extend(attributes(operation, schema, fields)?);

    let commands = match schema.value {
        ValueSlot::Name => {
            entries.push(("name", Value::from(object_name(classified)?)));
            vec![emit(operation, schema, entries)]
        }
        ValueSlot::Elem => {
            entries.push(("elem", elements(operation, classified, &scope)?));
            vec![emit(operation, schema, entries)]
        }
        ValueSlot::Expr if operation == Operation::Delete => vec![emit(operation, schema, entries)],
        ValueSlot::Expr => rule_exprs(classified)?
            .into_iter()
            .map(|expr| {
                let mut entries = entries.clone();
                entries.push(("expr", Value::Array(expr)));
                emit(operation, schema, entries)
            })
            .collect(),
        ValueSlot::None => vec![emit(operation, schema, entries)],
    };

    Ok(commands)
}

fn unsupported(operation: Operation, kind: Kind, valid: &[Operation]) -> BuildError {
    BuildError::UnsupportedOperation { operation, kind, valid: valid.to_vec() }
}

fn resolve_scope(schema: &Schema, scope: &Context) -> Result<Vec<(&'static str, Value)>> {
    schema
        .scope
        .iter()
        .map(|field| {
            let value = match field {
                Scope::Family => Some(scope.family().as_str()),
                Scope::Table => scope.table(),
                Scope::Chain => scope.chain(),
                Scope::Collection => scope.collection(),
            };

            value.map(|v| (field.wire_name(), Value::from(v))).ok_or_else(|| missing_context(*field))
        })
        .collect()
}

fn missing_context(field: Scope) -> BuildError {
    let (field, hint) = match field {
        Scope::Family => ("family", "family always has a default"),
        Scope::Table => ("table", "name a table in this call or an earlier one"),
        Scope::Chain => ("chain", "name a chain in this call or an earlier one"),
        Scope::Collection => ("collection", "name the set or map the elements belong to"),
    };
    BuildError::MissingContext { field, hint }
}

/// Collects, checks and defaults the attributes that apply to `operation`.
fn attributes(
    operation: Operation,
    schema: &'static Schema,
    fields: &FieldBag,
) -> Result<Vec<(&'static str, Value)>> {
    let mut present: Vec<(&'static FieldSpec, Value)> = Vec::new();

    for key in fields.keys() {
        if key == "family" || registry::is_identifying_key(key) {
            continue;
        }

        let field = schema.attribute(key).ok_or_else(|| {
            BuildError::invalid_field(key, format!("not an attribute of {}", schema.kind))
        })?;
        if !field.applies_to(operation) {
            continue;
        }

        if let Some(value) = fields.json(key)? {
            present.push((field, value.clone()));
        }
    }

    // Base chains: a hook makes the chain a base chain, which always has a type and priority.
    if schema.kind == Kind::Chain && operation == Operation::Add {
        let has = |present: &[(&FieldSpec, Value)], name: &str| {
            present.iter().any(|(f, _)| f.name == name)
        };
        if has(&present, "hook") {
            for (name, default) in [("type", Value::from("filter")), ("prio", Value::from(0))] {
                if !has(&present, name) {
                    if let Some(field) = schema.attribute(name) {
                        present.push((field, default));
                    }
                }
            }
        } else if let Some(name) = ["type", "prio", "policy"].into_iter().find(|n| has(&present, n)) {
            tracing::debug!(name, "base chain attribute given without a hook");
            return Err(BuildError::MissingField { kind: Kind::Chain, field: "hook" });
        }
    }

    for field in schema.attributes {
        if present.iter().any(|(f, _)| f.name == field.name) || !field.applies_to(operation) {
            continue;
        }
        if field.is_required_on(operation) {
            return Err(BuildError::MissingField { kind: schema.kind, field: field.name });
        }
        if let Some(default) = field.default {
            present.push((field, default.to_value()));
        }
    }

    present
        .into_iter()
        .map(|(field, value)| {
            field.check.validate(field.name, &value)?;
            Ok((field.wire, value))
        })
        .collect()
}

fn object_name(classified: &Classified) -> Result<&str> {
    classified
        .value
        .as_str()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| BuildError::invalid_field(classified.key, "expected a non-empty name"))
}

fn elements(operation: Operation, classified: &Classified, scope: &Context) -> Result<Value> {
    let elements = match &classified.value {
        FieldValue::Json(Value::Array(elements)) if !elements.is_empty() => elements,
        _ => return Err(BuildError::invalid_field(classified.key, "expected a non-empty list")),
    };

    let is_map = scope.collection_kind() == Some(Kind::Map);
    for element in elements {
        match element {
            Value::Array(pair) if is_map && operation == Operation::Add => {
                let [key, _] = pair.as_slice() else {
                    return Err(BuildError::invalid_field("elem", "expected a [key, value] pair"));
                };
                check_element(scope.collection_type(), key)?;
            }
            _ if is_map && operation == Operation::Add => {
                return Err(BuildError::invalid_field("elem", "expected a [key, value] pair"))
            }
            element => check_element(scope.collection_type(), element)?,
        }
    }

    Ok(Value::Array(elements.clone()))
}

/// Resolves the rule value into one fragment list per command.
fn rule_exprs(classified: &Classified) -> Result<Vec<Vec<Value>>> {
    let invalid = |reason: &str| BuildError::invalid_field(classified.key, reason);

    let rules: Vec<RuleExpr> = match (&classified.value, classified.is_plural()) {
        (FieldValue::Rule(rule), false) => vec![rule.clone()],
        (FieldValue::Json(Value::Array(fragments)), false) => {
            vec![RuleExpr::Raw(fragments.clone())]
        }
        (FieldValue::Rules(rules), true) => rules.clone(),
        (FieldValue::Json(Value::Array(rules)), true) => rules
            .iter()
            .map(|rule| match rule {
                Value::Array(fragments) => Ok(RuleExpr::Raw(fragments.clone())),
                _ => Err(invalid("expected a list of expression lists")),
            })
            .collect::<Result<_>>()?,
        (_, false) => return Err(invalid("expected an expression list")),
        (_, true) => return Err(invalid("expected a list of rules")),
    };

    if rules.is_empty() {
        return Err(invalid("expected at least one rule"));
    }

    rules.into_iter().map(RuleExpr::resolve).collect()
}

/// Lays the entries out in the wire order of `schema`.
fn emit(operation: Operation, schema: &Schema, mut entries: Vec<(&'static str, Value)>) -> Command {
    let mut spec = Spec::with_capacity(entries.len());

    for key in schema.order {
        if let Some(pos) = entries.iter().position(|(k, _)| k == key) {
            let (key, value) = entries.swap_remove(pos);
            spec.insert(key.to_string(), value);
        }
    }

    Command::new(operation, schema.kind, spec)
}
