use serde_json::{Map, Value};

use crate::{Kind, Operation, WireError};

/// The normalized attributes of a command, in the order they are serialized.
pub type Spec = Map<String, Value>;

/// One normalized batch entry: an operation applied to an object of some kind.
///
/// Commands are immutable once constructed. Two structurally equal commands always serialize to
/// the same bytes, because the field order of `spec` is fixed by whoever built it.
///
/// # Wire Format
///
/// ```text
/// { "<operation>": { "<kind>": { <spec> } } }
/// ```
///
/// The whole-ruleset object has no attributes and serializes its spec as `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    operation: Operation,
    kind: Kind,
    spec: Spec,
}

impl Command {
    pub fn new(operation: Operation, kind: Kind, spec: Spec) -> Self {
        Self { operation, kind, spec }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn spec(&self) -> &Spec {
        &self.spec
    }

    /// Returns a single attribute of the spec.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.spec.get(field)
    }

    /// Returns a string attribute of the spec.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.spec.get(field).and_then(Value::as_str)
    }

    pub fn to_wire(&self) -> Value {
        let body = match self.kind {
            Kind::Ruleset => Value::Null,
            _ => Value::Object(self.spec.clone()),
        };

        let mut object = Map::with_capacity(1);
        object.insert(self.kind.as_str().to_string(), body);

        let mut entry = Map::with_capacity(1);
        entry.insert(self.operation.as_str().to_string(), Value::Object(object));
        Value::Object(entry)
    }

    /// Parses a single `{op: {kind: spec}}` entry.
    pub fn from_wire(value: &Value) -> Result<Self, WireError> {
        let (op, object) = single_entry(value, "command")?;
        let operation = op.parse::<Operation>()?;

        let (kind, body) = single_entry(object, "command object")?;
        let kind = kind.parse::<Kind>()?;

        let spec = match body {
            Value::Object(spec) => spec.clone(),
            Value::Null if kind == Kind::Ruleset => Spec::new(),
            other => {
                return Err(WireError::malformed(
                    "command object",
                    format!("expected an object for {kind}, got {other}"),
                ))
            }
        };

        Ok(Self { operation, kind, spec })
    }
}

/// Destructures a JSON object that must contain exactly one key.
pub(crate) fn single_entry<'a>(
    value: &'a Value,
    what: &'static str,
) -> Result<(&'a str, &'a Value), WireError> {
    let object =
        value.as_object().ok_or_else(|| WireError::malformed(what, "expected an object"))?;

    let mut iter = object.iter();
    match (iter.next(), iter.next()) {
        (Some((key, value)), None) => Ok((key.as_str(), value)),
        _ => Err(WireError::malformed(
            what,
            format!("expected exactly one key, found {}", object.len()),
        )),
    }
}
