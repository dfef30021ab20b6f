//! The kind registry.
//!
//! A fixed table describing, for every object [`Kind`]:
//!
//! - its classification priority (lower is more contextual),
//! - the field bag keys that identify it (the first one is canonical, the rest are aliases),
//! - which scope fields it needs resolved from the bag or the context,
//! - where the main value goes on the wire,
//! - its attributes, with presence rules, defaults and validators,
//! - the operations it supports,
//! - the order of its fields on the wire.
//!
//! ```text
//!   priority   0        1        2        3                                   4
//!            table -> chain -> rule    set | map | flowtable | counter ...  element
//! ```
//!
//! The registry is pure data: no state, no side effects.

use std::{fmt, net::IpAddr};

use nftkit_wire::{Kind, Operation};
use serde_json::Value;

use crate::BuildError;

use Operation::{Add, Delete, Flush, Insert, Rename, Replace};

/// Scope fields, resolved from the field bag first and the context second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Family,
    Table,
    Chain,
    /// The enclosing set or map of an element. Serialized as `name`.
    Collection,
}

impl Scope {
    pub const fn wire_name(&self) -> &'static str {
        match self {
            Self::Family => "family",
            Self::Table => "table",
            Self::Chain => "chain",
            Self::Collection => "name",
        }
    }
}

/// Where the value of the identifying key ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSlot {
    /// The object name, serialized as `name`.
    Name,
    /// A rule expression list, serialized as `expr`.
    Expr,
    /// A list of set/map elements, serialized as `elem`.
    Elem,
    /// Nothing, the object has no identifying value.
    None,
}

/// A pure predicate over a JSON value, with a description used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Str,
    Bool,
    /// An integer within `min..=max`.
    Range { min: i64, max: i64 },
    /// A string out of a fixed set.
    OneOf(&'static [&'static str]),
    /// A non-empty list of strings out of a fixed set.
    ListOf(&'static [&'static str]),
    /// A non-empty string, or a non-empty list of non-empty strings.
    Strs,
}

/// TCP/UDP port numbers.
pub const PORT: Check = Check::Range { min: 0, max: 65_535 };
/// 802.1Q VLAN identifiers.
pub const VLAN_ID: Check = Check::Range { min: 0, max: 4_095 };
/// Differentiated services code points.
pub const DSCP: Check = Check::Range { min: 0, max: 63 };
/// Packet marks.
pub const MARK: Check = Check::Range { min: 0, max: u32::MAX as i64 };
/// Hook priorities are signed 32-bit.
pub const PRIORITY: Check = Check::Range { min: i32::MIN as i64, max: i32::MAX as i64 };
/// Byte and packet counters, handles, sizes, timeouts.
pub const NON_NEGATIVE: Check = Check::Range { min: 0, max: i64::MAX };

pub const CHAIN_TYPES: &[&str] = &["filter", "nat", "route"];
pub const CHAIN_HOOKS: &[&str] =
    &["prerouting", "input", "forward", "output", "postrouting", "ingress", "egress"];
pub const POLICIES: &[&str] = &["accept", "drop"];
pub const SET_FLAGS: &[&str] = &["constant", "interval", "timeout", "dynamic"];
pub const TIME_UNITS: &[&str] = &["second", "minute", "hour", "day", "week"];
pub const FLOWTABLE_HOOKS: &[&str] = &["ingress"];
pub const FLOWTABLE_FLAGS: &[&str] = &["offload"];
pub const CT_STATES: &[&str] = &["new", "established", "related", "invalid", "untracked"];

impl Check {
    /// Runs the predicate, naming `field` in the error.
    pub fn validate(&self, field: &str, value: &Value) -> Result<(), BuildError> {
        match self {
            Self::Str => match value {
                Value::String(_) => Ok(()),
                _ => Err(BuildError::invalid_field(field, "expected a string")),
            },
            Self::Bool => match value {
                Value::Bool(_) => Ok(()),
                _ => Err(BuildError::invalid_field(field, "expected a boolean")),
            },
            Self::Range { min, max } => {
                let out_of_range = || BuildError::Range { field: field.to_string(), bound: self.to_string() };
                if let Some(n) = value.as_i64() {
                    if n < *min || n > *max {
                        return Err(out_of_range());
                    }
                    Ok(())
                } else if value.is_u64() {
                    // Larger than i64::MAX.
                    Err(out_of_range())
                } else {
                    Err(BuildError::invalid_field(field, "expected an integer"))
                }
            }
            Self::OneOf(allowed) => match value.as_str() {
                Some(s) if allowed.contains(&s) => Ok(()),
                Some(_) => {
                    Err(BuildError::InvalidEnum { field: field.to_string(), allowed: allowed.to_vec() })
                }
                None => Err(BuildError::invalid_field(field, "expected a string")),
            },
            Self::ListOf(allowed) => {
                let items = value
                    .as_array()
                    .filter(|items| !items.is_empty())
                    .ok_or_else(|| BuildError::invalid_field(field, "expected a non-empty list"))?;
                items.iter().try_for_each(|item| Self::OneOf(allowed).validate(field, item))
            }
            Self::Strs => {
                let non_empty = |v: &Value| v.as_str().is_some_and(|s| !s.is_empty());
                match value {
                    Value::String(_) if non_empty(value) => Ok(()),
                    Value::Array(items) if !items.is_empty() && items.iter().all(non_empty) => Ok(()),
                    _ => Err(BuildError::invalid_field(field, "expected a string or a list of strings")),
                }
            }
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str => f.write_str("a string"),
            Self::Bool => f.write_str("a boolean"),
            Self::Range { min, max } if *max == i64::MAX => write!(f, ">= {min}"),
            Self::Range { min, max } => write!(f, "{min}..={max}"),
            Self::OneOf(allowed) => write!(f, "one of {allowed:?}"),
            Self::ListOf(allowed) => write!(f, "a list of {allowed:?}"),
            Self::Strs => f.write_str("a string or a list of strings"),
        }
    }
}

/// A default applied when an optional attribute is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Int(i64),
    Bool(bool),
    Str(&'static str),
}

impl DefaultValue {
    pub fn to_value(self) -> Value {
        match self {
            Self::Int(n) => Value::from(n),
            Self::Bool(b) => Value::from(b),
            Self::Str(s) => Value::from(s),
        }
    }
}

/// An attribute of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// The field bag key.
    pub name: &'static str,
    /// The key on the wire. Only differs from `name` when the bag key is taken by a kind.
    pub wire: &'static str,
    /// Operations that carry this attribute. It is ignored for every other operation.
    pub on: &'static [Operation],
    /// Operations for which the attribute must be present.
    pub required_on: &'static [Operation],
    pub default: Option<DefaultValue>,
    pub check: Check,
}

impl FieldSpec {
    pub const fn new(name: &'static str, on: &'static [Operation], check: Check) -> Self {
        Self { name, wire: name, on, required_on: &[], default: None, check }
    }

    pub const fn wire(mut self, wire: &'static str) -> Self {
        self.wire = wire;
        self
    }

    pub const fn required_on(mut self, ops: &'static [Operation]) -> Self {
        self.required_on = ops;
        self
    }

    pub const fn default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn applies_to(&self, operation: Operation) -> bool {
        self.on.contains(&operation)
    }

    pub fn is_required_on(&self, operation: Operation) -> bool {
        self.required_on.contains(&operation)
    }
}

/// The declared shape of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub kind: Kind,
    pub priority: u8,
    /// Identifying field bag keys. The first is canonical.
    pub keys: &'static [&'static str],
    pub scope: &'static [Scope],
    pub value: ValueSlot,
    pub attributes: &'static [FieldSpec],
    pub operations: &'static [Operation],
    /// Wire field order.
    pub order: &'static [&'static str],
}

impl Schema {
    pub fn supports(&self, operation: Operation) -> bool {
        self.operations.contains(&operation)
    }

    pub fn attribute(&self, name: &str) -> Option<&'static FieldSpec> {
        self.attributes.iter().find(|f| f.name == name)
    }

    /// Whether this kind can provide ambient scope to other kinds.
    pub const fn is_scope(&self) -> bool {
        matches!(self.kind, Kind::Table | Kind::Chain | Kind::Set | Kind::Map)
    }
}

const ALL_WRITES: &[Operation] = &[Add, Insert, Replace];

static TABLE: Schema = Schema {
    kind: Kind::Table,
    priority: 0,
    keys: &["table"],
    scope: &[Scope::Family],
    value: ValueSlot::Name,
    attributes: &[],
    operations: &[Add, Delete, Flush],
    order: &["family", "name"],
};

static CHAIN: Schema = Schema {
    kind: Kind::Chain,
    priority: 1,
    keys: &["chain"],
    scope: &[Scope::Family, Scope::Table],
    value: ValueSlot::Name,
    attributes: &[
        FieldSpec::new("newname", &[Rename], Check::Str).required_on(&[Rename]),
        FieldSpec::new("type", &[Add], Check::OneOf(CHAIN_TYPES)),
        FieldSpec::new("hook", &[Add], Check::OneOf(CHAIN_HOOKS)),
        FieldSpec::new("prio", &[Add], PRIORITY),
        FieldSpec::new("policy", &[Add], Check::OneOf(POLICIES)),
        FieldSpec::new("dev", &[Add], Check::Strs),
    ],
    operations: &[Add, Delete, Flush, Rename],
    order: &["family", "table", "name", "newname", "type", "hook", "prio", "policy", "dev"],
};

static RULE: Schema = Schema {
    kind: Kind::Rule,
    priority: 2,
    keys: &["rule", "rules"],
    scope: &[Scope::Family, Scope::Table, Scope::Chain],
    value: ValueSlot::Expr,
    attributes: &[
        FieldSpec::new("handle", &[Add, Insert, Replace, Delete], NON_NEGATIVE)
            .required_on(&[Replace, Delete]),
        FieldSpec::new("index", &[Add, Insert], NON_NEGATIVE),
        FieldSpec::new("comment", ALL_WRITES, Check::Str),
    ],
    operations: &[Add, Insert, Replace, Delete],
    order: &["family", "table", "chain", "handle", "index", "comment", "expr"],
};

static SET: Schema = Schema {
    kind: Kind::Set,
    priority: 3,
    keys: &["set"],
    scope: &[Scope::Family, Scope::Table],
    value: ValueSlot::Name,
    attributes: &[
        FieldSpec::new("type", &[Add], Check::Strs).required_on(&[Add]),
        FieldSpec::new("flags", &[Add], Check::ListOf(SET_FLAGS)),
        FieldSpec::new("timeout", &[Add], NON_NEGATIVE),
        FieldSpec::new("size", &[Add], NON_NEGATIVE),
    ],
    operations: &[Add, Delete, Flush],
    order: &["family", "table", "name", "type", "flags", "timeout", "size"],
};

static MAP: Schema = Schema {
    kind: Kind::Map,
    priority: 3,
    keys: &["map"],
    scope: &[Scope::Family, Scope::Table],
    value: ValueSlot::Name,
    attributes: &[
        FieldSpec::new("type", &[Add], Check::Strs).required_on(&[Add]),
        FieldSpec::new("mapType", &[Add], Check::Str).wire("map").required_on(&[Add]),
    ],
    operations: &[Add, Delete, Flush],
    order: &["family", "table", "name", "type", "map"],
};

static ELEMENT: Schema = Schema {
    kind: Kind::Element,
    priority: 4,
    keys: &["element"],
    scope: &[Scope::Family, Scope::Table, Scope::Collection],
    value: ValueSlot::Elem,
    attributes: &[],
    operations: &[Add, Delete],
    order: &["family", "table", "name", "elem"],
};

static FLOWTABLE: Schema = Schema {
    kind: Kind::Flowtable,
    priority: 3,
    keys: &["flowtable"],
    scope: &[Scope::Family, Scope::Table],
    value: ValueSlot::Name,
    attributes: &[
        FieldSpec::new("hook", &[Add], Check::OneOf(FLOWTABLE_HOOKS))
            .default(DefaultValue::Str("ingress")),
        FieldSpec::new("prio", &[Add], PRIORITY).required_on(&[Add]),
        FieldSpec::new("dev", &[Add], Check::Strs).required_on(&[Add]),
        FieldSpec::new("flags", &[Add], Check::ListOf(FLOWTABLE_FLAGS)),
    ],
    operations: &[Add, Delete],
    order: &["family", "table", "name", "hook", "prio", "dev", "flags"],
};

static COUNTER: Schema = Schema {
    kind: Kind::Counter,
    priority: 3,
    keys: &["counter"],
    scope: &[Scope::Family, Scope::Table],
    value: ValueSlot::Name,
    attributes: &[
        FieldSpec::new("packets", &[Add], NON_NEGATIVE).default(DefaultValue::Int(0)),
        FieldSpec::new("bytes", &[Add], NON_NEGATIVE).default(DefaultValue::Int(0)),
    ],
    operations: &[Add, Delete],
    order: &["family", "table", "name", "packets", "bytes"],
};

static QUOTA: Schema = Schema {
    kind: Kind::Quota,
    priority: 3,
    keys: &["quota"],
    scope: &[Scope::Family, Scope::Table],
    value: ValueSlot::Name,
    attributes: &[
        FieldSpec::new("bytes", &[Add], NON_NEGATIVE).required_on(&[Add]),
        FieldSpec::new("used", &[Add], NON_NEGATIVE).default(DefaultValue::Int(0)),
        FieldSpec::new("over", &[Add], Check::Bool).default(DefaultValue::Bool(false)),
    ],
    operations: &[Add, Delete],
    order: &["family", "table", "name", "bytes", "used", "over"],
};

static LIMIT: Schema = Schema {
    kind: Kind::Limit,
    priority: 3,
    keys: &["limit"],
    scope: &[Scope::Family, Scope::Table],
    value: ValueSlot::Name,
    attributes: &[
        FieldSpec::new("rate", &[Add], NON_NEGATIVE).required_on(&[Add]),
        FieldSpec::new("per", &[Add], Check::OneOf(TIME_UNITS)).required_on(&[Add]),
        FieldSpec::new("burst", &[Add], NON_NEGATIVE).default(DefaultValue::Int(0)),
    ],
    operations: &[Add, Delete],
    order: &["family", "table", "name", "rate", "per", "burst"],
};

/// The whole ruleset has no identifying key, so it is never classified.
static RULESET: Schema = Schema {
    kind: Kind::Ruleset,
    priority: 0,
    keys: &[],
    scope: &[],
    value: ValueSlot::None,
    attributes: &[],
    operations: &[Flush],
    order: &[],
};

/// Every classifiable schema, in [`Kind::OBJECTS`] order.
pub static SCHEMAS: [&Schema; 10] =
    [&TABLE, &CHAIN, &RULE, &SET, &MAP, &ELEMENT, &FLOWTABLE, &COUNTER, &QUOTA, &LIMIT];

pub fn schema_of(kind: Kind) -> &'static Schema {
    match kind {
        Kind::Table => &TABLE,
        Kind::Chain => &CHAIN,
        Kind::Rule => &RULE,
        Kind::Set => &SET,
        Kind::Map => &MAP,
        Kind::Element => &ELEMENT,
        Kind::Flowtable => &FLOWTABLE,
        Kind::Counter => &COUNTER,
        Kind::Quota => &QUOTA,
        Kind::Limit => &LIMIT,
        Kind::Ruleset => &RULESET,
    }
}

pub fn priority_of(kind: Kind) -> u8 {
    schema_of(kind).priority
}

/// Looks up the schema identified by a field bag key, including aliases.
pub fn schema_for_key(key: &str) -> Option<&'static Schema> {
    SCHEMAS.iter().copied().find(|schema| schema.keys.contains(&key))
}

/// Whether `key` identifies some kind.
pub fn is_identifying_key(key: &str) -> bool {
    schema_for_key(key).is_some()
}

/// Validates a single element of a collection, given the collection's declared type.
///
/// Only plain scalar elements are checked; intervals, prefixes and concatenations pass through.
pub fn check_element(collection_type: Option<&Value>, element: &Value) -> Result<(), BuildError> {
    match (collection_type.and_then(Value::as_str), element) {
        (Some("inet_service"), Value::Number(_)) => PORT.validate("elem", element),
        (Some("ipv4_addr"), Value::String(s)) => match s.parse::<IpAddr>() {
            Ok(IpAddr::V4(_)) => Ok(()),
            _ => Err(BuildError::invalid_field("elem", format!("{s:?} is not an IPv4 address"))),
        },
        (Some("ipv6_addr"), Value::String(s)) => match s.parse::<IpAddr>() {
            Ok(IpAddr::V6(_)) => Ok(()),
            _ => Err(BuildError::invalid_field("elem", format!("{s:?} is not an IPv6 address"))),
        },
        _ => Ok(()),
    }
}
