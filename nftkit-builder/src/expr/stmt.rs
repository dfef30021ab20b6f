//! Non-terminal statements: counters, logging, references to named objects, NAT.

use serde_json::{json, Map, Value};

use super::{checked_int, Fragment};
use crate::{
    registry::{Check, PORT},
    BuildError,
};

const LOG_LEVELS: &[&str] =
    &["emerg", "alert", "crit", "err", "warn", "notice", "info", "debug", "audit"];

/// An anonymous counter, or a reference to a named one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter {
    name: Option<String>,
}

pub fn counter() -> Counter {
    Counter { name: None }
}

/// References a named counter object declared in the same table.
pub fn counter_ref(name: impl Into<String>) -> Counter {
    Counter { name: Some(name.into()) }
}

impl Fragment for Counter {
    fn append_to(self, fragments: &mut Vec<Value>) -> Result<(), BuildError> {
        let fragment = match self.name {
            None => json!({ "counter": null }),
            Some(name) => json!({ "counter": non_empty("counter", name)? }),
        };
        fragments.push(fragment);
        Ok(())
    }
}

/// References a named limit object.
pub fn limit_ref(name: impl Into<String>) -> impl Fragment {
    NamedRef { kind: "limit", name: name.into() }
}

/// References a named quota object.
pub fn quota_ref(name: impl Into<String>) -> impl Fragment {
    NamedRef { kind: "quota", name: name.into() }
}

struct NamedRef {
    kind: &'static str,
    name: String,
}

impl Fragment for NamedRef {
    fn append_to(self, fragments: &mut Vec<Value>) -> Result<(), BuildError> {
        let mut fragment = Map::with_capacity(1);
        fragment.insert(self.kind.to_string(), non_empty(self.kind, self.name)?);
        fragments.push(Value::Object(fragment));
        Ok(())
    }
}

fn non_empty(field: &str, name: String) -> Result<Value, BuildError> {
    if name.is_empty() {
        return Err(BuildError::invalid_field(field, "expected an object name"));
    }
    Ok(Value::from(name))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Log {
    prefix: Option<String>,
    level: Option<String>,
}

pub fn log() -> Log {
    Log::default()
}

impl Log {
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Syslog level, e.g. `warn`.
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }
}

impl Fragment for Log {
    fn append_to(self, fragments: &mut Vec<Value>) -> Result<(), BuildError> {
        if self.prefix.is_none() && self.level.is_none() {
            fragments.push(json!({ "log": null }));
            return Ok(());
        }

        let mut body = Map::new();
        if let Some(prefix) = self.prefix {
            body.insert("prefix".into(), Value::from(prefix));
        }
        if let Some(level) = self.level {
            let level = Value::from(level);
            Check::OneOf(LOG_LEVELS).validate("log.level", &level)?;
            body.insert("level".into(), level);
        }

        fragments.push(json!({ "log": body }));
        Ok(())
    }
}

/// Source or destination NAT, or masquerading.
#[derive(Debug, Clone, PartialEq)]
pub struct Nat {
    kind: &'static str,
    addr: Option<String>,
    port: Option<i64>,
}

pub fn snat(addr: impl Into<String>) -> Nat {
    Nat { kind: "snat", addr: Some(addr.into()), port: None }
}

pub fn dnat(addr: impl Into<String>) -> Nat {
    Nat { kind: "dnat", addr: Some(addr.into()), port: None }
}

pub fn masquerade() -> Nat {
    Nat { kind: "masquerade", addr: None, port: None }
}

impl Nat {
    pub fn port(mut self, port: impl Into<i64>) -> Self {
        self.port = Some(port.into());
        self
    }
}

impl Fragment for Nat {
    fn append_to(self, fragments: &mut Vec<Value>) -> Result<(), BuildError> {
        let mut body = Map::new();
        if let Some(addr) = self.addr {
            body.insert("addr".into(), non_empty("addr", addr)?);
        }
        if let Some(port) = self.port {
            body.insert("port".into(), checked_int(PORT, "port", port)?);
        }

        let body = if body.is_empty() { Value::Null } else { Value::Object(body) };
        let mut fragment = Map::with_capacity(1);
        fragment.insert(self.kind.to_string(), body);
        fragments.push(Value::Object(fragment));
        Ok(())
    }
}
