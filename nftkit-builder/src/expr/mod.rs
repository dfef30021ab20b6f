//! A small DSL for rule expressions.
//!
//! An [`Expr`] is an ordered list of JSON fragments, assembled by chaining [`Expr::with`] and
//! the verdict helpers. Every field family (ip, tcp, meta, ct, ...) hands out values that
//! implement [`Fragment`]:
//!
//! ```
//! use nftkit_builder::expr::{ct, tcp, Expr};
//!
//! let expr = Expr::new()
//!     .with(ct::state(["established", "related"]))
//!     .accept();
//! let ssh = Expr::new().with(tcp::dport(22)).counter().accept();
//!
//! assert_eq!(expr.fragments().len(), 2);
//! assert_eq!(ssh.build().unwrap().len(), 3);
//! ```
//!
//! Range-checked inputs (ports, VLAN ids, DSCP, marks) never fail on the spot. The first
//! violation is kept inside the `Expr` and reported when the rule is built, so chains stay
//! readable.

mod matches;
mod stmt;

use serde_json::{json, Value};

use crate::{registry::Check, BuildError};

pub use matches::{ct, ip, ip6, meta, tcp, udp, vlan};
pub use stmt::{counter, counter_ref, dnat, limit_ref, log, masquerade, quota_ref, snat, Counter, Log, Nat};

/// Anything that can append itself to a rule expression.
pub trait Fragment {
    /// Appends zero or more fragments, or fails without touching `fragments`.
    fn append_to(self, fragments: &mut Vec<Value>) -> Result<(), BuildError>;
}

impl Fragment for Value {
    fn append_to(self, fragments: &mut Vec<Value>) -> Result<(), BuildError> {
        fragments.push(self);
        Ok(())
    }
}

/// An ordered rule expression under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expr {
    fragments: Vec<Value>,
    /// The first error recorded while chaining. Once set, later fragments are ignored.
    error: Option<BuildError>,
}

impl Expr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, fragment: impl Fragment) -> Self {
        if self.error.is_none() {
            // Stage into a scratch buffer so a failing fragment leaves no partial output.
            let mut staged = Vec::new();
            match fragment.append_to(&mut staged) {
                Ok(()) => self.fragments.extend(staged),
                Err(e) => self.error = Some(e),
            }
        }
        self
    }

    /// Appends an already tagged fragment as is.
    pub fn raw(self, fragment: Value) -> Self {
        self.with(fragment)
    }

    /// Appends an anonymous counter.
    pub fn counter(self) -> Self {
        self.with(stmt::counter())
    }

    pub fn accept(self) -> Self {
        self.with(Verdict::Accept)
    }

    pub fn drop(self) -> Self {
        self.with(Verdict::Drop)
    }

    pub fn reject(self) -> Self {
        self.with(Verdict::Reject)
    }

    pub fn jump(self, chain: impl Into<String>) -> Self {
        self.with(Verdict::Jump(chain.into()))
    }

    pub fn goto(self, chain: impl Into<String>) -> Self {
        self.with(Verdict::Goto(chain.into()))
    }

    pub fn ret(self) -> Self {
        self.with(Verdict::Return)
    }

    /// The fragments appended so far.
    pub fn fragments(&self) -> &[Value] {
        &self.fragments
    }

    /// Returns the finished fragment list, or the first error recorded while chaining.
    pub fn build(self) -> Result<Vec<Value>, BuildError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.fragments),
        }
    }
}

/// A terminal statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Drop,
    Reject,
    Jump(String),
    Goto(String),
    Return,
}

impl Fragment for Verdict {
    fn append_to(self, fragments: &mut Vec<Value>) -> Result<(), BuildError> {
        let fragment = match self {
            Self::Accept => json!({ "accept": null }),
            Self::Drop => json!({ "drop": null }),
            Self::Reject => json!({ "reject": null }),
            Self::Return => json!({ "return": null }),
            Self::Jump(target) | Self::Goto(target) if target.is_empty() => {
                return Err(BuildError::invalid_field("target", "expected a chain name"))
            }
            Self::Jump(target) => json!({ "jump": { "target": target } }),
            Self::Goto(target) => json!({ "goto": { "target": target } }),
        };
        fragments.push(fragment);
        Ok(())
    }
}

/// A comparison between a packet field and a constant.
///
/// ```text
/// {"match": {"op": "==", "left": {"payload": {"protocol": "tcp", "field": "dport"}}, "right": 22}}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    op: &'static str,
    left: Value,
    /// A right-hand side that failed validation is reported when appended.
    right: Result<Value, BuildError>,
}

impl Match {
    pub fn new(left: Value, right: Value) -> Self {
        Self { op: "==", left, right: Ok(right) }
    }

    pub(crate) fn checked(left: Value, right: Result<Value, BuildError>) -> Self {
        Self { op: "==", left, right }
    }

    /// Sets the comparison operator, e.g. `in`, `<` or `>=`.
    pub fn op(mut self, op: &'static str) -> Self {
        self.op = op;
        self
    }

    /// Inverts an equality or membership test.
    pub fn negate(mut self) -> Self {
        self.op = match self.op {
            "==" | "in" => "!=",
            "!=" => "==",
            other => other,
        };
        self
    }
}

impl Fragment for Match {
    fn append_to(self, fragments: &mut Vec<Value>) -> Result<(), BuildError> {
        let right = self.right?;
        fragments.push(json!({ "match": { "op": self.op, "left": self.left, "right": right } }));
        Ok(())
    }
}

pub(crate) fn payload(protocol: &str, field: &str) -> Value {
    json!({ "payload": { "protocol": protocol, "field": field } })
}

/// Validates an integer input, naming it `field` in the error.
pub(crate) fn checked_int(check: Check, field: &str, value: i64) -> Result<Value, BuildError> {
    let value = Value::from(value);
    check.validate(field, &value)?;
    Ok(value)
}
