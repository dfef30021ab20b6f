//! Field bags: the unordered input of every builder call.

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::{expr::Expr, BuildError};

/// The expression list of a rule, either already in wire form or still held by an [`Expr`]
/// builder.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleExpr {
    /// An ordered list of tagged expression fragments.
    Raw(Vec<Value>),
    /// A builder handle, resolved to its fragments when the command is built.
    Builder(Expr),
}

impl RuleExpr {
    /// Resolves the handle to its ordered fragment list. Errors recorded while the [`Expr`] was
    /// being assembled surface here.
    pub fn resolve(self) -> Result<Vec<Value>, BuildError> {
        match self {
            Self::Raw(fragments) => Ok(fragments),
            Self::Builder(expr) => expr.build(),
        }
    }
}

impl From<Expr> for RuleExpr {
    fn from(expr: Expr) -> Self {
        Self::Builder(expr)
    }
}

impl From<Vec<Value>> for RuleExpr {
    fn from(fragments: Vec<Value>) -> Self {
        Self::Raw(fragments)
    }
}

/// A single value in a [`FieldBag`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Json(Value),
    Rule(RuleExpr),
    Rules(Vec<RuleExpr>),
}

impl FieldValue {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_json().and_then(Value::as_str)
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Json(Value::from(value))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Json(Value::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Json(Value::from(value))
    }
}

macro_rules! impl_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    Self::Json(Value::from(value))
                }
            }
        )*
    };
}

impl_from_number!(i32, i64, u16, u32, u64);

impl From<Vec<Value>> for FieldValue {
    fn from(values: Vec<Value>) -> Self {
        Self::Json(Value::Array(values))
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Json(Value::from(values))
    }
}

impl From<Expr> for FieldValue {
    fn from(expr: Expr) -> Self {
        Self::Rule(RuleExpr::Builder(expr))
    }
}

impl From<RuleExpr> for FieldValue {
    fn from(rule: RuleExpr) -> Self {
        Self::Rule(rule)
    }
}

impl From<Vec<Expr>> for FieldValue {
    fn from(exprs: Vec<Expr>) -> Self {
        Self::Rules(exprs.into_iter().map(RuleExpr::Builder).collect())
    }
}

impl From<Vec<RuleExpr>> for FieldValue {
    fn from(rules: Vec<RuleExpr>) -> Self {
        Self::Rules(rules)
    }
}

/// An unordered mapping from field name to value, supplied by one builder call.
///
/// Key order never matters for classification. Use [`fields!`](crate::fields) for literals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldBag {
    fields: FxHashMap<String, FieldValue>,
}

impl FieldBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Returns a field that must be plain JSON.
    pub(crate) fn json(&self, key: &str) -> Result<Option<&Value>, BuildError> {
        match self.fields.get(key) {
            None => Ok(None),
            Some(FieldValue::Json(value)) => Ok(Some(value)),
            Some(_) => Err(BuildError::invalid_field(key, "rule expressions are only valid for rules")),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FieldBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = Self::new();
        for (key, value) in iter {
            bag.insert(key, value);
        }
        bag
    }
}

/// Builds a [`FieldBag`] from `key => value` pairs.
///
/// ```
/// use nftkit_builder::fields;
///
/// let bag = fields! { "chain" => "input", "hook" => "input", "policy" => "drop" };
/// assert_eq!(bag.len(), 3);
/// ```
#[macro_export]
macro_rules! fields {
    () => { $crate::FieldBag::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut bag = $crate::FieldBag::new();
        $( bag.insert($key, $value); )+
        bag
    }};
}
