use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::WireError;

/// Address family of an nftables table.
///
/// Every object lives inside a table, and a table is identified by `(family, name)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// IPv4 only. This is what `nft` assumes when no family is given.
    #[default]
    Ip,
    /// IPv6 only.
    Ip6,
    /// IPv4 and IPv6.
    Inet,
    Arp,
    Bridge,
    /// Ingress/egress hooks bound to a single device.
    Netdev,
}

impl Family {
    pub const ALL: [Self; 6] =
        [Self::Ip, Self::Ip6, Self::Inet, Self::Arp, Self::Bridge, Self::Netdev];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ip => "ip",
            Self::Ip6 => "ip6",
            Self::Inet => "inet",
            Self::Arp => "arp",
            Self::Bridge => "bridge",
            Self::Netdev => "netdev",
        }
    }

    /// The names accepted by [`FromStr`], in declaration order.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(Self::as_str).collect()
    }
}

impl FromStr for Family {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| WireError::UnknownFamily(s.to_string()))
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The category of object a command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Table,
    Chain,
    Rule,
    Set,
    Map,
    Element,
    Flowtable,
    Counter,
    Quota,
    Limit,
    /// The whole ruleset. Never inferred from a field bag, only used to flush everything.
    Ruleset,
}

impl Kind {
    /// All kinds that can be targeted through a field bag.
    pub const OBJECTS: [Self; 10] = [
        Self::Table,
        Self::Chain,
        Self::Rule,
        Self::Set,
        Self::Map,
        Self::Element,
        Self::Flowtable,
        Self::Counter,
        Self::Quota,
        Self::Limit,
    ];

    /// The key used for this kind in the nftables JSON schema.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Chain => "chain",
            Self::Rule => "rule",
            Self::Set => "set",
            Self::Map => "map",
            Self::Element => "element",
            Self::Flowtable => "flowtable",
            Self::Counter => "counter",
            Self::Quota => "quota",
            Self::Limit => "limit",
            Self::Ruleset => "ruleset",
        }
    }
}

impl FromStr for Kind {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::OBJECTS
            .into_iter()
            .chain(std::iter::once(Self::Ruleset))
            .find(|k| k.as_str() == s)
            .ok_or_else(|| WireError::UnknownKind(s.to_string()))
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mutating batch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Delete,
    Flush,
    Insert,
    Replace,
    Rename,
}

impl Operation {
    pub const ALL: [Self; 6] =
        [Self::Add, Self::Delete, Self::Flush, Self::Insert, Self::Replace, Self::Rename];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Delete => "delete",
            Self::Flush => "flush",
            Self::Insert => "insert",
            Self::Replace => "replace",
            Self::Rename => "rename",
        }
    }
}

impl FromStr for Operation {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| WireError::UnknownOperation(s.to_string()))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
