//! Match fragments, one module per field family.

use std::net::{Ipv4Addr, Ipv6Addr};

use serde_json::{json, Value};

use super::{checked_int, payload, Match};
use crate::{
    registry::{Check, CT_STATES, DSCP, MARK, PORT, VLAN_ID},
    BuildError,
};

/// Parses `addr` or `addr/len` into a match operand.
fn prefix<A: std::str::FromStr>(field: &str, input: &str, max_len: u8) -> Result<Value, BuildError> {
    let invalid = || BuildError::invalid_field(field, format!("{input:?} is not a valid address"));

    let Some((addr, len)) = input.split_once('/') else {
        input.parse::<A>().map_err(|_| invalid())?;
        return Ok(Value::from(input));
    };

    addr.parse::<A>().map_err(|_| invalid())?;
    let len = len
        .parse::<u8>()
        .ok()
        .filter(|len| *len <= max_len)
        .ok_or_else(|| BuildError::Range { field: field.to_string(), bound: format!("0..={max_len}") })?;

    Ok(json!({ "prefix": { "addr": addr, "len": len } }))
}

/// Port operands shared by tcp and udp.
fn port_match(protocol: &'static str, field: &'static str, port: i64) -> Match {
    let name = format!("{protocol}.{field}");
    Match::checked(payload(protocol, field), checked_int(PORT, &name, port))
}

fn port_range(protocol: &'static str, field: &'static str, lo: i64, hi: i64) -> Match {
    let name = format!("{protocol}.{field}");
    let right = checked_int(PORT, &name, lo).and_then(|lo| {
        let hi = checked_int(PORT, &name, hi)?;
        if lo.as_i64() > hi.as_i64() {
            return Err(BuildError::invalid_field(name.as_str(), "range start exceeds its end"));
        }
        Ok(json!({ "range": [lo, hi] }))
    });
    Match::checked(payload(protocol, field), right)
}

fn port_set(protocol: &'static str, field: &'static str, ports: &[i64]) -> Match {
    let name = format!("{protocol}.{field}");
    let right = if ports.is_empty() {
        Err(BuildError::invalid_field(name.as_str(), "expected at least one port"))
    } else {
        ports
            .iter()
            .map(|port| checked_int(PORT, &name, *port))
            .collect::<Result<Vec<_>, _>>()
            .map(|ports| json!({ "set": ports }))
    };
    Match::checked(payload(protocol, field), right)
}

pub mod ip {
    use super::*;

    pub fn saddr(addr: &str) -> Match {
        Match::checked(payload("ip", "saddr"), prefix::<Ipv4Addr>("ip.saddr", addr, 32))
    }

    pub fn daddr(addr: &str) -> Match {
        Match::checked(payload("ip", "daddr"), prefix::<Ipv4Addr>("ip.daddr", addr, 32))
    }

    /// Differentiated services code point, 0..=63.
    pub fn dscp(value: impl Into<i64>) -> Match {
        Match::checked(payload("ip", "dscp"), checked_int(DSCP, "ip.dscp", value.into()))
    }
}

pub mod ip6 {
    use super::*;

    pub fn saddr(addr: &str) -> Match {
        Match::checked(payload("ip6", "saddr"), prefix::<Ipv6Addr>("ip6.saddr", addr, 128))
    }

    pub fn daddr(addr: &str) -> Match {
        Match::checked(payload("ip6", "daddr"), prefix::<Ipv6Addr>("ip6.daddr", addr, 128))
    }

    pub fn dscp(value: impl Into<i64>) -> Match {
        Match::checked(payload("ip6", "dscp"), checked_int(DSCP, "ip6.dscp", value.into()))
    }
}

pub mod tcp {
    use super::*;

    pub fn sport(port: impl Into<i64>) -> Match {
        port_match("tcp", "sport", port.into())
    }

    pub fn dport(port: impl Into<i64>) -> Match {
        port_match("tcp", "dport", port.into())
    }

    pub fn dport_range(lo: impl Into<i64>, hi: impl Into<i64>) -> Match {
        port_range("tcp", "dport", lo.into(), hi.into())
    }

    pub fn dport_set(ports: &[i64]) -> Match {
        port_set("tcp", "dport", ports)
    }
}

pub mod udp {
    use super::*;

    pub fn sport(port: impl Into<i64>) -> Match {
        port_match("udp", "sport", port.into())
    }

    pub fn dport(port: impl Into<i64>) -> Match {
        port_match("udp", "dport", port.into())
    }

    pub fn dport_range(lo: impl Into<i64>, hi: impl Into<i64>) -> Match {
        port_range("udp", "dport", lo.into(), hi.into())
    }

    pub fn dport_set(ports: &[i64]) -> Match {
        port_set("udp", "dport", ports)
    }
}

pub mod meta {
    use super::*;

    fn key(key: &str) -> Value {
        json!({ "meta": { "key": key } })
    }

    pub fn iifname(name: &str) -> Match {
        Match::new(key("iifname"), Value::from(name))
    }

    pub fn oifname(name: &str) -> Match {
        Match::new(key("oifname"), Value::from(name))
    }

    /// Layer 4 protocol by name, e.g. `tcp` or `icmp`.
    pub fn l4proto(proto: &str) -> Match {
        Match::new(key("l4proto"), Value::from(proto))
    }

    pub fn mark(mark: impl Into<i64>) -> Match {
        Match::checked(key("mark"), checked_int(MARK, "meta.mark", mark.into()))
    }
}

pub mod ct {
    use super::*;

    /// Matches any of the given connection tracking states.
    pub fn state<'a>(states: impl IntoIterator<Item = &'a str>) -> Match {
        let states: Vec<&str> = states.into_iter().collect();
        let right = if states.is_empty() {
            Err(BuildError::invalid_field("ct.state", "expected at least one state"))
        } else {
            states
                .iter()
                .try_for_each(|s| Check::OneOf(CT_STATES).validate("ct.state", &Value::from(*s)))
                .map(|()| Value::from(states))
        };

        Match::checked(json!({ "ct": { "key": "state" } }), right).op("in")
    }
}

pub mod vlan {
    use super::*;

    /// 802.1Q VLAN id, 0..=4095.
    pub fn id(id: impl Into<i64>) -> Match {
        Match::checked(payload("vlan", "id"), checked_int(VLAN_ID, "vlan.id", id.into()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::expr::Expr;

    #[test]
    fn address_prefixes() {
        let fragments = Expr::new()
            .with(ip::saddr("10.0.0.0/8"))
            .with(ip::daddr("192.168.1.1"))
            .build()
            .unwrap();

        assert_eq!(fragments[0]["match"]["right"], json!({ "prefix": { "addr": "10.0.0.0", "len": 8 } }));
        assert_eq!(fragments[1]["match"]["right"], "192.168.1.1");

        assert!(matches!(
            Expr::new().with(ip::saddr("10.0.0.0/33")).build(),
            Err(BuildError::Range { .. })
        ));
        assert!(matches!(
            Expr::new().with(ip::saddr("fe80::1")).build(),
            Err(BuildError::InvalidField { .. })
        ));
        assert!(Expr::new().with(ip6::saddr("fe80::/10")).build().is_ok());
    }

    #[test]
    fn port_operands() {
        let fragments = Expr::new()
            .with(tcp::dport(0))
            .with(udp::dport(65535))
            .with(tcp::dport_range(1024, 2048))
            .with(udp::dport_set(&[53, 853]))
            .build()
            .unwrap();

        assert_eq!(fragments[0]["match"]["left"], json!({ "payload": { "protocol": "tcp", "field": "dport" } }));
        assert_eq!(fragments[2]["match"]["right"], json!({ "range": [1024, 2048] }));
        assert_eq!(fragments[3]["match"]["right"], json!({ "set": [53, 853] }));

        for bad in [-1, 65536] {
            assert_eq!(
                Expr::new().with(udp::sport(bad)).build().unwrap_err(),
                BuildError::Range { field: "udp.sport".into(), bound: "0..=65535".into() }
            );
        }

        assert!(Expr::new().with(tcp::dport_range(90, 80)).build().is_err());
    }

    #[test]
    fn conntrack_states() {
        let fragments = Expr::new().with(ct::state(["established", "related"])).build().unwrap();
        assert_eq!(fragments[0]["match"]["op"], "in");
        assert_eq!(fragments[0]["match"]["right"], json!(["established", "related"]));

        assert!(matches!(
            Expr::new().with(ct::state(["half-open"])).build(),
            Err(BuildError::InvalidEnum { .. })
        ));
    }

    #[test]
    fn bounded_header_fields() {
        assert!(Expr::new().with(vlan::id(4095)).with(ip::dscp(63)).build().is_ok());
        assert!(Expr::new().with(ip::dscp(64)).build().is_err());
        assert!(Expr::new().with(meta::mark(-1)).build().is_err());
    }
}
