//! Kernel parameters that decide what netfilter gets to see.
//!
//! A ruleset is only half of a firewall: forwarding must be enabled for `forward` chains to see
//! traffic, conntrack limits bound what `ct state` can track, and bridged traffic reaches the
//! `ip`/`ip6` families only with the bridge netfilter hooks on.
//!
//! ```no_run
//! use nftkit_submit::sysctl::{self, Conntrack, Ip, Protocol};
//!
//! sysctl::write(Ip::Forwarding, Protocol::V4, "1")?;
//! let max = sysctl::read(Conntrack::Max, Protocol::V4)?;
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! These parameters are per network namespace.

use std::io;

/// IP protocol version for sysctl paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Protocol {
    /// IPv4 (`/proc/sys/net/ipv4/...`)
    #[default]
    V4,
    /// IPv6 (`/proc/sys/net/ipv6/...`)
    V6,
}

/// A sysctl parameter that can be read and written.
pub trait SysctlParam {
    /// Returns the full path to the sysctl file for the given protocol.
    fn path(&self, protocol: Protocol) -> &'static str;
}

/// Reads a parameter, trimmed.
pub fn read<P: SysctlParam>(param: P, protocol: Protocol) -> io::Result<String> {
    let path = param.path(protocol);
    let value = std::fs::read_to_string(path).map(|s| s.trim().to_string())?;
    tracing::debug!(path, %value, "read sysctl");
    Ok(value)
}

pub fn write<P: SysctlParam>(param: P, protocol: Protocol, value: &str) -> io::Result<()> {
    let path = param.path(protocol);
    tracing::debug!(path, value, "writing sysctl");
    std::fs::write(path, value)
}

/// IP parameters relevant to filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Ip {
    /// Route packets between interfaces (0/1). Required for `forward` hooks to see traffic.
    ///
    /// - IPv4: `/proc/sys/net/ipv4/ip_forward`
    /// - IPv6: `/proc/sys/net/ipv6/conf/all/forwarding`
    Forwarding,

    /// Allow binding to non-local addresses (0/1), e.g. for transparent proxying with `tproxy`.
    NonlocalBind,

    /// Reverse path filtering (0/1/2). **IPv4 only**; IPv6 uses an `fib` rule instead.
    ///
    /// For IPv6, returns the IPv4 path.
    RpFilter,
}

impl SysctlParam for Ip {
    fn path(&self, protocol: Protocol) -> &'static str {
        match (self, protocol) {
            (Self::Forwarding, Protocol::V4) => "/proc/sys/net/ipv4/ip_forward",
            (Self::Forwarding, Protocol::V6) => "/proc/sys/net/ipv6/conf/all/forwarding",

            (Self::NonlocalBind, Protocol::V4) => "/proc/sys/net/ipv4/ip_nonlocal_bind",
            (Self::NonlocalBind, Protocol::V6) => "/proc/sys/net/ipv6/ip_nonlocal_bind",

            (Self::RpFilter, _) => "/proc/sys/net/ipv4/conf/all/rp_filter",
        }
    }
}

/// Connection tracking parameters, shared between IPv4 and IPv6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Conntrack {
    /// Maximum number of tracked connections. New connections are dropped beyond it.
    Max,
    /// Currently tracked connections. Read-only.
    Count,
    /// Size of the conntrack hash table.
    Buckets,
    /// Pick up TCP connections already established before tracking started (0/1).
    TcpLoose,
    /// Timeout of established TCP connections, in seconds.
    ///
    /// Default: 432000 (5 days)
    TcpTimeoutEstablished,
    /// Per-connection packet and byte accounting (0/1).
    Acct,
}

impl SysctlParam for Conntrack {
    fn path(&self, _protocol: Protocol) -> &'static str {
        match self {
            Self::Max => "/proc/sys/net/netfilter/nf_conntrack_max",
            Self::Count => "/proc/sys/net/netfilter/nf_conntrack_count",
            Self::Buckets => "/proc/sys/net/netfilter/nf_conntrack_buckets",
            Self::TcpLoose => "/proc/sys/net/netfilter/nf_conntrack_tcp_loose",
            Self::TcpTimeoutEstablished => {
                "/proc/sys/net/netfilter/nf_conntrack_tcp_timeout_established"
            }
            Self::Acct => "/proc/sys/net/netfilter/nf_conntrack_acct",
        }
    }
}

/// Whether bridged frames traverse the layer 3 hooks. Needs the `br_netfilter` module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum BridgeNf {
    /// Bridged frames traverse the `ip` hooks (IPv4) or the `ip6` hooks (IPv6).
    CallIptables,
    /// Bridged ARP traverses the `arp` hooks.
    CallArptables,
}

impl SysctlParam for BridgeNf {
    fn path(&self, protocol: Protocol) -> &'static str {
        match (self, protocol) {
            (Self::CallIptables, Protocol::V4) => "/proc/sys/net/bridge/bridge-nf-call-iptables",
            (Self::CallIptables, Protocol::V6) => "/proc/sys/net/bridge/bridge-nf-call-ip6tables",
            (Self::CallArptables, _) => "/proc/sys/net/bridge/bridge-nf-call-arptables",
        }
    }
}
