//! IP block list middleware.
//! Rejects clients by literal address, CIDR subnet or address range.

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::observability::metrics;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockEntryError {
    #[error("invalid CIDR")]
    InvalidCidr,
    #[error("invalid IP range")]
    InvalidRange,
    #[error("IP range mixes IPv4 and IPv6")]
    MixedRange,
    #[error("invalid IP address")]
    InvalidAddress,
}

/// An address block described by network bits and a mask.
///
/// The mask need not be contiguous: subnets synthesized from ranges may
/// carry holes, and membership is still `ip & mask == network & mask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subnet {
    network: u128,
    mask: u128,
    is_ipv6: bool,
}

impl Subnet {
    /// Parse `addr/prefix`.
    pub fn from_cidr(cidr: &str) -> Result<Self, BlockEntryError> {
        let (addr, prefix) = cidr.split_once('/').ok_or(BlockEntryError::InvalidCidr)?;
        let addr: IpAddr = addr.trim().parse().map_err(|_| BlockEntryError::InvalidCidr)?;
        let prefix: u32 = prefix.trim().parse().map_err(|_| BlockEntryError::InvalidCidr)?;

        match addr {
            IpAddr::V4(v4) if prefix <= 32 => {
                let mask = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);
                Ok(Self {
                    network: u128::from(u32::from(v4) & mask),
                    mask: u128::from(mask),
                    is_ipv6: false,
                })
            }
            IpAddr::V6(v6) if prefix <= 128 => {
                let mask = u128::MAX.checked_shl(128 - prefix).unwrap_or(0);
                Ok(Self {
                    network: u128::from(v6) & mask,
                    mask,
                    is_ipv6: true,
                })
            }
            _ => Err(BlockEntryError::InvalidCidr),
        }
    }

    /// Approximate the range `start..=end` with a single subnet.
    ///
    /// Each mask byte is `255 - (start_byte XOR end_byte)`. This is exact for
    /// ranges aligned to a power-of-two boundary; any other range yields a
    /// subnet that covers more than requested.
    pub fn from_range(start: IpAddr, end: IpAddr) -> Result<Self, BlockEntryError> {
        match (start, end) {
            (IpAddr::V4(start), IpAddr::V4(end)) => {
                let (start, end) = (u32::from(start), u32::from(end));
                Ok(Self {
                    network: u128::from(start),
                    mask: u128::from(!(start ^ end)),
                    is_ipv6: false,
                })
            }
            (IpAddr::V6(start), IpAddr::V6(end)) => {
                let (start, end) = (u128::from(start), u128::from(end));
                Ok(Self {
                    network: start,
                    mask: !(start ^ end),
                    is_ipv6: true,
                })
            }
            _ => Err(BlockEntryError::MixedRange),
        }
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        let (bits, is_ipv6) = match canonical(ip) {
            IpAddr::V4(v4) => (u128::from(u32::from(v4)), false),
            IpAddr::V6(v6) => (u128::from(v6), true),
        };

        is_ipv6 == self.is_ipv6 && bits & self.mask == self.network & self.mask
    }
}

/// A single parsed block list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockEntry {
    Address(IpAddr),
    Subnet(Subnet),
}

impl BlockEntry {
    /// Parse a literal address, `addr/prefix` or `start-end`.
    pub fn parse(entry: &str) -> Result<Self, BlockEntryError> {
        let entry = entry.trim();

        if entry.contains('/') {
            return Subnet::from_cidr(entry).map(BlockEntry::Subnet);
        }

        if entry.contains('-') {
            let parts: Vec<&str> = entry.split('-').collect();
            let [start, end] = parts.as_slice() else {
                return Err(BlockEntryError::InvalidRange);
            };
            let start: IpAddr = start.trim().parse().map_err(|_| BlockEntryError::InvalidRange)?;
            let end: IpAddr = end.trim().parse().map_err(|_| BlockEntryError::InvalidRange)?;
            return Subnet::from_range(start, end).map(BlockEntry::Subnet);
        }

        entry
            .parse::<IpAddr>()
            .map(|ip| BlockEntry::Address(canonical(ip)))
            .map_err(|_| BlockEntryError::InvalidAddress)
    }
}

/// Denylist of client addresses, checked before anything else.
#[derive(Debug, Default)]
pub struct IpBlockFilter {
    addresses: HashSet<IpAddr>,
    subnets: Vec<Subnet>,
}

impl IpBlockFilter {
    /// Build the filter, skipping (and logging) entries that do not parse.
    pub fn from_entries<S: AsRef<str>>(entries: &[S]) -> Self {
        let mut filter = Self::default();

        for entry in entries {
            let entry = entry.as_ref();
            match BlockEntry::parse(entry) {
                Ok(BlockEntry::Address(ip)) => {
                    filter.addresses.insert(ip);
                }
                Ok(BlockEntry::Subnet(subnet)) => filter.subnets.push(subnet),
                Err(e) => {
                    tracing::warn!(entry = %entry, error = %e, "Skipping malformed block list entry");
                }
            }
        }

        filter
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty() && self.subnets.is_empty()
    }

    pub fn is_blocked(&self, ip: IpAddr) -> bool {
        let ip = canonical(ip);
        self.addresses.contains(&ip) || self.subnets.iter().any(|subnet| subnet.contains(ip))
    }
}

/// IPv4-mapped IPv6 addresses compare as their IPv4 form.
fn canonical(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6
            .to_ipv4_mapped()
            .map(IpAddr::V4)
            .unwrap_or(IpAddr::V6(v6)),
        v4 => v4,
    }
}

pub async fn ip_block_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(filter): State<Arc<IpBlockFilter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if filter.is_blocked(addr.ip()) {
        tracing::info!(client = %addr.ip(), "Blocked IP");
        metrics::record_blocked();
        return (StatusCode::FORBIDDEN, "Forbidden").into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_aligned_range_is_exact() {
        let filter = IpBlockFilter::from_entries(&["10.0.0.0-10.0.0.3"]);

        for last in 0..=3 {
            assert!(filter.is_blocked(ip(&format!("10.0.0.{}", last))));
        }
        assert!(!filter.is_blocked(ip("10.0.0.4")));
        assert!(!filter.is_blocked(ip("9.255.255.255")));
    }

    #[test]
    fn test_aligned_range_equals_cidr() {
        let from_range = Subnet::from_range(ip("10.0.0.0"), ip("10.0.0.3")).unwrap();
        let from_cidr = Subnet::from_cidr("10.0.0.0/30").unwrap();
        assert_eq!(from_range, from_cidr);
    }

    #[test]
    fn test_misaligned_range_over_covers() {
        // .1-.2 differs in the two low bits, so the whole /30 is covered.
        let filter = IpBlockFilter::from_entries(&["10.0.0.1-10.0.0.2"]);
        assert!(filter.is_blocked(ip("10.0.0.0")));
        assert!(filter.is_blocked(ip("10.0.0.3")));
        assert!(!filter.is_blocked(ip("10.0.0.4")));
    }

    #[test]
    fn test_cidr_and_literal_entries() {
        let filter = IpBlockFilter::from_entries(&["192.168.0.0/16", "203.0.113.9", "2001:db8::/32"]);

        assert!(filter.is_blocked(ip("192.168.44.1")));
        assert!(!filter.is_blocked(ip("192.169.0.1")));
        assert!(filter.is_blocked(ip("203.0.113.9")));
        assert!(!filter.is_blocked(ip("203.0.113.10")));
        assert!(filter.is_blocked(ip("2001:db8::1")));
        assert!(!filter.is_blocked(ip("2001:db9::1")));
    }

    #[test]
    fn test_mapped_ipv4_clients_match_ipv4_entries() {
        let filter = IpBlockFilter::from_entries(&["10.1.2.3", "172.16.0.0/12"]);
        assert!(filter.is_blocked(ip("::ffff:10.1.2.3")));
        assert!(filter.is_blocked(ip("::ffff:172.20.1.1")));
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let filter = IpBlockFilter::from_entries(&[
            "not-an-ip",
            "10.0.0.0/40",
            "10.0.0.1-10.0.0.2-10.0.0.3",
            "10.0.0.1-::1",
            "garbage",
            "127.0.0.1",
        ]);

        assert!(filter.is_blocked(ip("127.0.0.1")));
        assert!(!filter.is_blocked(ip("10.0.0.1")));
    }

    #[test]
    fn test_entry_errors() {
        assert_eq!(BlockEntry::parse("1.2.3.4/33"), Err(BlockEntryError::InvalidCidr));
        assert_eq!(BlockEntry::parse("a-b"), Err(BlockEntryError::InvalidRange));
        assert_eq!(
            BlockEntry::parse("10.0.0.1-::2"),
            Err(BlockEntryError::MixedRange)
        );
        assert_eq!(BlockEntry::parse("host"), Err(BlockEntryError::InvalidAddress));
        assert!(matches!(BlockEntry::parse("0.0.0.0/0"), Ok(BlockEntry::Subnet(_))));
    }

    #[test]
    fn test_empty_filter_blocks_nothing() {
        let filter = IpBlockFilter::from_entries::<&str>(&[]);
        assert!(filter.is_empty());
        assert!(!filter.is_blocked(ip("127.0.0.1")));
    }
}
