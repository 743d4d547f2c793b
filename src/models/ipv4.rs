//! IPv4 address and CIDR notation utilities.
//!
//! Provides [`Ipv4`] struct for representing IPv4 networks in CIDR notation,
//! along with the mask arithmetic used for containment tests.

use crate::error::{Error, Result};
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Maximum length for an IPv4 subnet mask (32 bits).
pub const MAX_LENGTH: u8 = 32;

/// Network mask for a prefix length, clamped to 32.
fn mask_bits(len: u8) -> u32 {
    let right_len = MAX_LENGTH - len.min(MAX_LENGTH);
    let all_bits = u32::MAX as u64;
    ((all_bits >> right_len) << right_len) as u32
}

/// IPv4 network in CIDR notation.
///
/// Ordering is by address, then prefix length, so a sorted list visits every
/// network before the more specific networks that share its start address.
#[derive(Eq, Ord, Debug, Copy, Clone, Hash)]
pub struct Ipv4 {
    /// The IPv4 address.
    pub addr: Ipv4Addr,
    /// The subnet mask length (0-32).
    pub mask: u8,
}

impl Serialize for Ipv4 {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Ipv4 {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Ipv4, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ipv4::new(&s).map_err(de::Error::custom)
    }
}

impl FromStr for Ipv4 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Ipv4> {
        Ipv4::new(s)
    }
}

impl Ipv4 {
    /// Create a new [`Ipv4`] from a CIDR string (e.g., "10.0.0.0/24").
    ///
    /// Host bits are kept as given; use [`Ipv4::network`] for the normalized form.
    pub fn new(addr_cidr: &str) -> Result<Ipv4> {
        let addr_cidr = addr_cidr.trim();
        let (addr, mask) = addr_cidr
            .split_once('/')
            .ok_or_else(|| Error::InvalidCidr(format!("invalid address/mask: {addr_cidr}")))?;
        let mask: u8 = mask
            .parse()
            .map_err(|_| Error::InvalidCidr(format!("invalid subnet mask: {addr_cidr}")))?;
        Ipv4::from_parts(addr, mask)
    }

    /// Build from a separate address string and prefix length.
    pub fn from_parts(addr: &str, mask: u8) -> Result<Ipv4> {
        let addr: Ipv4Addr = addr
            .trim()
            .parse()
            .map_err(|_| Error::InvalidCidr(format!("invalid address {addr}")))?;
        if mask > MAX_LENGTH {
            return Err(Error::InvalidCidr(format!("network length /{mask} is too long")));
        }
        Ok(Ipv4 { addr, mask })
    }

    /// The network this address belongs to, with host bits cleared.
    pub fn network(&self) -> Ipv4 {
        Ipv4 {
            addr: self.lo(),
            mask: self.mask,
        }
    }

    /// Get the highest (broadcast) address in the subnet.
    pub fn hi(&self) -> Ipv4Addr {
        let mask = mask_bits(self.mask);
        Ipv4Addr::from((u32::from(self.addr) & mask) | !mask)
    }

    /// Get the lowest (network) address in the subnet.
    pub fn lo(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.addr) & mask_bits(self.mask))
    }

    /// True if every address of `self` lies inside `other`.
    ///
    /// A network is a subnet of itself.
    pub fn subnet_of(&self, other: &Ipv4) -> bool {
        self.mask >= other.mask && other.lo() <= self.lo() && self.hi() <= other.hi()
    }
}

impl std::fmt::Display for Ipv4 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.addr, self.mask)
    }
}

impl PartialEq for Ipv4 {
    fn eq(&self, other: &Ipv4) -> bool {
        self.addr == other.addr && self.mask == other.mask
    }
}

impl PartialOrd for Ipv4 {
    fn partial_cmp(&self, other: &Ipv4) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_garbage() {
        assert!(Ipv4::new("10.0.0.0").is_err());
        assert!(Ipv4::new("10.0.0/8").is_err());
        assert!(Ipv4::new("10.0.0.0/33").is_err());
        assert!(Ipv4::new("fe80::/64").is_err());
        assert_eq!(Ipv4::new(" 10.0.0.0/8 ").unwrap().to_string(), "10.0.0.0/8");
    }

    #[test]
    fn test_network_clears_host_bits() {
        let ip = Ipv4::new("10.2.3.4/16").unwrap();
        assert_eq!(ip.network(), Ipv4::new("10.2.0.0/16").unwrap());
        assert_eq!(ip.hi(), Ipv4Addr::new(10, 2, 255, 255));
    }

    #[test]
    fn test_mask_edges() {
        let all = Ipv4::new("10.2.3.4/0").unwrap();
        assert_eq!(all.lo(), Ipv4Addr::new(0, 0, 0, 0));
        assert_eq!(all.hi(), Ipv4Addr::new(255, 255, 255, 255));
        let host = Ipv4::new("10.2.3.4/32").unwrap();
        assert_eq!(host.lo(), Ipv4Addr::new(10, 2, 3, 4));
        assert_eq!(host.hi(), Ipv4Addr::new(10, 2, 3, 4));
    }

    #[test]
    fn test_subnet_of() {
        let big = Ipv4::new("10.0.0.0/8").unwrap();
        let mid = Ipv4::new("10.1.0.0/16").unwrap();
        let small = Ipv4::new("10.1.2.0/24").unwrap();
        let other = Ipv4::new("192.168.0.0/24").unwrap();
        assert!(small.subnet_of(&mid));
        assert!(small.subnet_of(&big));
        assert!(mid.subnet_of(&big));
        assert!(big.subnet_of(&big));
        assert!(!big.subnet_of(&mid));
        assert!(!other.subnet_of(&big));
        assert!(small.subnet_of(&Ipv4::new("0.0.0.0/0").unwrap()));
    }

    #[test]
    fn test_ip4_cmp_overlap() {
        let ip1 = Ipv4::new("10.0.10.0/24").unwrap();
        let ip2 = Ipv4::new("10.0.0.0/8").unwrap();
        let ip3 = Ipv4::new("10.0.10.64/26").unwrap();

        assert!(ip1 > ip2);
        assert!(ip1 < ip3);
        assert!(ip2 < ip3);
        assert!(ip2.lo() < ip1.lo());
        assert!(ip2.hi() > ip3.hi());
        assert_eq!(ip2.hi(), Ipv4Addr::new(10, 255, 255, 255));
        // same start address: shorter prefix sorts first
        assert!(Ipv4::new("10.0.0.0/8").unwrap() < Ipv4::new("10.0.0.0/16").unwrap());
    }

    #[test]
    fn test_serde_cidr_string() {
        let ip: Ipv4 = serde_json::from_str("\"10.1.0.0/16\"").unwrap();
        assert_eq!(ip, Ipv4::new("10.1.0.0/16").unwrap());
        assert_eq!(serde_json::to_string(&ip).unwrap(), "\"10.1.0.0/16\"");
        assert!(serde_json::from_str::<Ipv4>("\"10.1.0.0\"").is_err());
    }
}
