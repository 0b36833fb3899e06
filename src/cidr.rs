//! IPv4 CIDR parsing and membership matching.
//!
//! Everything here works on dotted-quad strings and 32-bit big-endian
//! address values. No DNS resolution, no IPv6.

use thiserror::Error;

/// Errors produced by address/network validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CidrError {
    #[error("invalid IPv4 address: {0}")]
    InvalidAddress(String),

    #[error("invalid CIDR network: {0}")]
    InvalidNetwork(String),
}

/// Parse a dotted-quad IPv4 address into a big-endian u32.
///
/// Octets must be plain decimal digits in 0..=255; anything else
/// (signs, empty parts, out-of-range values) is a format error.
pub fn parse_address(s: &str) -> Result<u32, CidrError> {
    let mut octets = [0u8; 4];
    let mut parts = s.split('.');

    for slot in &mut octets {
        let part = parts
            .next()
            .ok_or_else(|| CidrError::InvalidAddress(s.to_string()))?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CidrError::InvalidAddress(s.to_string()));
        }
        *slot = part
            .parse()
            .map_err(|_| CidrError::InvalidAddress(s.to_string()))?;
    }

    if parts.next().is_some() {
        return Err(CidrError::InvalidAddress(s.to_string()));
    }

    Ok(u32::from_be_bytes(octets))
}

/// Parse a CIDR network string (`A.B.C.D/N`) into its base address and
/// prefix length.
pub fn parse_network(s: &str) -> Result<(u32, u8), CidrError> {
    let (addr_part, prefix_part) = s
        .split_once('/')
        .ok_or_else(|| CidrError::InvalidNetwork(s.to_string()))?;

    let base =
        parse_address(addr_part).map_err(|_| CidrError::InvalidNetwork(s.to_string()))?;

    if prefix_part.is_empty()
        || prefix_part.len() > 2
        || !prefix_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(CidrError::InvalidNetwork(s.to_string()));
    }
    let prefix: u8 = prefix_part
        .parse()
        .map_err(|_| CidrError::InvalidNetwork(s.to_string()))?;
    if prefix > 32 {
        return Err(CidrError::InvalidNetwork(s.to_string()));
    }

    Ok((base, prefix))
}

/// Check whether `address` falls inside the CIDR block `network`.
///
/// Both the address and the network's base are packed big-endian, masked
/// to the top `N` bits, and compared for equality.
pub fn matches(address: &str, network: &str) -> Result<bool, CidrError> {
    let (base, prefix) = parse_network(network)?;
    let addr = parse_address(address)?;

    let mask = prefix_mask(prefix);
    Ok((addr & mask) == (base & mask))
}

/// Top-N-bits mask for a prefix length in 0..=32.
///
/// Prefix 0 is special-cased: shifting a u32 by 32 is not defined, and the
/// all-zero mask matches the whole address space.
fn prefix_mask(prefix: u8) -> u32 {
    if prefix == 0 { 0 } else { !0u32 << (32 - prefix) }
}
