//! CIDR arithmetic for carving a parent network into per-zone subnet blocks

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CidrError {
    #[error("Invalid CIDR '{0}': expected a.b.c.d/prefix")]
    Malformed(String),

    #[error("Prefix length /{0} cannot be subdivided: must be /24 or shorter")]
    PrefixTooLong(u8),
}

/// Parsed IPv4 network: base address (host order) and prefix length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Network {
    base: u32,
    prefix: u8,
}

impl Network {
    fn span(&self) -> u64 {
        1u64 << (32 - self.prefix)
    }

    fn end(&self) -> u64 {
        u64::from(self.base) + self.span()
    }
}

fn parse(cidr: &str) -> Result<Network, CidrError> {
    let malformed = || CidrError::Malformed(cidr.to_string());

    let (addr, prefix) = cidr.split_once('/').ok_or_else(malformed)?;
    let prefix: u8 = prefix.parse().map_err(|_| malformed())?;
    if prefix > 32 {
        return Err(malformed());
    }

    let mut base: u32 = 0;
    let mut octets = 0;
    for part in addr.split('.') {
        let octet: u8 = part.parse().map_err(|_| malformed())?;
        base = (base << 8) | u32::from(octet);
        octets += 1;
    }
    if octets != 4 {
        return Err(malformed());
    }

    // Mask the base down to the prefix so "10.0.3.0/16" means 10.0.0.0/16
    let mask = if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - prefix)
    };

    Ok(Network {
        base: base & mask,
        prefix,
    })
}

fn format_cidr(base: u32, prefix: u8) -> String {
    format!(
        "{}.{}.{}.{}/{}",
        base >> 24,
        (base >> 16) & 0xff,
        (base >> 8) & 0xff,
        base & 0xff,
        prefix
    )
}

/// Number of extra prefix bits needed to distinguish `count` subnets
fn bits_for(count: usize) -> u8 {
    if count <= 1 {
        0
    } else {
        (usize::BITS - (count - 1).leading_zeros()) as u8
    }
}

/// Slice a parent network into up to `count` equal, non-overlapping subnets.
///
/// Each subnet's prefix is the parent's prefix plus `ceil(log2(count))`, and
/// base addresses step by `256/count` in the third octet, the layout a /16
/// parent divides into. Fewer than `count` blocks are returned when the
/// parent's remaining address space cannot hold the full set.
pub fn subnet_cidrs(parent: &str, count: usize) -> Result<Vec<String>, CidrError> {
    let network = parse(parent)?;
    if network.prefix > 24 {
        return Err(CidrError::PrefixTooLong(network.prefix));
    }
    if count == 0 {
        return Ok(Vec::new());
    }

    // Third-octet stepping caps the usable subnet count at 256
    let count = count.min(256);
    let new_prefix = network.prefix + bits_for(count);
    let span = 1u64 << (32 - new_prefix);

    // The third-octet step for a /16 parent, widened when a subnet's span
    // exceeds it so blocks never overlap for shorter parent prefixes.
    let stride = u64::from((256 / count as u32) << 8).max(span);

    let mut subnets = Vec::with_capacity(count);
    for i in 0..count as u64 {
        let base = u64::from(network.base) + i * stride;
        if base + span > network.end() {
            break;
        }
        subnets.push(format_cidr(base as u32, new_prefix));
    }

    Ok(subnets)
}
