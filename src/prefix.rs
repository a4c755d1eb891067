//! The key walked by the tree, and the `Prefix` trait that turns address types into keys.

use std::fmt::{Debug, Display, Formatter};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

#[cfg(feature = "ipnet")]
use ipnet::{IpNet, Ipv4Net, Ipv6Net};
#[cfg(feature = "cidr")]
use cidr::{IpCidr, Ipv4Cidr, Ipv6Cidr};
#[cfg(feature = "ipnetwork")]
use ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
use num_traits::{PrimInt, Zero};

use crate::Error;

/// Address family of a key. Each family is stored below its own root, so a lookup never matches
/// a prefix of the other family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Family {
    /// 32-bit keys.
    V4,
    /// 128-bit keys.
    V6,
}

impl Family {
    /// Number of bits of an address of this family.
    pub const fn bits(self) -> u8 {
        match self {
            Family::V4 => 32,
            Family::V6 => 128,
        }
    }

    /// Index of the permanent root node of this family.
    #[inline(always)]
    pub(crate) const fn root(self) -> usize {
        match self {
            Family::V4 => 0,
            Family::V6 => 1,
        }
    }
}

/// A validated `(bits, prefix length, family)` triple.
///
/// The address is stored left-aligned in a `u128`, so bit 0 is always the most significant bit
/// of the address, regardless of the family. Host bits beyond the prefix length are cleared on
/// construction; two keys describing the same prefix are therefore equal.
///
/// Keys are ordered lexicographically: IPv4 before IPv6, then by address, then shorter prefixes
/// before longer ones. This is the order in which the tree yields its entries.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key {
    family: Family,
    addr: u128,
    len: u8,
}

impl Key {
    /// Create an IPv4 key. Fails with [`Error::BadAddress`] if `len` is larger than 32.
    ///
    /// ```
    /// # use cidr_radix::*;
    /// let key = Key::new_v4(0x01020304, 24).unwrap();
    /// assert_eq!(key.to_string(), "1.2.3.0/24");
    /// assert_eq!(Key::new_v4(0x01020304, 33), Err(Error::BadAddress));
    /// ```
    pub fn new_v4(addr: u32, len: u8) -> Result<Self, Error> {
        if len > Family::V4.bits() {
            return Err(Error::BadAddress);
        }
        Ok(Self::from_raw(Family::V4, (addr as u128) << 96, len))
    }

    /// Create an IPv6 key. Fails with [`Error::BadAddress`] if `len` is larger than 128.
    pub fn new_v6(addr: u128, len: u8) -> Result<Self, Error> {
        if len > Family::V6.bits() {
            return Err(Error::BadAddress);
        }
        Ok(Self::from_raw(Family::V6, addr, len))
    }

    /// Decode raw address bytes in network order: 4 bytes give an IPv4 host key (`/32`), 16 bytes
    /// an IPv6 host key (`/128`). Any other length fails with [`Error::BadAddress`].
    ///
    /// IPv4-mapped IPv6 addresses stay IPv6; use [`Ipv6Addr::to_ipv4_mapped`] first if they
    /// should be looked up in the IPv4 family.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if let Ok(octets) = <[u8; 4]>::try_from(bytes) {
            Ok(Ipv4Addr::from(octets).key())
        } else if let Ok(octets) = <[u8; 16]>::try_from(bytes) {
            Ok(Ipv6Addr::from(octets).key())
        } else {
            Err(Error::BadAddress)
        }
    }

    /// Build a key from a left-aligned address. `len` must not exceed the family's width.
    #[inline(always)]
    pub(crate) fn from_raw(family: Family, addr: u128, len: u8) -> Self {
        debug_assert!(len <= family.bits());
        Self {
            family,
            addr: addr & mask_from_prefix_len::<u128>(len),
            len,
        }
    }

    /// The zero-length key of a family, which matches every address of that family.
    pub(crate) fn root(family: Family) -> Self {
        Self {
            family,
            addr: 0,
            len: 0,
        }
    }

    /// Address family of the key.
    pub fn family(&self) -> Family {
        self.family
    }

    /// Prefix length.
    pub fn prefix_len(&self) -> u8 {
        self.len
    }

    /// Network address of the prefix (host bits cleared).
    pub fn network(&self) -> IpAddr {
        match self.family {
            Family::V4 => IpAddr::V4(Ipv4Addr::from((self.addr >> 96) as u32)),
            Family::V6 => IpAddr::V6(Ipv6Addr::from(self.addr)),
        }
    }

    /// Netmask of the prefix.
    pub fn netmask(&self) -> IpAddr {
        match self.family {
            Family::V4 => IpAddr::V4(Ipv4Addr::from(mask_from_prefix_len::<u32>(self.len))),
            Family::V6 => IpAddr::V6(Ipv6Addr::from(mask_from_prefix_len::<u128>(self.len))),
        }
    }

    /// Check if a specific bit is set (counted from the left, where 0 is the first bit of the
    /// address).
    #[inline(always)]
    pub fn is_bit_set(&self, bit: u8) -> bool {
        bit < 128 && (self.addr >> (127 - bit as u32)) & 1 == 1
    }

    /// Check if `self` contains `other`. This also returns `true` if both are equal, and always
    /// `false` if the families differ.
    pub fn contains(&self, other: &Key) -> bool {
        self.family == other.family
            && self.len <= other.len
            && other.addr & mask_from_prefix_len::<u128>(self.len) == self.addr
    }

    /// The key one bit longer than `self`, extended by a `1` bit if `right`, by a `0` bit
    /// otherwise.
    #[inline(always)]
    pub(crate) fn child(&self, right: bool) -> Self {
        debug_assert!(self.len < self.family.bits());
        let addr = if right {
            self.addr | (1u128 << (127 - self.len as u32))
        } else {
            self.addr
        };
        Self {
            family: self.family,
            addr,
            len: self.len + 1,
        }
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.network(), self.len)
    }
}

impl Debug for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl FromStr for Key {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parse::parse_cidr(s)
    }
}

pub(crate) fn mask_from_prefix_len<R>(len: u8) -> R
where
    R: PrimInt + Zero,
{
    if len as u32 == R::zero().count_zeros() {
        !R::zero()
    } else if len == 0 {
        R::zero()
    } else {
        !((!R::zero()) >> len as usize)
    }
}

/// Trait for types that describe a prefix (or a single address) the tree can store or look up.
pub trait Prefix {
    /// The key walked by the tree.
    fn key(&self) -> Key;
}

impl Prefix for Key {
    fn key(&self) -> Key {
        *self
    }
}

impl Prefix for Ipv4Addr {
    fn key(&self) -> Key {
        Key::from_raw(Family::V4, (u32::from(*self) as u128) << 96, 32)
    }
}

impl Prefix for Ipv6Addr {
    fn key(&self) -> Key {
        Key::from_raw(Family::V6, u128::from(*self), 128)
    }
}

impl Prefix for IpAddr {
    fn key(&self) -> Key {
        match self {
            IpAddr::V4(a) => a.key(),
            IpAddr::V6(a) => a.key(),
        }
    }
}

#[cfg(feature = "ipnet")]
impl Prefix for Ipv4Net {
    fn key(&self) -> Key {
        Key::from_raw(
            Family::V4,
            (u32::from(self.network()) as u128) << 96,
            self.prefix_len(),
        )
    }
}

#[cfg(feature = "ipnet")]
impl Prefix for Ipv6Net {
    fn key(&self) -> Key {
        Key::from_raw(Family::V6, u128::from(self.network()), self.prefix_len())
    }
}

#[cfg(feature = "ipnet")]
impl Prefix for IpNet {
    fn key(&self) -> Key {
        match self {
            IpNet::V4(p) => p.key(),
            IpNet::V6(p) => p.key(),
        }
    }
}

#[cfg(feature = "ipnetwork")]
impl Prefix for Ipv4Network {
    fn key(&self) -> Key {
        Key::from_raw(
            Family::V4,
            (u32::from(self.network()) as u128) << 96,
            self.prefix(),
        )
    }
}

#[cfg(feature = "ipnetwork")]
impl Prefix for Ipv6Network {
    fn key(&self) -> Key {
        Key::from_raw(Family::V6, u128::from(self.network()), self.prefix())
    }
}

#[cfg(feature = "ipnetwork")]
impl Prefix for IpNetwork {
    fn key(&self) -> Key {
        match self {
            IpNetwork::V4(p) => p.key(),
            IpNetwork::V6(p) => p.key(),
        }
    }
}

#[cfg(feature = "cidr")]
impl Prefix for Ipv4Cidr {
    fn key(&self) -> Key {
        Key::from_raw(
            Family::V4,
            (u32::from(self.first_address()) as u128) << 96,
            self.network_length(),
        )
    }
}

#[cfg(feature = "cidr")]
impl Prefix for Ipv6Cidr {
    fn key(&self) -> Key {
        Key::from_raw(
            Family::V6,
            u128::from(self.first_address()),
            self.network_length(),
        )
    }
}

#[cfg(feature = "cidr")]
impl Prefix for IpCidr {
    fn key(&self) -> Key {
        match self {
            IpCidr::V4(p) => p.key(),
            IpCidr::V6(p) => p.key(),
        }
    }
}
