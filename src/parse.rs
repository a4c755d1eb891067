//! Scanner for CIDR text.
//!
//! Accepted forms are dotted-decimal IPv4 `A.B.C.D` and colon-hex IPv6, each with an optional
//! `/n` suffix. Without a suffix, the key covers the full address width.

use std::net::Ipv6Addr;

use crate::{Error, Key};

/// Parse CIDR text into a key. Host bits beyond the prefix length are ignored.
pub(crate) fn parse_cidr(s: &str) -> Result<Key, Error> {
    let (addr, len) = match s.find('/') {
        Some(pos) => (&s[..pos], Some(parse_len(&s[pos + 1..])?)),
        None => (s, None),
    };
    if addr.contains(':') {
        let addr: Ipv6Addr = addr.parse().map_err(|_| Error::BadAddress)?;
        Key::new_v6(u128::from(addr), len.unwrap_or(128))
    } else {
        Key::new_v4(parse_v4(addr)?, len.unwrap_or(32))
    }
}

/// Decimal prefix length. The range is checked by the key constructors.
fn parse_len(s: &str) -> Result<u8, Error> {
    if s.is_empty() {
        return Err(Error::BadAddress);
    }
    s.bytes().try_fold(0u8, |len, b| {
        if !b.is_ascii_digit() {
            return Err(Error::BadAddress);
        }
        len.checked_mul(10)
            .and_then(|len| len.checked_add(b - b'0'))
            .ok_or(Error::BadAddress)
    })
}

/// Exactly four non-empty decimal octets, each at most 255.
fn parse_v4(s: &str) -> Result<u32, Error> {
    let mut ip: u32 = 0;
    let mut octet: u32 = 0;
    let mut digits = 0;
    let mut dots = 0;
    for b in s.bytes() {
        match b {
            b'.' => {
                if digits == 0 || dots == 3 {
                    return Err(Error::BadAddress);
                }
                ip = (ip << 8) | octet;
                octet = 0;
                digits = 0;
                dots += 1;
            }
            b'0'..=b'9' => {
                octet = octet * 10 + (b - b'0') as u32;
                digits += 1;
                if octet > 255 {
                    return Err(Error::BadAddress);
                }
            }
            _ => return Err(Error::BadAddress),
        }
    }
    if dots != 3 || digits == 0 {
        return Err(Error::BadAddress);
    }
    Ok((ip << 8) | octet)
}
