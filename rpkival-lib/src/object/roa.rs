//! Route origin authorizations (RFC 9582).

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use serde::Serialize;
use x509_parser::der_parser::asn1_rs::Tag;

use super::der::{self, DerReader};
use super::ext::{self, AFI_IPV4, AFI_IPV6};
use super::signed::{self, Signed};
use crate::oid;
use crate::resources::{addr_from_bits, prefix_len, Range};
use crate::RpkiError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoaPrefix {
    pub addr: IpAddr,
    pub len: u8,
    pub max_len: u8,
}

impl RoaPrefix {
    pub fn v4_range(&self) -> Option<Range<u32>> {
        match self.addr {
            IpAddr::V4(a) => {
                let min = u32::from(a);
                let max = min | u32::MAX.checked_shr(u32::from(self.len)).unwrap_or(0);
                Some(Range { min, max })
            }
            IpAddr::V6(_) => None,
        }
    }

    pub fn v6_range(&self) -> Option<Range<u128>> {
        match self.addr {
            IpAddr::V6(a) => {
                let min = u128::from(a);
                let max = min | u128::MAX.checked_shr(u32::from(self.len)).unwrap_or(0);
                Some(Range { min, max })
            }
            IpAddr::V4(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Roa {
    #[serde(flatten)]
    pub signed: Signed,
    pub asid: u32,
    pub prefixes: Vec<RoaPrefix>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub talid: Option<usize>,
    /// Prefixes are covered by the EE certificate's resources.
    pub valid: bool,
}

impl Roa {
    pub fn from_der(der: &[u8]) -> Result<Roa, RpkiError> {
        let (signed, content) = signed::unwrap(der, oid::CT_ROUTE_ORIGIN_AUTHZ)?;
        Self::from_content(signed, &content)
    }

    pub(crate) fn from_content(signed: Signed, content: &[u8]) -> Result<Roa, RpkiError> {
        let body = der::parse_one(content, Tag::Sequence, "RouteOriginAttestation")?;
        let mut rd = DerReader::new(body.data);
        if let Some(v) = rd.optional_context(0)? {
            let version = der::uint(&der::parse_one_any(v.data)?, "ROA version")?;
            if version != 0 {
                return Err(RpkiError::ParseError(format!(
                    "RFC 9582 section 4.1: unexpected version {}",
                    version
                )));
            }
        }
        let asid = ext::asn(&rd.next()?)?;
        let blocks = rd.expect(Tag::Sequence, "ipAddrBlocks")?;
        rd.finish("RouteOriginAttestation")?;

        let mut prefixes = Vec::new();
        let mut families = DerReader::new(blocks.data);
        let mut seen = Vec::new();
        while !families.is_empty() {
            let fam = families.expect(Tag::Sequence, "ROAIPAddressFamily")?;
            let mut f = DerReader::new(fam.data);
            let afi = ext::afi(&f.next()?)?;
            if afi != AFI_IPV4 && afi != AFI_IPV6 {
                return Err(RpkiError::ParseError(format!("RFC 9582: unknown AFI {}", afi)));
            }
            if seen.contains(&afi) {
                return Err(RpkiError::ParseError("RFC 9582: duplicate address family".into()));
            }
            seen.push(afi);
            let addrs = f.expect(Tag::Sequence, "addresses")?;
            f.finish("ROAIPAddressFamily")?;

            let mut ar = DerReader::new(addrs.data);
            while !ar.is_empty() {
                let entry = ar.expect(Tag::Sequence, "ROAIPAddress")?;
                prefixes.push(roa_address(afi, entry.data)?);
            }
        }
        if prefixes.is_empty() {
            return Err(RpkiError::ParseError("RFC 9582: no prefixes".into()));
        }

        Ok(Roa {
            signed,
            asid,
            prefixes,
            talid: None,
            valid: false,
        })
    }
}

fn roa_address(afi: u16, data: &[u8]) -> Result<RoaPrefix, RpkiError> {
    let mut rd = DerReader::new(data);
    let (unused, bits) = der::bit_string(&rd.next()?, "address")?;
    let max_len = if rd.is_empty() {
        None
    } else {
        Some(der::uint(&rd.next()?, "maxLength")?)
    };
    rd.finish("ROAIPAddress")?;

    let (width, family_bits) = if afi == AFI_IPV4 { (4, 32) } else { (16, 128) };
    let value = addr_from_bits(bits, unused, width, false)
        .ok_or_else(|| RpkiError::ParseError("RFC 9582: address too long".into()))?;
    let len = prefix_len(bits, unused) as u64;
    let max_len = max_len.unwrap_or(len);
    if max_len < len || max_len > family_bits {
        return Err(RpkiError::ParseError(format!(
            "RFC 9582: invalid maxLength {} for /{}",
            max_len, len
        )));
    }
    let addr = if afi == AFI_IPV4 {
        IpAddr::V4(Ipv4Addr::from(value as u32))
    } else {
        IpAddr::V6(Ipv6Addr::from(value))
    };
    Ok(RoaPrefix {
        addr,
        len: len as u8,
        max_len: max_len as u8,
    })
}

#[cfg(test)]
pub(crate) fn content_for_test(asid: u64, v4: &[(&[u8], u8, Option<u64>)]) -> Vec<u8> {
    use super::der::build::*;
    let addrs: Vec<Vec<u8>> = v4
        .iter()
        .map(|(b, unused, max)| {
            let mut items = vec![bits(*unused, b)];
            if let Some(m) = max {
                items.push(int(*m));
            }
            seq(&items)
        })
        .collect();
    seq(&[
        int(asid),
        seq(&[seq(&[octets(&[0, 1]), seq(&addrs)])]),
    ])
}
