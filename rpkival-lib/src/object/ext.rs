//! Decoders for the certificate extensions RPKI depends on beyond what
//! x509-parser interprets: information access URIs, CRL distribution point
//! URIs and the RFC 3779 IP address and AS identifier blocks.

use x509_parser::der_parser::asn1_rs::{Any, Tag};

use super::der::{self, DerReader};
use crate::resources::{addr_from_bits, Range, ResourceSet, Resources};
use crate::RpkiError;

/// GeneralName choice `uniformResourceIdentifier [6] IA5String`.
const GN_URI: u32 = 6;

/// `AccessDescription` entries with a URI location, as (method OID, URI).
pub(crate) fn access_descriptions(value: &[u8]) -> Result<Vec<(String, String)>, RpkiError> {
    let outer = der::parse_one(value, Tag::Sequence, "access descriptions")?;
    let mut rd = DerReader::new(outer.data);
    let mut out = Vec::new();
    while !rd.is_empty() {
        let ad = rd.expect(Tag::Sequence, "access description")?;
        let mut inner = DerReader::new(ad.data);
        let method = der::oid_string(&inner.next()?, "access method")?;
        let location = inner.next()?;
        inner.finish("access description")?;
        if der::is_context(&location, GN_URI) {
            out.push((method, uri_text(location.data)?));
        }
    }
    Ok(out)
}

/// URIs from the `fullName` of each distribution point.
pub(crate) fn crl_distribution_points(value: &[u8]) -> Result<Vec<String>, RpkiError> {
    let outer = der::parse_one(value, Tag::Sequence, "CRL distribution points")?;
    let mut rd = DerReader::new(outer.data);
    let mut out = Vec::new();
    while !rd.is_empty() {
        let dp = rd.expect(Tag::Sequence, "distribution point")?;
        let mut fields = DerReader::new(dp.data);
        let name = match fields.optional_context(0)? {
            Some(n) => n,
            None => continue,
        };
        let mut choice = DerReader::new(name.data);
        let full = choice.next()?;
        if !der::is_context(&full, 0) {
            continue;
        }
        let mut names = DerReader::new(full.data);
        while !names.is_empty() {
            let gn = names.next()?;
            if der::is_context(&gn, GN_URI) {
                out.push(uri_text(gn.data)?);
            }
        }
    }
    Ok(out)
}

fn uri_text(data: &[u8]) -> Result<String, RpkiError> {
    if !data.is_ascii() {
        return Err(RpkiError::DerError("non-ASCII URI".into()));
    }
    String::from_utf8(data.to_vec()).map_err(|_| RpkiError::DerError("invalid URI".into()))
}

/// Address family identifier (AFI) from an `addressFamily` octet string.
pub(crate) fn afi(any: &Any<'_>) -> Result<u16, RpkiError> {
    der::expect_universal(any, Tag::OctetString, "address family")?;
    match any.data {
        [hi, lo] | [hi, lo, _] => Ok(u16::from_be_bytes([*hi, *lo])),
        _ => Err(RpkiError::DerError("address family length".into())),
    }
}

pub(crate) const AFI_IPV4: u16 = 1;
pub(crate) const AFI_IPV6: u16 = 2;

/// `IPAddrBlocks` into the ipv4/ipv6 fields of `res`.
pub(crate) fn ip_addr_blocks(value: &[u8], res: &mut Resources) -> Result<(), RpkiError> {
    let outer = der::parse_one(value, Tag::Sequence, "IP address blocks")?;
    let mut rd = DerReader::new(outer.data);
    while !rd.is_empty() {
        let fam = rd.expect(Tag::Sequence, "IP address family")?;
        let mut fields = DerReader::new(fam.data);
        let afi = afi(&fields.next()?)?;
        let choice = fields.next()?;
        fields.finish("IP address family")?;

        match afi {
            AFI_IPV4 => {
                if res.ipv4.is_some() {
                    return Err(RpkiError::ParseError("duplicate IPv4 address family".into()));
                }
                res.ipv4 = Some(address_choice(&choice, 4)?.map_ranges(|v| v as u32));
            }
            AFI_IPV6 => {
                if res.ipv6.is_some() {
                    return Err(RpkiError::ParseError("duplicate IPv6 address family".into()));
                }
                res.ipv6 = Some(address_choice(&choice, 16)?);
            }
            other => {
                return Err(RpkiError::ParseError(format!("unknown AFI {}", other)));
            }
        }
    }
    Ok(())
}

trait MapRanges {
    fn map_ranges<U, F: Fn(u128) -> U>(self, f: F) -> ResourceSet<U>;
}

impl MapRanges for ResourceSet<u128> {
    fn map_ranges<U, F: Fn(u128) -> U>(self, f: F) -> ResourceSet<U> {
        match self {
            ResourceSet::Inherit => ResourceSet::Inherit,
            ResourceSet::Ranges(v) => ResourceSet::Ranges(
                v.into_iter()
                    .map(|r| Range { min: f(r.min), max: f(r.max) })
                    .collect(),
            ),
        }
    }
}

fn address_choice(
    choice: &Any<'_>,
    width: usize,
) -> Result<ResourceSet<u128>, RpkiError> {
    if der::expect_universal(choice, Tag::Null, "inherit").is_ok() {
        return Ok(ResourceSet::Inherit);
    }
    der::expect_universal(choice, Tag::Sequence, "addresses or ranges")?;
    let mut rd = DerReader::new(choice.data);
    let mut ranges = Vec::new();
    while !rd.is_empty() {
        let item = rd.next()?;
        let range = if item.header.tag() == Tag::BitString {
            let (unused, bits) = der::bit_string(&item, "address prefix")?;
            Range {
                min: addr(bits, unused, width, false)?,
                max: addr(bits, unused, width, true)?,
            }
        } else {
            der::expect_universal(&item, Tag::Sequence, "address range")?;
            let mut pair = DerReader::new(item.data);
            let (lu, lo) = der::bit_string(&pair.next()?, "range min")?;
            let (hu, hi) = der::bit_string(&pair.next()?, "range max")?;
            pair.finish("address range")?;
            Range {
                min: addr(lo, lu, width, false)?,
                max: addr(hi, hu, width, true)?,
            }
        };
        if range.min > range.max {
            return Err(RpkiError::ParseError("inverted address range".into()));
        }
        ranges.push(range);
    }
    if ranges.is_empty() {
        return Err(RpkiError::ParseError("empty address list".into()));
    }
    Ok(ResourceSet::Ranges(ranges))
}

fn addr(bits: &[u8], unused: u8, width: usize, fill: bool) -> Result<u128, RpkiError> {
    addr_from_bits(bits, unused, width, fill)
        .ok_or_else(|| RpkiError::ParseError("address too long for family".into()))
}

/// `ASIdentifiers` into the asn field of `res`. Routing domain identifiers
/// are not used by RPKI and are ignored.
pub(crate) fn as_identifiers(value: &[u8], res: &mut Resources) -> Result<(), RpkiError> {
    let outer = der::parse_one(value, Tag::Sequence, "AS identifiers")?;
    let mut rd = DerReader::new(outer.data);
    let asnum = match rd.optional_context(0)? {
        Some(a) => a,
        None => return Ok(()),
    };
    let choice = der::parse_one_any(asnum.data)?;
    if der::expect_universal(&choice, Tag::Null, "inherit").is_ok() {
        res.asn = Some(ResourceSet::Inherit);
        return Ok(());
    }
    der::expect_universal(&choice, Tag::Sequence, "AS ids or ranges")?;
    let mut ids = DerReader::new(choice.data);
    let mut ranges = Vec::new();
    while !ids.is_empty() {
        let item = ids.next()?;
        let range = if item.header.tag() == Tag::Integer {
            Range::single(asn(&item)?)
        } else {
            der::expect_universal(&item, Tag::Sequence, "AS range")?;
            let mut pair = DerReader::new(item.data);
            let min = asn(&pair.next()?)?;
            let max = asn(&pair.next()?)?;
            pair.finish("AS range")?;
            if min > max {
                return Err(RpkiError::ParseError("inverted AS range".into()));
            }
            Range { min, max }
        };
        ranges.push(range);
    }
    if ranges.is_empty() {
        return Err(RpkiError::ParseError("empty AS list".into()));
    }
    res.asn = Some(ResourceSet::Ranges(ranges));
    Ok(())
}

pub(crate) fn asn(any: &Any<'_>) -> Result<u32, RpkiError> {
    let v = der::uint(any, "AS number")?;
    u32::try_from(v).map_err(|_| RpkiError::ParseError(format!("AS number {} out of range", v)))
}
