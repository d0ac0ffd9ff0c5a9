//! RFC 3779 number resources and containment checks.
//!
//! IP prefixes and ranges are normalized to inclusive integer ranges
//! (`u32` for IPv4, `u128` for IPv6, `u32` for AS numbers) so that coverage
//! of a child's resources by its issuer reduces to interval arithmetic.

use std::net::{Ipv4Addr, Ipv6Addr};

use serde::Serialize;

use crate::object::RoaPrefix;
use crate::RpkiError;

/// Inclusive range of resource values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Range<T> {
    pub min: T,
    pub max: T,
}

impl<T: Copy> Range<T> {
    pub fn single(v: T) -> Self {
        Range { min: v, max: v }
    }
}

/// A resource family as carried by a certificate: either inherited from the
/// issuer or an explicit list of ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceSet<T> {
    Inherit,
    Ranges(Vec<Range<T>>),
}

/// The three resource families of a certificate. `None` means the
/// corresponding extension (or address family) is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resources {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<ResourceSet<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<ResourceSet<u128>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asn: Option<ResourceSet<u32>>,
}

impl Resources {
    pub fn is_empty(&self) -> bool {
        self.ipv4.is_none() && self.ipv6.is_none() && self.asn.is_none()
    }

    pub fn has_inherit(&self) -> bool {
        matches!(self.ipv4, Some(ResourceSet::Inherit))
            || matches!(self.ipv6, Some(ResourceSet::Inherit))
            || matches!(self.asn, Some(ResourceSet::Inherit))
    }

    pub fn has_ip(&self) -> bool {
        self.ipv4.is_some() || self.ipv6.is_some()
    }
}

/// Resource values with a successor, needed to merge adjacent ranges.
pub trait Bound: Ord + Copy {
    fn succ(self) -> Option<Self>;
}

impl Bound for u32 {
    fn succ(self) -> Option<Self> {
        self.checked_add(1)
    }
}

impl Bound for u128 {
    fn succ(self) -> Option<Self> {
        self.checked_add(1)
    }
}

/// Whether `r` lies entirely inside the union of `set`.
pub fn covered<T: Bound>(set: &[Range<T>], r: &Range<T>) -> bool {
    if r.min > r.max {
        return false;
    }
    let mut sorted: Vec<&Range<T>> = set.iter().collect();
    sorted.sort_by_key(|x| x.min);

    let mut need = r.min;
    for p in sorted {
        if p.max < need {
            continue;
        }
        if p.min > need {
            return false;
        }
        if p.max >= r.max {
            return true;
        }
        match p.max.succ() {
            Some(n) => need = n,
            None => return true,
        }
    }
    false
}

/// Resolve inheritance: walk from the certificate itself up through its
/// issuers and return the first explicit set. `None` if the family is
/// absent somewhere along the way or inheritance never terminates.
pub fn effective<'a, T: 'a, I>(chain: I) -> Option<&'a [Range<T>]>
where
    I: IntoIterator<Item = Option<&'a ResourceSet<T>>>,
{
    for set in chain {
        match set? {
            ResourceSet::Inherit => continue,
            ResourceSet::Ranges(r) => return Some(r.as_slice()),
        }
    }
    None
}

/// Check one family of a child certificate against its issuer chain
/// (nearest issuer first). Returns the first uncovered range, if any.
pub fn check_family<'a, T, I>(
    child: Option<&ResourceSet<T>>,
    issuers: I,
) -> Result<(), Option<Range<T>>>
where
    T: Bound + 'a,
    I: IntoIterator<Item = Option<&'a ResourceSet<T>>>,
{
    let child = match child {
        None => return Ok(()),
        Some(c) => c,
    };
    let parent = effective(issuers);
    match (child, parent) {
        (_, None) => Err(None),
        (ResourceSet::Inherit, Some(_)) => Ok(()),
        (ResourceSet::Ranges(ranges), Some(p)) => {
            match ranges.iter().find(|r| !covered(p, r)) {
                Some(r) => Err(Some(*r)),
                None => Ok(()),
            }
        }
    }
}

/// Check all three families of `child` against its issuers (nearest
/// first).
pub fn check_resources(child: &Resources, issuers: &[&Resources]) -> Result<(), RpkiError> {
    check_family(child.ipv4.as_ref(), issuers.iter().map(|r| r.ipv4.as_ref())).map_err(|e| {
        uncovered("IPv4", e.map(|r| format!("{}-{}", Ipv4Addr::from(r.min), Ipv4Addr::from(r.max))))
    })?;
    check_family(child.ipv6.as_ref(), issuers.iter().map(|r| r.ipv6.as_ref())).map_err(|e| {
        uncovered("IPv6", e.map(|r| format!("{}-{}", Ipv6Addr::from(r.min), Ipv6Addr::from(r.max))))
    })?;
    check_family(child.asn.as_ref(), issuers.iter().map(|r| r.asn.as_ref()))
        .map_err(|e| uncovered("AS", e.map(|r| format!("{}-{}", r.min, r.max))))?;
    Ok(())
}

fn uncovered(family: &str, range: Option<String>) -> RpkiError {
    match range {
        Some(r) => RpkiError::ResourceError(format!(
            "RFC 3779: {} resources {} not covered by issuer",
            family, r
        )),
        None => RpkiError::ResourceError(format!(
            "RFC 3779: issuer has no {} resources to inherit or delegate",
            family
        )),
    }
}

/// Whether every ROA prefix lies within the effective IP resources of the
/// EE certificate `ee` (inheritance resolved through `issuers`).
pub fn roa_covered(prefixes: &[RoaPrefix], ee: &Resources, issuers: &[&Resources]) -> bool {
    let v4 = effective(
        std::iter::once(ee.ipv4.as_ref()).chain(issuers.iter().map(|r| r.ipv4.as_ref())),
    );
    let v6 = effective(
        std::iter::once(ee.ipv6.as_ref()).chain(issuers.iter().map(|r| r.ipv6.as_ref())),
    );
    prefixes.iter().all(|p| match (p.v4_range(), p.v6_range()) {
        (Some(r), _) => v4.map_or(false, |set| covered(set, &r)),
        (_, Some(r)) => v6.map_or(false, |set| covered(set, &r)),
        (None, None) => false,
    })
}

/// Decode an RFC 3779 address bit string into an integer of `width` bytes.
/// With `fill_ones` the bits past the encoded length are set, producing the
/// upper bound of a prefix or range.
pub fn addr_from_bits(data: &[u8], unused: u8, width: usize, fill_ones: bool) -> Option<u128> {
    if data.len() > width || width > 16 || unused > 7 || (data.is_empty() && unused != 0) {
        return None;
    }
    let mut v: u128 = 0;
    for b in data {
        v = (v << 8) | u128::from(*b);
    }
    let pad = ((width - data.len()) * 8) as u32;
    v = v.checked_shl(pad).unwrap_or(0);

    let used = data.len() * 8 - usize::from(unused);
    let host = (width * 8 - used) as u32;
    let host_mask = match host {
        0 => 0,
        128 => u128::MAX,
        h => (1u128 << h) - 1,
    };
    if fill_ones {
        v |= host_mask;
    } else {
        v &= !host_mask;
    }
    Some(v)
}

/// Prefix length of an address bit string.
pub fn prefix_len(data: &[u8], unused: u8) -> usize {
    (data.len() * 8).saturating_sub(usize::from(unused))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn r(min: u32, max: u32) -> Range<u32> {
        Range { min, max }
    }

    #[test]
    fn coverage_with_adjacent_ranges() {
        let set = vec![r(10, 19), r(0, 9), r(30, 40)];
        assert!(covered(&set, &r(0, 19)));
        assert!(covered(&set, &r(5, 12)));
        assert!(covered(&set, &r(35, 35)));
        assert!(!covered(&set, &r(15, 31)));
        assert!(!covered(&set, &r(41, 41)));
        assert!(!covered(&[], &r(1, 1)));
    }

    #[test]
    fn coverage_at_type_maximum() {
        let set = vec![r(u32::MAX - 5, u32::MAX)];
        assert!(covered(&set, &r(u32::MAX - 1, u32::MAX)));
        let v6 = vec![Range { min: 0u128, max: u128::MAX }];
        assert!(covered(&v6, &Range { min: 1, max: u128::MAX }));
    }

    #[test]
    fn inheritance_resolution() {
        let explicit = ResourceSet::Ranges(vec![r(100, 200)]);
        let inherit = ResourceSet::Inherit;
        let chain = vec![Some(&inherit), Some(&inherit), Some(&explicit)];
        assert_eq!(effective(chain), Some(&[r(100, 200)][..]));
        let broken = vec![Some(&inherit), None, Some(&explicit)];
        assert_eq!(effective(broken), None);
        let only_inherit: Vec<Option<&ResourceSet<u32>>> = vec![Some(&inherit)];
        assert_eq!(effective(only_inherit), None);
    }

    #[test]
    fn family_checks() {
        let parent = ResourceSet::Ranges(vec![r(64496, 64511)]);
        let good = ResourceSet::Ranges(vec![r(64500, 64500)]);
        let bad = ResourceSet::Ranges(vec![r(64500, 64500), r(65000, 65001)]);
        assert!(check_family(Some(&good), vec![Some(&parent)]).is_ok());
        assert_eq!(
            check_family(Some(&bad), vec![Some(&parent)]),
            Err(Some(r(65000, 65001)))
        );
        assert!(check_family(None, vec![None::<&ResourceSet<u32>>]).is_ok());
        assert_eq!(check_family(Some(&good), vec![None]), Err(None));
        assert!(check_family(Some(&ResourceSet::Inherit), vec![Some(&parent)]).is_ok());
    }

    #[test]
    fn roa_prefixes_against_inherited_resources() {
        let issuer = Resources {
            ipv4: Some(ResourceSet::Ranges(vec![r(0xc000_0200, 0xc000_02ff)])),
            ..Default::default()
        };
        let ee = Resources {
            ipv4: Some(ResourceSet::Inherit),
            ..Default::default()
        };
        let inside = RoaPrefix {
            addr: "192.0.2.128".parse().unwrap(),
            len: 25,
            max_len: 25,
        };
        let outside = RoaPrefix {
            addr: "198.51.100.0".parse().unwrap(),
            len: 24,
            max_len: 24,
        };
        let v6 = RoaPrefix {
            addr: "2001:db8::".parse().unwrap(),
            len: 32,
            max_len: 48,
        };
        assert!(roa_covered(&[inside.clone()], &ee, &[&issuer]));
        assert!(!roa_covered(&[inside.clone(), outside], &ee, &[&issuer]));
        assert!(!roa_covered(&[v6], &ee, &[&issuer]));
        assert!(check_resources(&ee, &[&issuer]).is_ok());
    }

    #[test]
    fn resource_errors_name_the_range() {
        let issuer = Resources {
            asn: Some(ResourceSet::Ranges(vec![r(64496, 64511)])),
            ..Default::default()
        };
        let child = Resources {
            asn: Some(ResourceSet::Ranges(vec![r(65000, 65000)])),
            ..Default::default()
        };
        let err = check_resources(&child, &[&issuer]).unwrap_err();
        assert!(err.to_string().contains("65000-65000"));
        let v4_child = Resources {
            ipv4: Some(ResourceSet::Inherit),
            ..Default::default()
        };
        assert!(check_resources(&v4_child, &[&issuer]).is_err());
    }

    #[test]
    fn address_bits() {
        // 10.0.0.0/8
        assert_eq!(addr_from_bits(&[10], 0, 4, false), Some(0x0a00_0000));
        assert_eq!(addr_from_bits(&[10], 0, 4, true), Some(0x0aff_ffff));
        // 192.168.0.0/23: two bytes + one bit, 7 unused
        assert_eq!(addr_from_bits(&[192, 168, 0], 1, 4, false), Some(0xc0a8_0000));
        assert_eq!(addr_from_bits(&[192, 168, 0], 1, 4, true), Some(0xc0a8_01ff));
        // 0.0.0.0/0
        assert_eq!(addr_from_bits(&[], 0, 4, true), Some(0xffff_ffff));
        assert_eq!(addr_from_bits(&[], 0, 16, true), Some(u128::MAX));
        assert_eq!(addr_from_bits(&[1, 2, 3, 4, 5], 0, 4, false), None);
        assert_eq!(prefix_len(&[192, 168, 0], 1), 23);
    }
}
