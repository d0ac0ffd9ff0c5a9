//! Minimal DER walking on top of `asn1-rs` for the structures x509-parser
//! does not decode itself (RFC 3779 resources, access descriptions, CMS).

use std::borrow::Cow;

use x509_parser::der_parser::asn1_rs::{Any, Class, FromDer, Oid, Tag};

use crate::RpkiError;

/// Sequential reader over the contents of a constructed DER value.
pub(crate) struct DerReader<'a> {
    rem: &'a [u8],
}

impl<'a> DerReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        DerReader { rem: data }
    }

    pub fn is_empty(&self) -> bool {
        self.rem.is_empty()
    }

    /// Next element, returned together with its complete encoding.
    pub fn next_raw(&mut self) -> Result<(Any<'a>, &'a [u8]), RpkiError> {
        let start = self.rem;
        let (rem, any) = Any::from_der(start).map_err(|e| RpkiError::DerError(e.to_string()))?;
        let consumed = start.len() - rem.len();
        self.rem = rem;
        let raw = start
            .get(..consumed)
            .ok_or_else(|| RpkiError::DerError("truncated element".into()))?;
        Ok((any, raw))
    }

    pub fn next(&mut self) -> Result<Any<'a>, RpkiError> {
        self.next_raw().map(|(any, _)| any)
    }

    /// Next element, which must be a universal type with `tag`.
    pub fn expect(&mut self, tag: Tag, what: &str) -> Result<Any<'a>, RpkiError> {
        let any = self.next()?;
        expect_universal(&any, tag, what)?;
        Ok(any)
    }

    /// Next element if it is a context-specific tag `n`, without consuming
    /// anything otherwise.
    pub fn optional_context(&mut self, n: u32) -> Result<Option<Any<'a>>, RpkiError> {
        if self.rem.is_empty() {
            return Ok(None);
        }
        let save = self.rem;
        let any = self.next()?;
        if is_context(&any, n) {
            Ok(Some(any))
        } else {
            self.rem = save;
            Ok(None)
        }
    }

    pub fn finish(&self, what: &str) -> Result<(), RpkiError> {
        if self.rem.is_empty() {
            Ok(())
        } else {
            Err(RpkiError::DerError(format!("{}: trailing data", what)))
        }
    }
}

/// Parse a single top-level element and reject trailing bytes.
pub(crate) fn parse_one<'a>(data: &'a [u8], tag: Tag, what: &str) -> Result<Any<'a>, RpkiError> {
    let mut rd = DerReader::new(data);
    let any = rd.expect(tag, what)?;
    rd.finish(what)?;
    Ok(any)
}

/// Parse a single element of any type and reject trailing bytes.
pub(crate) fn parse_one_any(data: &[u8]) -> Result<Any<'_>, RpkiError> {
    let mut rd = DerReader::new(data);
    let any = rd.next()?;
    rd.finish("element")?;
    Ok(any)
}

pub(crate) fn expect_universal(any: &Any<'_>, tag: Tag, what: &str) -> Result<(), RpkiError> {
    if any.header.class() != Class::Universal || any.header.tag() != tag {
        return Err(RpkiError::DerError(format!(
            "{}: unexpected tag {:?}",
            what,
            any.header.tag()
        )));
    }
    Ok(())
}

pub(crate) fn is_context(any: &Any<'_>, n: u32) -> bool {
    any.header.class() == Class::ContextSpecific && any.header.tag() == Tag(n)
}

pub(crate) fn oid_string(any: &Any<'_>, what: &str) -> Result<String, RpkiError> {
    expect_universal(any, Tag::Oid, what)?;
    Ok(Oid::new(Cow::Borrowed(any.data)).to_id_string())
}

/// Non-negative INTEGER that fits in 64 bits.
pub(crate) fn uint(any: &Any<'_>, what: &str) -> Result<u64, RpkiError> {
    expect_universal(any, Tag::Integer, what)?;
    let data = any.data;
    match data.first() {
        None => return Err(RpkiError::DerError(format!("{}: empty integer", what))),
        Some(b) if b & 0x80 != 0 => {
            return Err(RpkiError::DerError(format!("{}: negative integer", what)))
        }
        _ => {}
    }
    let trimmed: &[u8] = match data {
        [0, rest @ ..] if !rest.is_empty() => rest,
        _ => data,
    };
    if trimmed.len() > 8 {
        return Err(RpkiError::DerError(format!("{}: integer too large", what)));
    }
    Ok(trimmed.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

/// INTEGER content bytes, for values that may exceed 64 bits (serials,
/// manifest numbers).
pub(crate) fn int_bytes<'a>(any: &Any<'a>, what: &str) -> Result<&'a [u8], RpkiError> {
    expect_universal(any, Tag::Integer, what)?;
    if any.data.is_empty() {
        return Err(RpkiError::DerError(format!("{}: empty integer", what)));
    }
    Ok(any.data)
}

/// BIT STRING as (unused bit count, payload).
pub(crate) fn bit_string<'a>(any: &Any<'a>, what: &str) -> Result<(u8, &'a [u8]), RpkiError> {
    expect_universal(any, Tag::BitString, what)?;
    match any.data.split_first() {
        Some((&unused, rest)) if unused <= 7 && (unused == 0 || !rest.is_empty()) => {
            Ok((unused, rest))
        }
        _ => Err(RpkiError::DerError(format!("{}: malformed bit string", what))),
    }
}

pub(crate) fn ia5_string(any: &Any<'_>, what: &str) -> Result<String, RpkiError> {
    expect_universal(any, Tag::Ia5String, what)?;
    if !any.data.is_ascii() {
        return Err(RpkiError::DerError(format!("{}: non-ASCII IA5String", what)));
    }
    String::from_utf8(any.data.to_vec())
        .map_err(|_| RpkiError::DerError(format!("{}: invalid IA5String", what)))
}

/// GeneralizedTime in the `YYYYMMDDHHMMSSZ` form required by DER.
pub(crate) fn generalized_time(any: &Any<'_>, what: &str) -> Result<i64, RpkiError> {
    expect_universal(any, Tag::GeneralizedTime, what)?;
    let bad = || RpkiError::DerError(format!("{}: malformed GeneralizedTime", what));
    let text = std::str::from_utf8(any.data).map_err(|_| bad())?;
    if text.len() != 15 || !text.ends_with('Z') {
        return Err(bad());
    }
    let num = |range: std::ops::Range<usize>| -> Result<u32, RpkiError> {
        text.get(range)
            .filter(|s| s.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|s| s.parse().ok())
            .ok_or_else(bad)
    };
    let year = num(0..4)? as i32;
    let month = time::Month::try_from(num(4..6)? as u8).map_err(|_| bad())?;
    let date = time::Date::from_calendar_date(year, month, num(6..8)? as u8).map_err(|_| bad())?;
    let tod = time::Time::from_hms(num(8..10)? as u8, num(10..12)? as u8, num(12..14)? as u8)
        .map_err(|_| bad())?;
    Ok(time::PrimitiveDateTime::new(date, tod)
        .assume_utc()
        .unix_timestamp())
}
