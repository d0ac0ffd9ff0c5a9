//! Human-readable and JSON formatting of file mode reports.

use std::fmt::Write;

use crate::entity::Object;
use crate::object::{Cert, Signed};
use crate::resources::{Range, ResourceSet, Resources};
use crate::util::{hex_colon_upper, time2str};
use crate::validator::{FileReport, Status};
use crate::RpkiError;

const WIDTH: usize = 26;

fn line(out: &mut String, label: &str, value: impl std::fmt::Display) {
    let label = format!("{}:", label);
    let _ = writeln!(out, "{:<width$}{}", label, value, width = WIDTH);
}

fn cont(out: &mut String, value: impl std::fmt::Display) {
    let _ = writeln!(out, "{:<width$}{}", "", value, width = WIDTH);
}

/// Format a report as aligned `label: value` lines.
pub fn display_report(report: &FileReport) -> String {
    let mut out = String::new();
    line(&mut out, "File", &report.file);
    if !report.hash_id.is_empty() {
        line(&mut out, "Hash identifier", &report.hash_id);
    }
    if let Some(obj) = &report.object {
        format_object(&mut out, obj);
    }
    if let Some(tal) = &report.tal {
        line(&mut out, "TAL", tal);
    }
    match &report.error {
        Some(e) => line(&mut out, "Validation", format!("{}, {}", report.status, e)),
        None => line(&mut out, "Validation", report.status),
    }
    if report.status == Status::Ok {
        let mut path = report.signature_path.iter();
        if let Some(first) = path.next() {
            line(&mut out, "Signature path", first);
            for uri in path {
                cont(&mut out, uri);
            }
        }
        if let Some(exp) = report.expires {
            line(&mut out, "Signature path expires", time2str(exp));
        }
    }
    out
}

fn format_object(out: &mut String, obj: &Object) {
    match obj {
        Object::Cert(c) => format_cert(out, c),
        Object::Crl(crl) => {
            line(out, "Authority key identifier", &crl.aki);
            line(out, "CRL this update", time2str(crl.this_update));
            line(out, "CRL next update", time2str(crl.next_update));
            line(out, "Revoked certificates", crl.revoked.len());
        }
        Object::Mft(mft) => {
            format_signed(out, &mft.signed);
            line(out, "Manifest number", hex::encode_upper(&mft.number));
            line(out, "Manifest this update", time2str(mft.this_update));
            line(out, "Manifest next update", time2str(mft.next_update));
            if mft.stale {
                line(out, "Stale", "yes");
            }
            let mut files = mft.files.iter().enumerate();
            if let Some((i, f)) = files.next() {
                line(out, "Files and hashes", format!("{:>2}: {} {}", i + 1, f.file, hex::encode(&f.hash)));
                for (i, f) in files {
                    cont(out, format!("{:>2}: {} {}", i + 1, f.file, hex::encode(&f.hash)));
                }
            }
        }
        Object::Roa(roa) => {
            format_signed(out, &roa.signed);
            line(out, "asID", roa.asid);
            let mut prefixes = roa.prefixes.iter().enumerate();
            if let Some((i, p)) = prefixes.next() {
                line(out, "IP address blocks", format!("{:>2}: {}/{} maxlen: {}", i + 1, p.addr, p.len, p.max_len));
                for (i, p) in prefixes {
                    cont(out, format!("{:>2}: {}/{} maxlen: {}", i + 1, p.addr, p.len, p.max_len));
                }
            }
        }
        Object::Gbr(gbr) => {
            format_signed(out, &gbr.signed);
            let mut lines = gbr.vcard.lines().filter(|l| !l.is_empty());
            if let Some(first) = lines.next() {
                line(out, "vcard", first);
                for l in lines {
                    cont(out, l);
                }
            }
        }
        Object::Tal(tal) => {
            line(out, "Trust anchor name", &tal.descr);
            let mut uris = tal.uris.iter();
            if let Some(first) = uris.next() {
                line(out, "Trust anchor location", first);
                for u in uris {
                    cont(out, u);
                }
            }
        }
    }
}

fn format_cert(out: &mut String, c: &Cert) {
    line(out, "Subject key identifier", &c.ski);
    if let Some(aki) = &c.aki {
        line(out, "Authority key identifier", aki);
    }
    line(out, "Certificate serial", hex_colon_upper(&c.serial));
    if let Some(aia) = &c.aia {
        line(out, "Authority info access", aia);
    }
    if let Some(crl) = &c.crl {
        line(out, "Revocation list", crl);
    }
    if let Some(repo) = &c.repo {
        line(out, "caRepository", repo);
    }
    if let Some(mft) = &c.mft {
        line(out, "Manifest", mft);
    }
    if let Some(notify) = &c.notify {
        line(out, "rpkiNotify", notify);
    }
    format_resources(out, &c.resources);
    line(out, "Certificate not after", time2str(c.not_after));
}

fn format_signed(out: &mut String, s: &Signed) {
    line(out, "Subject key identifier", &s.ski);
    line(out, "Authority key identifier", &s.aki);
    line(out, "Authority info access", &s.aia);
    if let Some(crl) = &s.crl {
        line(out, "Revocation list", crl);
    }
    line(out, "Signing time not after", time2str(s.not_after));
}

fn format_resources(out: &mut String, r: &Resources) {
    let mut entries = Vec::new();
    if let Some(set) = &r.ipv4 {
        entries.extend(set_strings(set, |v| std::net::Ipv4Addr::from(v).to_string(), "IPv4"));
    }
    if let Some(set) = &r.ipv6 {
        entries.extend(set_strings(set, |v| std::net::Ipv6Addr::from(v).to_string(), "IPv6"));
    }
    if let Some(set) = &r.asn {
        entries.extend(set_strings(set, |v| format!("AS{}", v), "AS"));
    }
    let mut it = entries.iter().enumerate();
    if let Some((i, e)) = it.next() {
        line(out, "Subordinate resources", format!("{:>2}: {}", i + 1, e));
        for (i, e) in it {
            cont(out, format!("{:>2}: {}", i + 1, e));
        }
    }
}

fn set_strings<T: Copy + PartialEq>(
    set: &ResourceSet<T>,
    fmt: impl Fn(T) -> String,
    family: &str,
) -> Vec<String> {
    match set {
        ResourceSet::Inherit => vec![format!("{} inherit", family)],
        ResourceSet::Ranges(ranges) => ranges
            .iter()
            .map(|Range { min, max }| {
                if min == max {
                    fmt(*min)
                } else {
                    format!("{} -- {}", fmt(*min), fmt(*max))
                }
            })
            .collect(),
    }
}

/// Serialize a report as pretty-printed JSON.
pub fn to_json(report: &FileReport) -> Result<String, RpkiError> {
    serde_json::to_string_pretty(report).map_err(RpkiError::Json)
}
