#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Validating individual files against a TAL, resolving issuers on demand.

mod common;

use common::*;
use rpkival_lib::{display_report, to_json, Object, RType, Status, Validator};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Trust anchor and CA published with their CRLs plus a ROA issued by the
/// CA, and a validator with the TAL loaded.
fn setup() -> (Repo, Authority, Authority, Validator) {
    let repo = Repo::new();
    let ta = Authority::trust_anchor("ta", 1);
    let ca = ta.issue_ca("ca", 2, CaProfile::default_resources());
    repo.write_ta("test", &ta);
    repo.write(&ta.crl_file(), &ta.crl());
    repo.write(&ca.file(), &ca.der());
    repo.write(&ca.crl_file(), &ca.crl());
    let ee = ca.issue_ee("a.roa", 0x20);
    repo.write("a.roa", &roa(&ee, 64496, &[(&[10, 1], 24)]));

    let mut v = Validator::new(repo.config());
    let id = v.load_tal("/etc/tals/test.tal", tal_text(&ta).as_bytes()).unwrap();
    assert_eq!(id, 0);
    (repo, ta, ca, v)
}

// ---------------------------------------------------------------------------
// TALs
// ---------------------------------------------------------------------------

#[test]
fn tal_registers_trust_anchor() {
    let (_repo, ta, _ca, v) = setup();
    assert_eq!(v.tals().len(), 1);
    assert_eq!(v.tals()[0].descr, "test");
    assert_eq!(v.context().auths.len(), 1);
    assert!(v.context().uris.lookup(&ta.uri()).is_some());
}

#[test]
fn tal_without_trust_anchor_file_is_kept() {
    let repo = Repo::new();
    let ta = Authority::trust_anchor("ta", 1);
    let mut v = Validator::new(repo.config());
    v.load_tal("test.tal", tal_text(&ta).as_bytes()).unwrap();
    assert_eq!(v.tals().len(), 1);
    assert!(v.context().auths.is_empty());
}

#[test]
fn malformed_tal_is_an_error() {
    let repo = Repo::new();
    let mut v = Validator::new(repo.config());
    assert!(v.load_tal("bad.tal", b"garbage\n").is_err());
    assert!(v.tals().is_empty());
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

#[test]
fn roa_by_rsync_uri() {
    let (_repo, ta, ca, mut v) = setup();
    let report = v.check_file(&uri("a.roa")).unwrap();
    assert_eq!(report.status, Status::Ok, "{:?}", report.error);
    assert_eq!(report.rtype, Some(RType::Roa));
    assert!(!report.hash_id.is_empty());
    assert!(report.expires.is_some());
    assert!(matches!(report.object, Some(Object::Roa(_))));

    // The CA was fetched through the ROA's AIA; the ROA itself is not kept.
    assert_eq!(v.context().auths.len(), 2);
    assert!(v.context().uris.lookup(&ca.uri()).is_some());

    let path = &report.signature_path;
    assert_eq!(path.first(), Some(&ca.crl_uri()));
    assert!(path.contains(&ca.uri()));
    assert!(path.contains(&ta.crl_uri()));
    assert!(path.contains(&ta.uri()));
}

#[test]
fn roa_by_local_path() {
    let (repo, _ta, _ca, mut v) = setup();
    let file = path_str(&repo.objects().join("a.roa"));
    let report = v.check_file(&file).unwrap();
    assert_eq!(report.status, Status::Ok, "{:?}", report.error);
    assert_eq!(report.file, file);
}

#[test]
fn registered_issuers_are_reused() {
    let (repo, _ta, ca, mut v) = setup();
    assert_eq!(v.check_file(&uri("a.roa")).unwrap().status, Status::Ok);

    // With the CA registered its file is no longer needed.
    repo.remove(&ca.file());
    let ee = ca.issue_ee("b.roa", 0x21);
    repo.write("b.roa", &roa(&ee, 64496, &[(&[10, 2], 16)]));
    let report = v.check_file(&uri("b.roa")).unwrap();
    assert_eq!(report.status, Status::Ok, "{:?}", report.error);
    assert_eq!(v.context().auths.len(), 2);
}

#[test]
fn roa_outside_resources_fails() {
    let (repo, _ta, ca, mut v) = setup();
    let ee = ca.issue_ee("wide.roa", 0x22);
    repo.write("wide.roa", &roa(&ee, 64496, &[(&[192, 168], 24)]));

    let report = v.check_file(&uri("wide.roa")).unwrap();
    assert_eq!(report.status, Status::Failed);
    assert_eq!(
        report.error.as_deref(),
        Some("ROA prefixes not covered by EE resources")
    );
    assert!(report.signature_path.is_empty());
}

#[test]
fn missing_issuer_fails() {
    let (repo, _ta, ca, mut v) = setup();
    repo.remove(&ca.file());
    let report = v.check_file(&uri("a.roa")).unwrap();
    assert_eq!(report.status, Status::Failed);
    assert!(report.error.is_some());
    assert_eq!(v.context().auths.len(), 1);
}

#[test]
fn missing_file_fails() {
    let (_repo, _ta, _ca, mut v) = setup();
    let report = v.check_file(&uri("absent.roa")).unwrap();
    assert_eq!(report.status, Status::Failed);
    assert!(report.hash_id.is_empty());
}

#[test]
fn crl_is_not_applicable() {
    let (_repo, _ta, ca, mut v) = setup();
    let report = v.check_file(&ca.crl_uri()).unwrap();
    assert_eq!(report.status, Status::NotApplicable);
    assert!(matches!(report.object, Some(Object::Crl(_))));
}

#[test]
fn ca_certificate() {
    let (_repo, _ta, ca, mut v) = setup();
    let report = v.check_file(&ca.uri()).unwrap();
    assert_eq!(report.status, Status::Ok, "{:?}", report.error);
    match report.object {
        Some(Object::Cert(c)) => assert_eq!(c.talid, Some(0)),
        other => panic!("unexpected object: {:?}", other),
    }
}

#[test]
fn trust_anchor_matched_to_tal() {
    let (repo, _ta, _ca, mut v) = setup();
    let file = path_str(&repo.base().join("ta").join("test").join("ta.cer"));
    let report = v.check_file(&file).unwrap();
    assert_eq!(report.status, Status::Ok, "{:?}", report.error);
    assert_eq!(report.tal.as_deref(), Some("test"));
}

#[test]
fn unknown_trust_anchor_is_not_applicable() {
    let (repo, _ta, _ca, mut v) = setup();
    let other = Authority::trust_anchor("other", 9);
    let path = repo.write(&other.file(), &other.der());
    let report = v.check_file(&path_str(&path)).unwrap();
    assert_eq!(report.status, Status::NotApplicable);
    assert!(report.tal.is_none());
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[test]
fn text_and_json_reports() {
    let (_repo, _ta, ca, mut v) = setup();
    let report = v.check_file(&uri("a.roa")).unwrap();

    let text = display_report(&report);
    assert!(text.contains("Validation:               OK\n"));
    assert!(text.contains("asID:                     64496\n"));
    assert!(text.contains(&format!("Signature path:           {}\n", ca.crl_uri())));
    assert!(text.contains("Signature path expires:"));

    let json: serde_json::Value = serde_json::from_str(&to_json(&report).unwrap()).unwrap();
    assert_eq!(json["validation"], "OK");
    assert_eq!(json["type"], "roa");
    assert_eq!(json["signature_path"][0], ca.crl_uri().as_str());
}
