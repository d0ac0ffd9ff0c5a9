#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! AIA resolution through chains of unregistered CAs.

mod common;

use common::*;
use rpkival_lib::{Status, Validator, ValidatorConfig};

const MAX_DEPTH: usize = 3;

/// A trust anchor with `depth` CAs stacked below it, all holding
/// 10.0.0.0/8, and a ROA issued by the last one.
/// Returns the repository and the CAs, top first.
fn chain(depth: usize) -> (Repo, Vec<Authority>) {
    let repo = Repo::new();
    let ta = Authority::trust_anchor("ta", 1);
    repo.write_ta("test", &ta);
    repo.write(&ta.crl_file(), &ta.crl());

    let mut cas: Vec<Authority> = Vec::new();
    for i in 0..depth {
        let name = format!("ca{}", i);
        let ski = 10 + i as u8;
        let profile = CaProfile::default_resources();
        let ca = match cas.last() {
            Some(parent) => parent.issue_ca(&name, ski, profile),
            None => ta.issue_ca(&name, ski, profile),
        };
        repo.write(&ca.file(), &ca.der());
        repo.write(&ca.crl_file(), &ca.crl());
        cas.push(ca);
    }

    let last = cas.last().expect("at least one CA");
    let ee = last.issue_ee("leaf.roa", 0x60);
    repo.write("leaf.roa", &roa(&ee, 64496, &[(&[10, 1, 1], 24)]));
    repo.write("ta.tal", tal_text(&ta).as_bytes());
    (repo, cas)
}

fn validator(repo: &Repo) -> Validator {
    let config = ValidatorConfig {
        max_cert_depth: MAX_DEPTH,
        ..repo.config()
    };
    let mut v = Validator::new(config);
    let tal = repo.objects().join("ta.tal");
    v.load_tal("test.tal", &std::fs::read(tal).unwrap()).unwrap();
    v
}

#[test]
fn chain_at_max_depth_resolves() {
    let (repo, cas) = chain(MAX_DEPTH);
    let mut v = validator(&repo);

    let report = v.check_file(&uri("leaf.roa")).unwrap();
    assert_eq!(report.status, Status::Ok, "{:?}", report.error);
    assert_eq!(v.context().auths.len(), MAX_DEPTH + 1);
    for ca in &cas {
        assert!(v.context().uris.lookup(&ca.uri()).is_some(), "{}", ca.name);
    }
}

#[test]
fn chain_past_max_depth_registers_nothing() {
    let (repo, _cas) = chain(MAX_DEPTH + 1);
    let mut v = validator(&repo);

    let report = v.check_file(&uri("leaf.roa")).unwrap();
    assert_eq!(report.status, Status::Failed);
    let err = report.error.unwrap();
    assert!(err.contains("exceeds max depth"), "{}", err);
    assert_eq!(v.context().auths.len(), 1);
}

#[test]
fn broken_link_registers_nothing() {
    let (repo, cas) = chain(MAX_DEPTH);
    repo.remove(&cas[0].file());
    let mut v = validator(&repo);

    let report = v.check_file(&uri("leaf.roa")).unwrap();
    assert_eq!(report.status, Status::Failed);
    assert_eq!(v.context().auths.len(), 1);
    assert!(v.context().uris.lookup(&cas[1].uri()).is_none());
}

#[test]
fn partially_resolved_chain_is_reused() {
    let (repo, cas) = chain(2);
    let mut v = validator(&repo);
    // Resolving the second CA registers the first along the way.
    let report = v.check_file(&cas[1].uri()).unwrap();
    assert_eq!(report.status, Status::Ok, "{:?}", report.error);
    assert_eq!(v.context().auths.len(), 2);

    let report = v.check_file(&uri("leaf.roa")).unwrap();
    assert_eq!(report.status, Status::Ok, "{:?}", report.error);
    assert_eq!(v.context().auths.len(), 3);
}
