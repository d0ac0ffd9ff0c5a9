//! Test fixtures: certificate hierarchies built with rcgen, CMS signed
//! objects built by hand, and a temporary repository on disk.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use rcgen::{
    date_time_ymd, BasicConstraints, CertificateParams, CertificateRevocationListParams,
    CrlDistributionPoint, CustomExtension, DistinguishedName, DnType, IsCa, KeyIdMethod,
    KeyPair, RevokedCertParams, SerialNumber,
};
use base64::Engine;
use rpkival_lib::{file_hash, Entity, RType, ValidatorConfig};
use tempfile::TempDir;

/// 2023-11-14 22:13:20 UTC.
pub const NOW: i64 = 1_700_000_000;
pub const HOST_DIR: &str = "example.net/repo";

pub fn uri(name: &str) -> String {
    format!("rsync://{}/{}", HOST_DIR, name)
}

// DER encoding helpers.

pub fn tlv(tag: u8, body: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = body.len();
    if len < 0x80 {
        out.push(len as u8);
    } else if len < 0x100 {
        out.extend([0x81, len as u8]);
    } else {
        out.extend([0x82, (len >> 8) as u8, len as u8]);
    }
    out.extend_from_slice(body);
    out
}

pub fn seq(items: &[Vec<u8>]) -> Vec<u8> {
    tlv(0x30, &items.concat())
}

pub fn set(items: &[Vec<u8>]) -> Vec<u8> {
    tlv(0x31, &items.concat())
}

pub fn int(v: u64) -> Vec<u8> {
    let bytes = v.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count().min(7);
    let mut body = bytes[skip..].to_vec();
    if body[0] & 0x80 != 0 {
        body.insert(0, 0);
    }
    tlv(0x02, &body)
}

pub fn oid(dotted: &str) -> Vec<u8> {
    let arcs: Vec<u64> = dotted.split('.').map(|a| a.parse().unwrap()).collect();
    let mut body = vec![(arcs[0] * 40 + arcs[1]) as u8];
    for &arc in &arcs[2..] {
        let mut chunk = vec![(arc & 0x7f) as u8];
        let mut rest = arc >> 7;
        while rest > 0 {
            chunk.insert(0, (rest & 0x7f) as u8 | 0x80);
            rest >>= 7;
        }
        body.extend(chunk);
    }
    tlv(0x06, &body)
}

pub fn octets(b: &[u8]) -> Vec<u8> {
    tlv(0x04, b)
}

pub fn null() -> Vec<u8> {
    vec![0x05, 0x00]
}

pub fn ia5(s: &str) -> Vec<u8> {
    tlv(0x16, s.as_bytes())
}

pub fn bits(unused: u8, b: &[u8]) -> Vec<u8> {
    let mut body = vec![unused];
    body.extend_from_slice(b);
    tlv(0x03, &body)
}

pub fn gentime(s: &str) -> Vec<u8> {
    tlv(0x18, s.as_bytes())
}

pub fn ctx(n: u8, inner: &[u8]) -> Vec<u8> {
    tlv(0xa0 | n, inner)
}

pub fn uri_name(u: &str) -> Vec<u8> {
    tlv(0x86, u.as_bytes())
}

// RFC 3779 and access description extension contents.

const OID_AIA: &[u64] = &[1, 3, 6, 1, 5, 5, 7, 1, 1];
const OID_SIA: &[u64] = &[1, 3, 6, 1, 5, 5, 7, 1, 11];
const OID_IP: &[u64] = &[1, 3, 6, 1, 5, 5, 7, 1, 7];
const OID_AS: &[u64] = &[1, 3, 6, 1, 5, 5, 7, 1, 8];

/// IPv4 prefixes given as their significant bytes (10.1/16 is `[10, 1]`).
pub fn ipv4(prefixes: &[&[u8]]) -> Vec<u8> {
    let items: Vec<Vec<u8>> = prefixes.iter().map(|p| bits(0, p)).collect();
    seq(&[seq(&[octets(&[0, 1]), seq(&items)])])
}

pub fn ipv4_inherit() -> Vec<u8> {
    seq(&[seq(&[octets(&[0, 1]), null()])])
}

pub fn asns(ids: &[u64]) -> Vec<u8> {
    let items: Vec<Vec<u8>> = ids.iter().map(|&a| int(a)).collect();
    seq(&[ctx(0, &seq(&items))])
}

pub fn asns_inherit() -> Vec<u8> {
    seq(&[ctx(0, &null())])
}

pub fn critical(oid: &[u64], content: Vec<u8>) -> CustomExtension {
    let mut ext = CustomExtension::from_oid_content(oid, content);
    ext.set_criticality(true);
    ext
}

fn access(method: &str, location: &str) -> Vec<u8> {
    seq(&[oid(method), uri_name(location)])
}

fn aia(issuer_uri: &str) -> CustomExtension {
    CustomExtension::from_oid_content(
        OID_AIA,
        seq(&[access("1.3.6.1.5.5.7.48.2", issuer_uri)]),
    )
}

fn ca_sia(name: &str) -> CustomExtension {
    CustomExtension::from_oid_content(
        OID_SIA,
        seq(&[
            access("1.3.6.1.5.5.7.48.5", &uri("")),
            access("1.3.6.1.5.5.7.48.10", &uri(&format!("{}.mft", name))),
        ]),
    )
}

fn ee_sia(object_uri: &str) -> CustomExtension {
    CustomExtension::from_oid_content(OID_SIA, seq(&[access("1.3.6.1.5.5.7.48.11", object_uri)]))
}

fn base_params(name: &str, ski: u8) -> CertificateParams {
    let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, name);
    params.distinguished_name = dn;
    params.key_identifier_method = KeyIdMethod::PreSpecified(vec![ski; 20]);
    params.serial_number = Some(SerialNumber::from(u64::from(ski)));
    params
}

/// Resource extensions and optional extras for a new CA certificate.
pub struct CaProfile {
    pub ip: Vec<u8>,
    pub asn: Vec<u8>,
    pub not_after: Option<(i32, u8, u8)>,
    pub extra: Vec<CustomExtension>,
}

impl CaProfile {
    pub fn new(ip: Vec<u8>, asn: Vec<u8>) -> Self {
        CaProfile {
            ip,
            asn,
            not_after: None,
            extra: Vec::new(),
        }
    }

    /// A CA holding 10.0.0.0/8 and AS64496.
    pub fn default_resources() -> Self {
        CaProfile::new(ipv4(&[&[10]]), asns(&[64496]))
    }
}

/// A CA (or trust anchor) certificate with its key.
pub struct Authority {
    pub name: String,
    pub ski: Vec<u8>,
    pub key: KeyPair,
    pub cert: rcgen::Certificate,
}

impl Authority {
    pub fn trust_anchor(name: &str, ski: u8) -> Authority {
        let key = KeyPair::generate().unwrap();
        let mut params = base_params(name, ski);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.custom_extensions = vec![
            ca_sia(name),
            critical(OID_IP, ipv4(&[&[10]])),
            critical(OID_AS, asns(&[64496, 64497])),
        ];
        let cert = params.self_signed(&key).unwrap();
        Authority {
            name: name.to_string(),
            ski: vec![ski; 20],
            key,
            cert,
        }
    }

    pub fn issue_ca(&self, name: &str, ski: u8, profile: CaProfile) -> Authority {
        let key = KeyPair::generate().unwrap();
        let mut params = base_params(name, ski);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.use_authority_key_identifier_extension = true;
        params.crl_distribution_points = vec![CrlDistributionPoint {
            uris: vec![self.crl_uri()],
        }];
        if let Some((y, m, d)) = profile.not_after {
            params.not_after = date_time_ymd(y, m, d);
        }
        params.custom_extensions = vec![
            aia(&self.uri()),
            ca_sia(name),
            critical(OID_IP, profile.ip),
            critical(OID_AS, profile.asn),
        ];
        params.custom_extensions.extend(profile.extra);
        let cert = params.signed_by(&key, &self.cert, &self.key).unwrap();
        Authority {
            name: name.to_string(),
            ski: vec![ski; 20],
            key,
            cert,
        }
    }

    /// An EE certificate with inherited resources for a signed object
    /// published as `object`.
    pub fn issue_ee(&self, object: &str, ski: u8) -> EndEntity {
        let key = KeyPair::generate().unwrap();
        let mut params = base_params(&format!("ee-{}", object), ski);
        params.is_ca = IsCa::ExplicitNoCa;
        params.use_authority_key_identifier_extension = true;
        params.crl_distribution_points = vec![CrlDistributionPoint {
            uris: vec![self.crl_uri()],
        }];
        params.custom_extensions = vec![
            aia(&self.uri()),
            ee_sia(&uri(object)),
            critical(OID_IP, ipv4_inherit()),
            critical(OID_AS, asns_inherit()),
        ];
        let der = params
            .signed_by(&key, &self.cert, &self.key)
            .unwrap()
            .der()
            .to_vec();
        EndEntity {
            der,
            ski: vec![ski; 20],
            key,
        }
    }

    /// CRL valid from 2023-01-01 until `next_update`, revoking `serials`.
    pub fn crl_until(&self, next_update: (i32, u8, u8), serials: &[u64]) -> Vec<u8> {
        let params = CertificateRevocationListParams {
            this_update: date_time_ymd(2023, 1, 1),
            next_update: date_time_ymd(next_update.0, next_update.1, next_update.2),
            crl_number: SerialNumber::from(1u64),
            issuing_distribution_point: None,
            revoked_certs: serials
                .iter()
                .map(|&s| RevokedCertParams {
                    serial_number: SerialNumber::from(s),
                    revocation_time: date_time_ymd(2023, 6, 1),
                    reason_code: None,
                    invalidity_date: None,
                })
                .collect(),
            key_identifier_method: KeyIdMethod::PreSpecified(self.ski.clone()),
        };
        params
            .signed_by(&self.cert, &self.key)
            .unwrap()
            .der()
            .to_vec()
    }

    pub fn crl(&self) -> Vec<u8> {
        self.crl_until((2030, 1, 1), &[])
    }

    pub fn der(&self) -> Vec<u8> {
        self.cert.der().to_vec()
    }

    pub fn spki(&self) -> Vec<u8> {
        self.key.public_key_der()
    }

    pub fn file(&self) -> String {
        format!("{}.cer", self.name)
    }

    pub fn crl_file(&self) -> String {
        format!("{}.crl", self.name)
    }

    pub fn uri(&self) -> String {
        uri(&self.file())
    }

    pub fn crl_uri(&self) -> String {
        uri(&self.crl_file())
    }
}

// CMS signed objects.

pub const CT_ROA: &str = "1.2.840.113549.1.9.16.1.24";
pub const CT_MFT: &str = "1.2.840.113549.1.9.16.1.26";
pub const CT_GBR: &str = "1.2.840.113549.1.9.16.1.35";

/// An EE certificate and the key that signs its object.
pub struct EndEntity {
    pub der: Vec<u8>,
    pub ski: Vec<u8>,
    pub key: KeyPair,
}

impl EndEntity {
    /// SignerInfo identifying this EE by SKI, with content-type and
    /// message-digest attributes over `econtent`, signed with the EE key.
    pub fn signer_info(&self, content_type: &str, econtent: &[u8]) -> Vec<u8> {
        let attrs = [
            seq(&[oid("1.2.840.113549.1.9.3"), set(&[oid(content_type)])]),
            seq(&[
                oid("1.2.840.113549.1.9.4"),
                set(&[octets(&file_hash(econtent))]),
            ]),
        ];
        let signature = self.sign(&set(&attrs));
        seq(&[
            int(3),
            tlv(0x80, &self.ski),
            seq(&[oid("2.16.840.1.101.3.4.2.1")]),
            ctx(0, &attrs.concat()),
            seq(&[oid("1.2.840.10045.4.3.2")]),
            octets(&signature),
        ])
    }

    /// ECDSA P-256 signature over `msg` with the EE key.
    pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
        use ring::signature::{EcdsaKeyPair, ECDSA_P256_SHA256_ASN1_SIGNING};
        let rng = ring::rand::SystemRandom::new();
        let pair = EcdsaKeyPair::from_pkcs8(
            &ECDSA_P256_SHA256_ASN1_SIGNING,
            &self.key.serialize_der(),
            &rng,
        )
        .unwrap();
        pair.sign(&rng, msg).unwrap().as_ref().to_vec()
    }
}

/// SignedData carrying `econtent` and the EE certificate, with the given
/// SignerInfos.
pub fn envelope(
    content_type: &str,
    econtent: &[u8],
    ee: &EndEntity,
    signer_infos: &[Vec<u8>],
) -> Vec<u8> {
    let sd = seq(&[
        int(3),
        set(&[seq(&[oid("2.16.840.1.101.3.4.2.1")])]),
        seq(&[oid(content_type), ctx(0, &octets(econtent))]),
        ctx(0, &ee.der),
        set(signer_infos),
    ]);
    seq(&[oid("1.2.840.113549.1.7.2"), ctx(0, &sd)])
}

fn signed_data(content_type: &str, econtent: &[u8], ee: &EndEntity) -> Vec<u8> {
    let info = ee.signer_info(content_type, econtent);
    envelope(content_type, econtent, ee, &[info])
}

/// ROA eContent for `asid` over IPv4 prefixes `(bytes, maxLength)`.
pub fn roa_content(asid: u64, v4: &[(&[u8], u64)]) -> Vec<u8> {
    let addrs: Vec<Vec<u8>> = v4
        .iter()
        .map(|(b, max)| seq(&[bits(0, b), int(*max)]))
        .collect();
    seq(&[int(asid), seq(&[seq(&[octets(&[0, 1]), seq(&addrs)])])])
}

pub fn roa(ee: &EndEntity, asid: u64, v4: &[(&[u8], u64)]) -> Vec<u8> {
    signed_data(CT_ROA, &roa_content(asid, v4), ee)
}

/// Manifest listing `(file, sha256)` entries, valid between two
/// GeneralizedTime strings.
pub fn manifest(ee: &EndEntity, entries: &[(&str, Vec<u8>)], this: &str, next: &str) -> Vec<u8> {
    let list: Vec<Vec<u8>> = entries
        .iter()
        .map(|(f, h)| seq(&[ia5(f), bits(0, h)]))
        .collect();
    let content = seq(&[
        int(1),
        gentime(this),
        gentime(next),
        oid("2.16.840.1.101.3.4.2.1"),
        seq(&list),
    ]);
    signed_data(CT_MFT, &content, ee)
}

pub fn ghostbuster(ee: &EndEntity, vcard: &str) -> Vec<u8> {
    signed_data(CT_GBR, vcard.as_bytes(), ee)
}

/// A repository on disk: `rsync://example.net/repo/<file>` lives at
/// `<root>/valid/example.net/repo/<file>`.
pub struct Repo {
    dir: TempDir,
}

impl Repo {
    pub fn new() -> Repo {
        let repo = Repo {
            dir: TempDir::new().unwrap(),
        };
        std::fs::create_dir_all(repo.objects()).unwrap();
        repo
    }

    pub fn base(&self) -> PathBuf {
        self.dir.path().join("valid")
    }

    pub fn objects(&self) -> PathBuf {
        self.base().join(HOST_DIR)
    }

    pub fn write(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.objects().join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    pub fn remove(&self, name: &str) {
        std::fs::remove_file(self.objects().join(name)).unwrap();
    }

    /// Store a trust anchor where file mode looks for it.
    pub fn write_ta(&self, tal_name: &str, ta: &Authority) -> PathBuf {
        let dir = self.base().join("ta").join(tal_name);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(ta.file());
        std::fs::write(&path, ta.der()).unwrap();
        path
    }

    pub fn config(&self) -> ValidatorConfig {
        ValidatorConfig {
            at_time: Some(NOW),
            aia_base: self.base(),
            ..ValidatorConfig::default()
        }
    }

    /// Registration of repository 1 rooted at the validated tree.
    pub fn registration(&self) -> Entity {
        Entity::new(RType::Repo, path_str(&self.base())).with_repo(1, None)
    }
}

pub fn path_str(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

/// An object entity in repository 1.
pub fn entity(rtype: RType, file: &str) -> Entity {
    Entity::new(rtype, file).with_repo(1, Some(HOST_DIR))
}

/// TAL text for `ta` published at its rsync URI.
pub fn tal_text(ta: &Authority) -> String {
    let key = base64::engine::general_purpose::STANDARD.encode(ta.spki());
    format!("# test TAL\n{}\n\n{}\n", ta.uri(), key)
}
