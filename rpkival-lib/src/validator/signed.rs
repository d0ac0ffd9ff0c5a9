//! CRLs and CMS signed objects: manifests, ROAs and ghostbuster records.

use tracing::{debug, warn};

use super::expiry::find_expires;
use super::Validator;
use crate::hash::hash_matches;
use crate::object::{Gbr, Mft, Roa, Signed};
use crate::resources::{check_resources, roa_covered};
use crate::store::AuthId;
use crate::util::valid_filename;
use crate::RpkiError;

impl Validator {
    pub(crate) fn proc_crl(&mut self, file: &str, der: &[u8]) -> Result<(), RpkiError> {
        let crl = self.decoder.crl(der)?;
        debug!(aki = %crl.aki, "{}: storing CRL", file);
        self.ctx.crls.insert(crl)
    }

    /// Verify the EE certificate of a signed object against its issuer and
    /// fill in the transitive expiry.
    fn valid_signed(&self, signed: &mut Signed, crl_check: bool) -> Result<AuthId, RpkiError> {
        let issuer = self.valid_ski_aki(&signed.ski, &signed.aki)?;
        self.valid_x509(&signed.ee.der, Some(issuer), crl_check)?;
        check_resources(&signed.ee.resources, &self.issuer_resources(issuer))?;
        signed.expires = find_expires(signed.not_after, &self.ctx, Some(issuer));
        Ok(issuer)
    }

    pub(crate) fn proc_roa(&mut self, file: &str, der: &[u8]) -> Result<Roa, RpkiError> {
        let mut roa = self.decoder.roa(der)?;
        let issuer = self.valid_signed(&mut roa.signed, true)?;
        roa.talid = self.talid_of(issuer);
        roa.valid = roa_covered(
            &roa.prefixes,
            &roa.signed.ee.resources,
            &self.issuer_resources(issuer),
        );
        if !roa.valid {
            warn!("{}: RFC 6482: prefixes not covered by EE resources", file);
        }
        Ok(roa)
    }

    /// Validate a manifest and check the hash of every file it lists.
    ///
    /// The manifest's EE certificate is not checked against the CRL: the
    /// CRL itself is one of the files the manifest vouches for.
    pub(crate) fn proc_mft(
        &mut self,
        file: &str,
        der: &[u8],
        repoid: u32,
        path: Option<&str>,
    ) -> Result<Mft, RpkiError> {
        let mut mft = self.decoder.mft(der)?;
        self.valid_signed(&mut mft.signed, false)?;
        mft.repoid = repoid;
        mft.path = path.map(str::to_string);

        if self.is_stale(&mft) {
            warn!("{}: stale manifest", file);
            mft.stale = true;
            mft.valid = true;
            return Ok(mft);
        }

        let failed = self.check_mft_files(&mft);
        for name in &failed {
            warn!("{}: manifest check failed for {}", file, name);
        }
        mft.valid = failed.is_empty();
        Ok(mft)
    }

    /// Past its nextUpdate. Never true when time checks are disabled.
    pub(crate) fn is_stale(&self, mft: &Mft) -> bool {
        self.config.check_time && mft.next_update < self.now()
    }

    /// Names of listed files that are disallowed, unreadable or whose
    /// content does not match. Every entry is checked.
    fn check_mft_files(&self, mft: &Mft) -> Vec<String> {
        mft.files
            .iter()
            .filter(|entry| {
                if !valid_filename(&entry.file) {
                    return true;
                }
                match self.load_with_fallback(mft.repoid, mft.path.as_deref(), &entry.file) {
                    Ok((_, data)) => !hash_matches(&data, &entry.hash),
                    Err(_) => true,
                }
            })
            .map(|entry| entry.file.clone())
            .collect()
    }

    pub(crate) fn proc_gbr(&mut self, _file: &str, der: &[u8]) -> Result<Gbr, RpkiError> {
        let mut gbr = self.decoder.gbr(der)?;
        self.valid_signed(&mut gbr.signed, true)?;
        gbr.valid = true;
        Ok(gbr)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::collections::HashMap;
    use std::path::Path;

    use super::*;
    use crate::hash::file_hash;
    use crate::loader::FileLoader;
    use crate::object::{signed::dummy_for_test, MftFile};
    use crate::ValidatorConfig;

    struct MapLoader(HashMap<String, Vec<u8>>);

    impl FileLoader for MapLoader {
        fn load_file(&self, path: &Path) -> Result<Vec<u8>, RpkiError> {
            let key = path.to_string_lossy().into_owned();
            self.0.get(&key).cloned().ok_or(RpkiError::NotFound(key))
        }
    }

    fn manifest(files: Vec<MftFile>) -> Mft {
        Mft {
            signed: dummy_for_test(),
            number: vec![1],
            this_update: 0,
            next_update: 100,
            files,
            stale: false,
            repoid: 0,
            path: Some("repo".into()),
            valid: false,
        }
    }

    #[test]
    fn checks_every_listed_file() {
        let mut files = HashMap::new();
        files.insert("repo/a.roa".to_string(), b"aaa".to_vec());
        files.insert("repo/b.roa".to_string(), b"bbb".to_vec());
        let v = Validator::new(ValidatorConfig::default())
            .with_loader(Box::new(MapLoader(files)));

        let mft = manifest(vec![
            MftFile { file: "a.roa".into(), hash: file_hash(b"aaa") },
            MftFile { file: "b.roa".into(), hash: file_hash(b"not b") },
            MftFile { file: "../x.roa".into(), hash: file_hash(b"") },
            MftFile { file: "gone.crl".into(), hash: file_hash(b"") },
        ]);
        assert_eq!(v.check_mft_files(&mft), vec!["b.roa", "../x.roa", "gone.crl"]);

        let ok = manifest(vec![MftFile { file: "a.roa".into(), hash: file_hash(b"aaa") }]);
        assert!(v.check_mft_files(&ok).is_empty());
    }

    #[test]
    fn staleness_follows_time_checking() {
        let mft = manifest(vec![]);
        let late = ValidatorConfig {
            at_time: Some(1000),
            ..ValidatorConfig::default()
        };
        assert!(Validator::new(late.clone()).is_stale(&mft));

        let unchecked = ValidatorConfig {
            check_time: false,
            ..late
        };
        assert!(!Validator::new(unchecked).is_stale(&mft));

        let early = ValidatorConfig {
            at_time: Some(50),
            ..ValidatorConfig::default()
        };
        assert!(!Validator::new(early).is_stale(&mft));
    }
}
