//! The object validator.
//!
//! A [`Validator`] consumes [`Entity`] work items one at a time and keeps the
//! validated state (certificate tree, CRLs, URI cache, repositories) in a
//! [`Context`] for the lifetime of the process. Each object moves through
//! fetch, parse, issuer location, X.509 verification, RPKI content rules and
//! expiry computation; any failure drops that object only.

mod aia;
mod cert;
mod expiry;
mod file;
mod signed;

use std::path::Path;

use tracing::{debug, warn};

use crate::config::ValidatorConfig;
use crate::entity::{Entity, Object, RType, Response};
use crate::loader::{FileLoader, FsLoader};
use crate::object::{DerDecoder, Decoder, KeyId, Tal};
use crate::resources::Resources;
use crate::store::{AuthId, AuthTree, CrlTree, RepoTable, UriIndex};
use crate::verify::{crl_set, trusted_chain, PathVerifier, VerifyRequest, X509PathVerifier};
use crate::RpkiError;

pub use file::{FileReport, Status};

/// All validated state, owned by one validator.
#[derive(Debug, Default)]
pub struct Context {
    pub auths: AuthTree,
    pub crls: CrlTree,
    pub uris: UriIndex,
    pub repos: RepoTable,
}

pub struct Validator {
    config: ValidatorConfig,
    ctx: Context,
    tals: Vec<Tal>,
    decoder: Box<dyn Decoder>,
    verifier: Box<dyn PathVerifier>,
    loader: Box<dyn FileLoader>,
}

impl Validator {
    /// A validator with the built-in decoder, RPKI path verifier and
    /// filesystem loader.
    pub fn new(config: ValidatorConfig) -> Self {
        Validator {
            config,
            ctx: Context::default(),
            tals: Vec::new(),
            decoder: Box::new(DerDecoder),
            verifier: Box::new(X509PathVerifier::default()),
            loader: Box::new(FsLoader),
        }
    }

    pub fn with_decoder(mut self, decoder: Box<dyn Decoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_verifier(mut self, verifier: Box<dyn PathVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn with_loader(mut self, loader: Box<dyn FileLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Trust anchor locators loaded with [`Validator::load_tal`].
    pub fn tals(&self) -> &[Tal] {
        &self.tals
    }

    /// Process one work item.
    ///
    /// Repository registrations produce no response. Per-object failures are
    /// logged and reported through the response; only fatal errors are
    /// returned as `Err`.
    pub fn handle(&mut self, entity: Entity) -> Result<Option<Response>, RpkiError> {
        debug!(rtype = ?entity.rtype, file = %entity.file, "processing entity");
        match entity.rtype {
            RType::Repo => {
                self.ctx
                    .repos
                    .add(entity.repoid, entity.path, Some(entity.file))?;
                return Ok(None);
            }
            RType::File => {
                return Err(RpkiError::Fatal(format!(
                    "{}: unhandled entity type",
                    entity.file
                )));
            }
            RType::Tal => return self.handle_tal(&entity).map(Some),
            _ => {}
        }

        let (file, data) = match self.load_with_fallback(
            entity.repoid,
            entity.path.as_deref(),
            &entity.file,
        ) {
            Ok(v) => v,
            Err(e) => {
                settle::<()>(&entity.file, Err(e))?;
                let mut resp = Response::for_entity(&entity, entity.file.clone());
                resp.valid = Some(false);
                return Ok(Some(resp));
            }
        };

        let mut resp = Response::for_entity(&entity, file.clone());
        match entity.rtype {
            RType::Cer => {
                let r = match entity.data.as_deref() {
                    Some(pkey) => self.proc_root_cert(&file, &data, pkey, entity.talid.unwrap_or(0)),
                    None => self.proc_cert(&file, &data),
                };
                let cert = settle(&file, r)?;
                resp.valid = Some(cert.is_some());
                if let Some(c) = cert {
                    resp.talid = c.talid;
                    resp.object = Some(Object::Cert(c));
                }
            }
            RType::Crl => {
                let r = self.proc_crl(&file, &data);
                resp.valid = Some(settle(&file, r)?.is_some());
            }
            RType::Mft => {
                let r = self.proc_mft(&file, &data, entity.repoid, entity.path.as_deref());
                let mft = settle(&file, r)?;
                resp.valid = Some(mft.as_ref().map_or(false, |m| m.valid));
                resp.object = mft.map(Object::Mft);
            }
            RType::Roa => {
                let r = self.proc_roa(&file, &data);
                let roa = settle(&file, r)?;
                resp.valid = Some(roa.is_some());
                if let Some(roa) = roa {
                    resp.talid = roa.talid;
                    resp.object = Some(Object::Roa(roa));
                }
            }
            RType::Gbr => {
                let r = self.proc_gbr(&file, &data);
                let gbr = settle(&file, r)?;
                resp.valid = Some(gbr.is_some());
                resp.object = gbr.map(Object::Gbr);
            }
            RType::Tal | RType::Repo | RType::File => {
                return Err(RpkiError::Fatal(format!(
                    "{}: unhandled entity type",
                    entity.file
                )));
            }
        }
        Ok(Some(resp))
    }

    fn handle_tal(&self, entity: &Entity) -> Result<Response, RpkiError> {
        let mut resp = Response::for_entity(entity, entity.file.clone());
        let data = entity.data.as_deref().unwrap_or_default();
        let r = self.decoder.tal(&entity.file, data).map(|mut tal| {
            tal.id = entity.talid;
            tal
        });
        let tal = settle(&entity.file, r)?;
        resp.valid = Some(tal.is_some());
        resp.object = tal.map(Object::Tal);
        Ok(resp)
    }

    pub(crate) fn now(&self) -> i64 {
        self.config.now()
    }

    /// Load `file` from the repository's primary location, retrying the
    /// validated location if it is missing.
    pub(crate) fn load_with_fallback(
        &self,
        repoid: u32,
        path: Option<&str>,
        file: &str,
    ) -> Result<(String, Vec<u8>), RpkiError> {
        let primary = self
            .ctx
            .repos
            .filepath(repoid, path, file, false)
            .ok_or_else(|| RpkiError::NotFound(file.to_string()))?;
        match self.loader.load_file(Path::new(&primary)) {
            Ok(data) => Ok((primary, data)),
            Err(RpkiError::NotFound(_)) => {
                let alt = self
                    .ctx
                    .repos
                    .filepath(repoid, path, file, true)
                    .ok_or(RpkiError::NotFound(primary))?;
                let data = self.loader.load_file(Path::new(&alt))?;
                Ok((alt, data))
            }
            Err(e) => Err(e),
        }
    }

    /// Check that an object's SKI is not registered yet and its AKI names a
    /// validated authority.
    pub(crate) fn valid_ski_aki(&self, ski: &KeyId, aki: &KeyId) -> Result<AuthId, RpkiError> {
        if self.ctx.auths.find(ski).is_some() {
            return Err(RpkiError::ChainError(format!(
                "RFC 6487: re-registering SKI {}",
                ski
            )));
        }
        self.ctx
            .auths
            .find(aki)
            .ok_or_else(|| RpkiError::ChainError(format!("RFC 6487: unknown AKI {}", aki)))
    }

    /// Verify `der` against the trusted chain above `issuer`.
    pub(crate) fn valid_x509(
        &self,
        der: &[u8],
        issuer: Option<AuthId>,
        crl_check: bool,
    ) -> Result<(), RpkiError> {
        let chain = trusted_chain(&self.ctx.auths, issuer);
        let crls = crl_set(&self.ctx.crls, &self.ctx.auths, issuer);
        let req = VerifyRequest {
            target: der,
            chain: &chain,
            crls: &crls,
            crl_check,
            max_depth: self.config.max_cert_depth,
            now: self.now(),
            check_time: self.config.check_time,
        };
        let verdict = self.verifier.verify(&req);
        match verdict.error {
            None => Ok(()),
            Some(e) => Err(RpkiError::VerifyError(e.as_str().to_string())),
        }
    }

    /// Resources of `issuer` and each of its ancestors, nearest first.
    pub(crate) fn issuer_resources(&self, issuer: AuthId) -> Vec<&Resources> {
        self.ctx
            .auths
            .ancestors(issuer)
            .map(|a| &a.cert.resources)
            .collect()
    }

    pub(crate) fn talid_of(&self, issuer: AuthId) -> Option<usize> {
        self.ctx.auths.get(issuer).and_then(|a| a.cert.talid)
    }
}

/// Log a per-object failure and turn it into `None`; pass fatal errors up.
fn settle<T>(file: &str, r: Result<T, RpkiError>) -> Result<Option<T>, RpkiError> {
    match r {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!("{}: {}", file, e);
            Ok(None)
        }
    }
}
