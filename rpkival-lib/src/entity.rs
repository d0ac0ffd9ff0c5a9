//! Work items received from the parent process and the responses sent back.
//!
//! Both are exchanged as one JSON document per line; binary payloads are
//! base64-encoded.

use serde::{Deserialize, Serialize};

use crate::object::{Cert, Crl, Gbr, Mft, Roa, Tal};
use crate::util;

/// Kind of a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RType {
    Tal,
    Repo,
    Cer,
    Mft,
    Roa,
    Crl,
    Gbr,
    File,
}

impl RType {
    /// Object type implied by a file name's extension.
    pub fn from_filename(name: &str) -> Option<RType> {
        let ext = name.rsplit_once('.').map(|(_, e)| e)?;
        match ext {
            "cer" => Some(RType::Cer),
            "crl" => Some(RType::Crl),
            "mft" => Some(RType::Mft),
            "roa" => Some(RType::Roa),
            "gbr" => Some(RType::Gbr),
            "tal" => Some(RType::Tal),
            _ => None,
        }
    }
}

/// One unit of work.
///
/// For `repo` items, `file` is the validated-tree path and `path` the
/// primary path of the repository `repoid`. For everything else `file` is
/// relative to the repository's directory and `data` may carry extra input:
/// the TAL text for `tal`, the trust anchor public key for a root `cer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub rtype: RType,
    #[serde(default)]
    pub repoid: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub file: String,
    #[serde(default, with = "util::base64_opt", skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub talid: Option<usize>,
}

impl Entity {
    pub fn new(rtype: RType, file: impl Into<String>) -> Self {
        Entity {
            rtype,
            repoid: 0,
            path: None,
            file: file.into(),
            data: None,
            talid: None,
        }
    }

    pub fn with_repo(mut self, repoid: u32, path: Option<&str>) -> Self {
        self.repoid = repoid;
        self.path = path.map(str::to_string);
        self
    }

    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_talid(mut self, talid: usize) -> Self {
        self.talid = Some(talid);
        self
    }
}

/// The validated object carried by a response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Object {
    Tal(Tal),
    Cert(Cert),
    Crl(Crl),
    Mft(Mft),
    Roa(Roa),
    Gbr(Gbr),
}

/// Result of processing one entity, emitted in input order.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    #[serde(rename = "type")]
    pub rtype: RType,
    pub repoid: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub talid: Option<usize>,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<Object>,
}

impl Response {
    pub(crate) fn for_entity(entity: &Entity, file: String) -> Self {
        Response {
            rtype: entity.rtype,
            repoid: entity.repoid,
            talid: entity.talid,
            file,
            valid: None,
            object: None,
        }
    }
}
