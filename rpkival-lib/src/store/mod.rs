//! Process-lifetime indexes of validated state.
//!
//! All four tables are append-only: entries are added as objects validate
//! and live until the worker exits.

mod auth;
mod crl;
mod repo;
mod uri;

pub use auth::{Ancestors, Auth, AuthId, AuthTree};
pub use crl::CrlTree;
pub use repo::{Repo, RepoTable};
pub use uri::UriIndex;

#[cfg(test)]
pub(crate) use auth::testutil;
