//! Repository registrations and file path resolution.

use std::collections::HashMap;

use crate::RpkiError;

/// Where a repository's files live: the primary (freshly fetched) location
/// and the previously validated copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repo {
    pub path: Option<String>,
    pub validpath: Option<String>,
}

#[derive(Debug, Default)]
pub struct RepoTable {
    repos: HashMap<u32, Repo>,
}

impl RepoTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        id: u32,
        path: Option<String>,
        validpath: Option<String>,
    ) -> Result<(), RpkiError> {
        if self.repos.contains_key(&id) {
            return Err(RpkiError::Fatal(format!("repository {} registered twice", id)));
        }
        self.repos.insert(id, Repo { path, validpath });
        Ok(())
    }

    pub fn get(&self, id: u32) -> Option<&Repo> {
        self.repos.get(&id)
    }

    /// Build the on-disk path of `file` in repository `repoid`.
    ///
    /// `path` is the object's directory inside the repository. The primary
    /// location is the repository path (falling back to the valid path if
    /// the repository has none); `want_alt` selects the valid path. Unknown
    /// repositories resolve relative to `path` alone, and `None` means the
    /// requested location does not exist.
    pub fn filepath(
        &self,
        repoid: u32,
        path: Option<&str>,
        file: &str,
        want_alt: bool,
    ) -> Option<String> {
        let repo = match self.repos.get(&repoid) {
            Some(r) => r,
            None => {
                if want_alt {
                    return None;
                }
                return Some(join(path, file));
            }
        };

        let base = if want_alt {
            repo.validpath.as_deref()?
        } else {
            match repo.path.as_deref().or(repo.validpath.as_deref()) {
                Some(p) => p,
                None => return Some(join(path, file)),
            }
        };
        Some(match path {
            Some(p) => format!("{}/{}/{}", base, p, file),
            None => format!("{}/{}", base, file),
        })
    }
}

fn join(path: Option<&str>, file: &str) -> String {
    match path {
        Some(p) => format!("{}/{}", p, file),
        None => file.to_string(),
    }
}
