// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Repository bootstrap.
//!
//! Decide, once at startup, whether to open an existing repository or to
//! initialize a fresh one at the configured path. Only a path that is either
//! missing or free of repository metadata gets initialized. Anything else
//! that goes wrong while opening is fatal, so existing history is never
//! clobbered by a second initialization.

use crate::repo::{Git2Backend, RepoError};

use std::path::Path;
use tracing::{info, instrument};

/// How the repository handle came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Existing repository was opened.
    Opened,

    /// New repository was initialized.
    Initialized,
}

/// Produce the one repository handle used for the rest of the process.
///
/// # Errors
///
/// - Return [`BootstrapError::Open`] if the path exists but cannot be opened
///   as a repository for any reason other than missing metadata.
/// - Return [`BootstrapError::Init`] if a new repository cannot be created.
#[instrument(skip(path), level = "debug")]
pub fn resolve(path: impl AsRef<Path>) -> Result<(Git2Backend, Resolution)> {
    let path = path.as_ref();
    if let Some(backend) = probe(path)? {
        info!("repository found at {}", path.display());
        return Ok((backend, Resolution::Opened));
    }

    info!("repository not found, initializing at {}", path.display());
    let backend = Git2Backend::init(path).map_err(BootstrapError::Init)?;

    Ok((backend, Resolution::Initialized))
}

fn probe(path: &Path) -> Result<Option<Git2Backend>> {
    match path.try_exists() {
        Ok(false) => return Ok(None),
        Ok(true) => {}
        Err(error) => return Err(BootstrapError::Inaccessible(error)),
    }

    match Git2Backend::open(path) {
        Ok(backend) => Ok(Some(backend)),
        Err(RepoError::NotFound(_)) => Ok(None),
        Err(error) => Err(BootstrapError::Open(error)),
    }
}

/// All possible error types for repository bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Existence of the path cannot be determined.
    #[error("cannot access repository path: {0}")]
    Inaccessible(#[source] std::io::Error),

    /// Path holds something that cannot be opened as a repository.
    #[error("cannot open repository: {0}")]
    Open(#[source] RepoError),

    /// Fresh repository cannot be initialized.
    #[error("cannot initialize repository: {0}")]
    Init(#[source] RepoError),
}

/// Friendly result alias :3
type Result<T, E = BootstrapError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Identity, repo::Backend};
    use chrono::DateTime;
    use git2::Repository;
    use pretty_assertions::assert_eq;
    use std::fs::{create_dir, write};
    use tempfile::TempDir;

    #[test]
    fn resolve_initializes_missing_path() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("journal");

        let (_, resolution) = resolve(&path)?;
        assert_eq!(resolution, Resolution::Initialized);
        assert!(path.join(".git").is_dir());

        Ok(())
    }

    #[test]
    fn resolve_initializes_plain_directory() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(dir.path().join("existing.txt"), "left alone")?;

        let (backend, resolution) = resolve(dir.path())?;
        assert_eq!(resolution, Resolution::Initialized);
        assert!(!backend.is_clean()?);

        Ok(())
    }

    #[test]
    fn resolve_opens_existing_repository_without_touching_history() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let (backend, _) = resolve(dir.path())?;
        let identity = Identity::new("John Doe", "john@doe.com")?;
        let when = DateTime::parse_from_rfc3339("2025-03-01T12:00:00Z")?;

        write(dir.path().join("a.txt"), "a")?;
        backend.stage_all()?;
        let oid = backend.commit(&identity, when, "2025-03-01T12:00:00Z")?;
        drop(backend);

        let (backend, resolution) = resolve(dir.path())?;
        assert_eq!(resolution, Resolution::Opened);
        let head = backend.repository().head()?.peel_to_commit()?;
        assert_eq!(head.id(), oid);
        assert_eq!(backend.find_commit(oid)?.message, "2025-03-01T12:00:00Z");

        Ok(())
    }

    #[test]
    fn resolve_fails_on_bare_repository() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        Repository::init_bare(dir.path())?;

        let result = resolve(dir.path());
        assert!(matches!(result, Err(BootstrapError::Open(RepoError::Bare(_)))));

        Ok(())
    }

    #[test]
    fn resolve_fails_on_corrupt_metadata() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let gitdir = dir.path().join(".git");
        create_dir(&gitdir)?;
        create_dir(gitdir.join("objects"))?;
        create_dir(gitdir.join("refs"))?;
        write(gitdir.join("HEAD"), "ref: refs/heads/main\n")?;
        write(gitdir.join("config"), "[core\n\trepositoryformatversion = = =\n")?;

        let result = resolve(dir.path());
        assert!(matches!(result, Err(BootstrapError::Open(_))));

        Ok(())
    }
}
