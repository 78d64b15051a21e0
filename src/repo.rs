// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Repository backend.
//!
//! The scheduler never talks to libgit2 directly. Instead it goes through the
//! [`Backend`] trait, which exposes the handful of operations needed to take
//! a snapshot of a working tree: stage everything, check whether anything
//! changed, and record a commit. [`Git2Backend`] is the real implementation.

use crate::config::Identity;

use chrono::{DateTime, FixedOffset};
use git2::{
    ErrorCode, IndexAddOption, IndexMatchedPath, Oid, Repository, RepositoryInitOptions,
    Signature, Status, StatusOptions, Time,
};
use std::path::Path;
use tracing::{debug, instrument};

/// Commit produced by a successful snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Unique commit identifier.
    pub id: Oid,

    /// Who made the change.
    pub author: Identity,

    /// When the change was made.
    pub author_time: DateTime<FixedOffset>,

    /// Who recorded the change.
    pub committer: Identity,

    /// When the change was recorded.
    pub commit_time: DateTime<FixedOffset>,

    /// Full commit message.
    pub message: String,
}

/// Layer of indirection for repository access.
pub trait Backend: Send + 'static {
    /// Path to the working tree being tracked.
    fn work_dir(&self) -> &Path;

    /// Stage additions, modifications, and deletions of the entire working tree.
    fn stage_all(&self) -> Result<()>;

    /// Check if the working tree has no differences from the last commit.
    fn is_clean(&self) -> Result<bool>;

    /// Commit currently staged content on top of HEAD.
    fn commit(&self, identity: &Identity, when: DateTime<FixedOffset>, message: &str)
        -> Result<Oid>;

    /// Look up commit by its identifier.
    fn find_commit(&self, id: Oid) -> Result<CommitRecord>;
}

/// Repository access through libgit2.
pub struct Git2Backend {
    repository: Repository,
}

impl Git2Backend {
    /// Open existing non-bare repository at target path.
    ///
    /// Does not search parent directories for a repository.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::NotFound`] if path holds no repository metadata.
    /// - Return [`RepoError::Bare`] if repository has no working tree.
    /// - Return [`RepoError::Git2`] if libgit2 fails to open the repository.
    #[instrument(skip(path), level = "debug")]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        debug!("open repository: {:?}", path.as_ref().display());
        let repository = Repository::open(path.as_ref()).map_err(|error| {
            if error.code() == ErrorCode::NotFound {
                RepoError::NotFound(path.as_ref().display().to_string())
            } else {
                RepoError::Git2(error)
            }
        })?;

        Self::try_from(repository)
    }

    /// Initialize new non-bare repository at target path.
    ///
    /// Creates the target path and any missing parents.
    ///
    /// # Errors
    ///
    /// - Return [`RepoError::Git2`] if libgit2 fails to initialize the
    ///   repository.
    #[instrument(skip(path), level = "debug")]
    pub fn init(path: impl AsRef<Path>) -> Result<Self> {
        debug!("initialize repository: {:?}", path.as_ref().display());
        let mut opts = RepositoryInitOptions::new();
        opts.bare(false).mkpath(true);
        let repository = Repository::init_opts(path.as_ref(), &opts)?;

        Self::try_from(repository)
    }

    /// Borrow underlying libgit2 repository.
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    fn is_nested_repository(&self, path: &Path) -> bool {
        !path.as_os_str().is_empty() && self.work_dir().join(path).join(".git").exists()
    }

    fn head_commit(&self) -> Result<Option<git2::Commit<'_>>> {
        match self.repository.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(error) if error.code() == ErrorCode::UnbornBranch => Ok(None),
            Err(error) if error.code() == ErrorCode::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }
}

impl TryFrom<Repository> for Git2Backend {
    type Error = RepoError;

    fn try_from(repository: Repository) -> Result<Self> {
        if repository.workdir().is_none() {
            return Err(RepoError::Bare(
                repository.path().display().to_string(),
            ));
        }

        Ok(Self { repository })
    }
}

impl std::fmt::Debug for Git2Backend {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt.debug_struct("Git2Backend")
            .field("path", &self.repository.path())
            .finish()
    }
}

impl Backend for Git2Backend {
    fn work_dir(&self) -> &Path {
        // INVARIANT: Bare repositories are rejected on construction.
        self.repository
            .workdir()
            .unwrap_or_else(|| self.repository.path())
    }

    #[instrument(skip(self), level = "debug")]
    fn stage_all(&self) -> Result<()> {
        let mut index = self.repository.index()?;
        let mut skip_nested = |path: &Path, _: &[u8]| -> i32 {
            if self.is_nested_repository(path) {
                debug!("skip nested repository {:?}", path.display());
                return 1;
            }

            0
        };

        // INVARIANT: add_all picks up new and modified files, update_all
        //   drops entries whose files are gone.
        index.add_all(
            ["*"].iter(),
            IndexAddOption::DEFAULT,
            Some(&mut skip_nested as &mut IndexMatchedPath<'_>),
        )?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;
        debug!("staged {} index entries", index.len());

        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    fn is_clean(&self) -> Result<bool> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false)
            .exclude_submodules(true);
        let statuses = self.repository.statuses(Some(&mut opts))?;
        debug!("{} status entries", statuses.len());

        // INVARIANT: Nested repositories are never staged, so they do not
        //   count as changes.
        let clean = statuses.iter().all(|entry| {
            entry.status() == Status::WT_NEW
                && entry
                    .path()
                    .is_some_and(|path| self.is_nested_repository(Path::new(path)))
        });

        Ok(clean)
    }

    #[instrument(skip(self, identity, message), level = "debug")]
    fn commit(
        &self,
        identity: &Identity,
        when: DateTime<FixedOffset>,
        message: &str,
    ) -> Result<Oid> {
        let time = Time::new(when.timestamp(), when.offset().local_minus_utc() / 60);
        let signature = Signature::new(identity.name(), identity.email(), &time)?;

        // INVARIANT: Always use new tree produced by index after staging.
        let mut index = self.repository.index()?;
        let tree_oid = index.write_tree()?;
        let tree = self.repository.find_tree(tree_oid)?;

        // INVARIANT: First commit of an unborn branch has no parents.
        let parents = self.head_commit()?.into_iter().collect::<Vec<_>>();
        let parents = parents.iter().collect::<Vec<_>>();

        let oid = self.repository.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;
        debug!("created commit {oid}");

        Ok(oid)
    }

    fn find_commit(&self, id: Oid) -> Result<CommitRecord> {
        let commit = self.repository.find_commit(id)?;
        let (author, author_time) = signature_parts(&commit.author())?;
        let (committer, commit_time) = signature_parts(&commit.committer())?;

        Ok(CommitRecord {
            id,
            author,
            author_time,
            committer,
            commit_time,
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
        })
    }
}

fn signature_parts(signature: &Signature<'_>) -> Result<(Identity, DateTime<FixedOffset>)> {
    let name = String::from_utf8_lossy(signature.name_bytes()).into_owned();
    let email = String::from_utf8_lossy(signature.email_bytes()).into_owned();
    let identity = Identity::new(name, email).map_err(|_| RepoError::Signature)?;

    let time = signature.when();
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60).ok_or(RepoError::Signature)?;
    let when = DateTime::from_timestamp(time.seconds(), 0)
        .ok_or(RepoError::Signature)?
        .with_timezone(&offset);

    Ok((identity, when))
}

/// All possible error types for repository interaction.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Path does not contain any repository metadata.
    #[error("no repository found at {0:?}")]
    NotFound(String),

    /// Repository has no working tree to snapshot.
    #[error("repository at {0:?} is bare")]
    Bare(String),

    /// Commit signature cannot be represented as an identity.
    #[error("commit signature is malformed")]
    Signature,

    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),
}

/// Friendly result alias :3
pub type Result<T, E = RepoError> = std::result::Result<T, E>;
