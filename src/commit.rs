// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Commit-if-dirty snapshot operation.
//!
//! Stage the whole working tree, and record a commit only when staging left
//! something different from the last commit. Running it twice in a row with
//! no change on disk yields one commit and one no-op.

use crate::{
    config::Identity,
    repo::{Backend, CommitRecord, RepoError},
};

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use tracing::{info, instrument};

/// Render snapshot message for a given moment.
///
/// Always UTC in RFC 3339 with second precision, e.g. `2025-03-01T10:00:00Z`,
/// so messages sort the same way their timestamps do.
pub fn commit_message(when: DateTime<FixedOffset>) -> String {
    when.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Stage all changes and commit them if the working tree is dirty.
///
/// Returns `None` when there was nothing to commit.
///
/// # Errors
///
/// - Return [`CommitError::Stage`] if staging fails.
/// - Return [`CommitError::Status`] if working tree status cannot be read.
/// - Return [`CommitError::Commit`] if the commit cannot be created or read
///   back. Staged content is left in the index for the next attempt.
#[instrument(skip(backend, identity), level = "debug")]
pub fn commit_if_dirty<B>(
    backend: &B,
    identity: &Identity,
    when: DateTime<FixedOffset>,
) -> Result<Option<CommitRecord>>
where
    B: Backend + ?Sized,
{
    backend.stage_all().map_err(CommitError::Stage)?;

    if backend.is_clean().map_err(CommitError::Status)? {
        info!("nothing to commit");
        return Ok(None);
    }

    info!("committing changes");
    let message = commit_message(when);
    let oid = backend
        .commit(identity, when, &message)
        .map_err(CommitError::Commit)?;
    let record = backend.find_commit(oid).map_err(CommitError::Commit)?;
    info!("recorded {} as {}", record.message, record.id);

    Ok(Some(record))
}

/// All possible error types for a single snapshot attempt.
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    /// Working tree changes cannot be staged.
    #[error("failed to stage changes: {0}")]
    Stage(#[source] RepoError),

    /// Working tree status cannot be queried.
    #[error("failed to query status: {0}")]
    Status(#[source] RepoError),

    /// Commit cannot be created.
    #[error("failed to create commit: {0}")]
    Commit(#[source] RepoError),
}

/// Friendly result alias :3
type Result<T, E = CommitError> = std::result::Result<T, E>;
