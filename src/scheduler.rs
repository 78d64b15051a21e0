// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Commit scheduler.
//!
//! The scheduler owns the repository handle and a repeating timer. On every
//! tick it runs [`commit_if_dirty`] to completion, and between ticks it waits
//! on whichever comes first: the next tick, or cancellation.
//!
//! # Ordering
//!
//! Cancellation is cooperative. A tick whose snapshot is already in flight
//! finishes normally, but once the token is cancelled no further tick is
//! processed, even one that is already due. Slow snapshots never pile up
//! ticks: at most one missed tick is delivered as soon as the scheduler is
//! free again, and the period restarts from there.

use crate::{
    cadence::Cadence,
    commit::commit_if_dirty,
    config::Identity,
    repo::{Backend, CommitRecord},
};

use chrono::Local;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Scheduler life cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Waiting for ticks, and taking snapshots.
    #[default]
    Running,

    /// Terminal state reached after cancellation.
    Stopped,
}

/// Result of a single tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Working tree was dirty, and a new commit was recorded.
    Committed(CommitRecord),

    /// Working tree was clean.
    Clean,

    /// Snapshot attempt failed, and will be retried on the next tick.
    Failed,
}

/// Tally of everything a run did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Timer ticks that were processed.
    pub ticks: usize,

    /// Ticks that recorded a new commit.
    pub commits: usize,

    /// Ticks whose snapshot attempt failed.
    pub failures: usize,
}

/// Periodic snapshot driver.
#[derive(Debug)]
pub struct Scheduler<B>
where
    B: Backend,
{
    backend: B,
    identity: Identity,
    cadence: Cadence,
    state: State,
}

impl<B> Scheduler<B>
where
    B: Backend,
{
    /// Construct new scheduler in the running state.
    pub fn new(backend: B, identity: Identity, cadence: Cadence) -> Self {
        Self {
            backend,
            identity,
            cadence,
            state: State::Running,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Snapshot working tree every cadence interval until cancelled.
    ///
    /// The first tick fires one full interval after the call. Failed ticks
    /// are logged and never stop the loop.
    #[instrument(skip(self, token), level = "debug")]
    pub async fn run(&mut self, token: CancellationToken) -> RunSummary {
        let period = self.cadence.duration();
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "snapshotting {} every {}, type 'q' to quit",
            self.backend.work_dir().display(),
            self.cadence
        );

        let mut summary = RunSummary::default();
        while self.state == State::Running {
            tokio::select! {
                biased;
                _ = token.cancelled() => self.state = State::Stopped,
                _ = ticker.tick() => {
                    summary.ticks += 1;
                    match self.tick() {
                        TickOutcome::Committed(_) => summary.commits += 1,
                        TickOutcome::Clean => {}
                        TickOutcome::Failed => summary.failures += 1,
                    }
                }
            }
        }

        info!(
            "quitting after {} ticks, {} commits, {} failures",
            summary.ticks, summary.commits, summary.failures
        );

        summary
    }

    /// Run one snapshot attempt stamped with the current local time.
    pub fn tick(&self) -> TickOutcome {
        let now = Local::now().fixed_offset();
        match commit_if_dirty(&self.backend, &self.identity, now) {
            Ok(Some(record)) => TickOutcome::Committed(record),
            Ok(None) => TickOutcome::Clean,
            Err(error) => {
                warn!("snapshot failed, retrying next tick: {error}");
                TickOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::{Git2Backend, RepoError, Result as RepoResult};
    use chrono::{DateTime, FixedOffset};
    use git2::Oid;
    use pretty_assertions::assert_eq;
    use std::{
        fs::write,
        path::Path,
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };
    use tempfile::TempDir;

    fn identity() -> Identity {
        Identity::new("John Doe", "john@doe.com").unwrap()
    }

    /// Backend whose every operation fails, counting attempts.
    struct Broken {
        attempts: AtomicUsize,
    }

    impl Backend for Broken {
        fn work_dir(&self) -> &Path {
            Path::new("broken")
        }

        fn stage_all(&self) -> RepoResult<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(RepoError::Git2(git2::Error::from_str("disk on fire")))
        }

        fn is_clean(&self) -> RepoResult<bool> {
            Err(RepoError::Git2(git2::Error::from_str("disk on fire")))
        }

        fn commit(&self, _: &Identity, _: DateTime<FixedOffset>, _: &str) -> RepoResult<Oid> {
            Err(RepoError::Git2(git2::Error::from_str("disk on fire")))
        }

        fn find_commit(&self, _: Oid) -> RepoResult<CommitRecord> {
            Err(RepoError::Git2(git2::Error::from_str("disk on fire")))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_first_tick_does_nothing() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let backend = Git2Backend::init(dir.path())?;
        write(dir.path().join("dirty.txt"), "dirty")?;

        let token = CancellationToken::new();
        token.cancel();
        let mut scheduler = Scheduler::new(backend, identity(), Cadence::Rapid);
        let summary = scheduler.run(token).await;

        assert_eq!(summary, RunSummary::default());
        assert_eq!(scheduler.state(), State::Stopped);
        assert!(scheduler.backend().repository().head().is_err());

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn failures_do_not_stop_the_loop() {
        let backend = Broken {
            attempts: AtomicUsize::new(0),
        };
        let token = CancellationToken::new();
        let mut scheduler = Scheduler::new(backend, identity(), Cadence::Rapid);

        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(95)).await;
            cancel.cancel();
        });
        let summary = scheduler.run(token).await;

        let expect = RunSummary {
            ticks: 3,
            commits: 0,
            failures: 3,
        };
        assert_eq!(summary, expect);
        assert_eq!(scheduler.backend().attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_one_full_period() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let backend = Git2Backend::init(dir.path())?;
        write(dir.path().join("dirty.txt"), "dirty")?;

        let token = CancellationToken::new();
        let mut scheduler = Scheduler::new(backend, identity(), Cadence::Normal);

        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(59)).await;
            cancel.cancel();
        });
        let summary = scheduler.run(token).await;

        assert_eq!(summary.ticks, 0);
        assert!(scheduler.backend().repository().head().is_err());

        Ok(())
    }

    #[test]
    fn tick_reports_outcome() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let backend = Git2Backend::init(dir.path())?;
        let scheduler = Scheduler::new(backend, identity(), Cadence::Rapid);

        assert_eq!(scheduler.tick(), TickOutcome::Clean);
        write(dir.path().join("dirty.txt"), "dirty")?;
        assert!(matches!(scheduler.tick(), TickOutcome::Committed(_)));
        assert_eq!(scheduler.tick(), TickOutcome::Clean);

        Ok(())
    }
}
