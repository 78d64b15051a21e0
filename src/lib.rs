// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Periodic working tree snapshots.
//!
//! Autocommit watches over one local Git repository, and on a fixed cadence
//! records a new commit whenever the working tree changed since the last one.
//! It keeps doing so until the operator types `q` or interrupts the process.
//!
//! # Flow
//!
//! 1. [`config`] gathers the commit identity, path, and cadence once.
//! 2. [`bootstrap::resolve`] opens the repository, or initializes it.
//! 3. [`scheduler::Scheduler`] ticks at the chosen [`cadence::Cadence`],
//!    running [`commit::commit_if_dirty`] on every tick.
//! 4. [`listener`] cancels the scheduler on `q` or Ctrl-C.

pub mod bootstrap;
pub mod cadence;
pub mod commit;
pub mod config;
pub mod listener;
pub mod repo;
pub mod scheduler;

#[doc(inline)]
pub use bootstrap::{resolve, Resolution};

#[doc(inline)]
pub use cadence::Cadence;

#[doc(inline)]
pub use commit::commit_if_dirty;

#[doc(inline)]
pub use config::{Identity, Settings};

#[doc(inline)]
pub use repo::{Backend, CommitRecord, Git2Backend};

#[doc(inline)]
pub use scheduler::{RunSummary, Scheduler};
