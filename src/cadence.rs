// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Commit cadence policy.
//!
//! The __cadence__ is the interval between two automatic commit attempts. The
//! operator picks one of three speeds through a small integer selector, and
//! anything outside of that range quietly falls back to the normal speed.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    time::Duration,
};

/// Interval between automatic commit attempts.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Commit attempt every 30 seconds.
    Rapid,

    /// Commit attempt every minute.
    #[default]
    Normal,

    /// Commit attempt every two minutes.
    Slow,
}

impl Cadence {
    /// Concrete interval to use for the ticker.
    pub fn duration(&self) -> Duration {
        match self {
            Self::Rapid => Duration::from_secs(30),
            Self::Normal => Duration::from_secs(60),
            Self::Slow => Duration::from_secs(120),
        }
    }
}

impl From<i64> for Cadence {
    fn from(selector: i64) -> Self {
        match selector {
            0 => Self::Rapid,
            1 => Self::Normal,
            2 => Self::Slow,
            _ => Self::default(),
        }
    }
}

impl Display for Cadence {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Rapid => "rapid",
            Self::Normal => "normal",
            Self::Slow => "slow",
        };

        write!(fmt, "{name} ({}s)", self.duration().as_secs())
    }
}
