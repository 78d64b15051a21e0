// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Startup configuration.
//!
//! All configuration is gathered exactly once at startup and handed to the
//! rest of the program as a plain [`Settings`] value. Nothing past this module
//! reads from the process environment.
//!
//! # Environment Layout
//!
//! The commit identity comes from two environment variables, `author_name`
//! and `author_email`. They can be exported directly, or placed in a `.env`
//! file that sits in the current directory (or any of its parents):
//!
//! ```text
//! author_name="Your Name"
//! author_email="you@example.com"
//! ```
//!
//! Variables that are already exported take precedence over the file.

use crate::cadence::Cadence;

use std::{
    env,
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
};
use tracing::debug;

/// Environment variable holding the author display name.
pub const AUTHOR_NAME_VAR: &str = "author_name";

/// Environment variable holding the author email address.
pub const AUTHOR_EMAIL_VAR: &str = "author_email";

/// Load `.env` file into the process environment.
///
/// Returns the path of the file that was loaded, or `None` if no file could
/// be found. A missing file is fine, because the identity may already be
/// exported by the caller.
///
/// # Errors
///
/// - Return [`ConfigError::EnvFile`] if the file exists but cannot be read
///   or parsed.
pub fn load_env_file() -> Result<Option<PathBuf>> {
    match dotenvy::dotenv() {
        Ok(path) => {
            debug!("loaded environment from {}", path.display());
            Ok(Some(path))
        }
        Err(error) if error.not_found() => Ok(None),
        Err(error) => Err(ConfigError::EnvFile(error)),
    }
}

/// Name and email pair used as both author and committer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    name: String,
    email: String,
}

impl Identity {
    /// Construct new identity.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::MissingAuthorName`] if name is blank.
    /// - Return [`ConfigError::MissingAuthorEmail`] if email is blank.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let email = email.into();

        if name.trim().is_empty() {
            return Err(ConfigError::MissingAuthorName);
        }

        if email.trim().is_empty() {
            return Err(ConfigError::MissingAuthorEmail);
        }

        Ok(Self { name, email })
    }

    /// Construct identity from `author_name` and `author_email` variables.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::MissingAuthorName`] if `author_name` is unset
    ///   or blank.
    /// - Return [`ConfigError::MissingAuthorEmail`] if `author_email` is unset
    ///   or blank.
    pub fn from_env() -> Result<Self> {
        let name = env::var(AUTHOR_NAME_VAR).unwrap_or_default();
        let email = env::var(AUTHOR_EMAIL_VAR).unwrap_or_default();
        Self::new(name, email)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl Display for Identity {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "{} <{}>", self.name, self.email)
    }
}

/// Everything the scheduler needs to know, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Path to the repository to snapshot.
    pub repository: PathBuf,

    /// Interval between commit attempts.
    pub cadence: Cadence,

    /// Author and committer of every snapshot.
    pub identity: Identity,
}

impl Settings {
    /// Construct new settings.
    ///
    /// The repository path goes through shell expansion, so `~` and `$VAR`
    /// are resolved before the path is ever touched.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::ShellExpansion`] if the path references an
    ///   unset variable.
    pub fn new(repository: impl AsRef<str>, cadence: Cadence, identity: Identity) -> Result<Self> {
        let repository = PathBuf::from(shellexpand::full(repository.as_ref())?.into_owned());

        Ok(Self {
            repository,
            cadence,
            identity,
        })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No author name was supplied.
    #[error(
        "no author name supplied\n\n\
        Please export 'author_name', or create a .env file with the following content:\n\
        author_name=\"Your Name\"\n\
        author_email=\"Your Email\""
    )]
    MissingAuthorName,

    /// No author email was supplied.
    #[error(
        "no author email supplied\n\n\
        Please export 'author_email', or create a .env file with the following content:\n\
        author_name=\"Your Name\"\n\
        author_email=\"Your Email\""
    )]
    MissingAuthorEmail,

    /// Failed to read or parse `.env` file.
    #[error("failed to load .env file: {0}")]
    EnvFile(#[source] dotenvy::Error),

    /// Failed to perform shell expansion on repository path.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<env::VarError>),
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
