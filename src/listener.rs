// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Cancellation sources.
//!
//! The operator stops the program by typing `q` on standard input. Since a
//! closed input stream would otherwise leave no graceful way out, an
//! interrupt signal (Ctrl-C) is honored as a second source. Both sources
//! cancel the same [`CancellationToken`], which fires at most once.

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Character that requests a graceful shutdown.
pub const QUIT: u8 = b'q';

/// Why the quit listener stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerExit {
    /// Operator typed `q`, and the token was cancelled.
    Quit,

    /// Input stream ended or failed before `q` was seen.
    Closed,

    /// Token was cancelled by another source.
    Cancelled,
}

/// Watch input stream for the quit character.
///
/// Reads one byte at a time, so nothing past the quit character is consumed.
/// All other input is ignored. Read errors, including end of input, end the
/// loop without cancelling the token.
#[instrument(skip(input, token), level = "debug")]
pub async fn listen_for_quit<R>(mut input: R, token: CancellationToken) -> ListenerExit
where
    R: AsyncRead + Unpin,
{
    loop {
        let byte = tokio::select! {
            biased;
            _ = token.cancelled() => return ListenerExit::Cancelled,
            byte = input.read_u8() => byte,
        };

        match byte {
            Ok(QUIT) => {
                info!("quit requested");
                token.cancel();
                return ListenerExit::Quit;
            }
            Ok(other) => debug!("ignoring input byte {other:#04x}"),
            Err(error) => {
                warn!("stopped listening for '{}': {error}", QUIT as char);
                warn!("use Ctrl-C to stop");
                return ListenerExit::Closed;
            }
        }
    }
}

/// Cancel token on interrupt signal.
///
/// Returns once the token is cancelled, either by the signal or by any other
/// source. Failure to install the signal handler is logged, and the function
/// then simply waits on the token.
pub async fn listen_for_interrupt(token: CancellationToken) {
    tokio::select! {
        _ = token.cancelled() => {}
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => {
                info!("interrupt received");
                token.cancel();
            }
            Err(error) => {
                warn!("cannot listen for interrupt: {error}");
                token.cancelled().await;
            }
        },
    }
}
