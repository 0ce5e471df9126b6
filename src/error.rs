//! Error types for the lock core.

use crate::grab::GrabState;
use thiserror::Error;

/// Result type alias for xlockd operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while setting up or holding the lock.
#[derive(Debug, Error)]
pub enum Error {
    /// The X display could not be opened.
    #[error("failed to open X display: {0}")]
    DisplayOpenFailed(String),

    /// A request was rejected by the X server.
    #[error("X11 error {code} in {request}")]
    Protocol {
        /// Name of the request that failed.
        request: &'static str,
        /// X protocol error code.
        code: u8,
    },

    /// The screen does not advertise any visual at the given depth.
    #[error("no visual with depth {0} advertised by the screen")]
    NoVisual(u8),

    /// A color spec was not eight hexadecimal digits.
    #[error("invalid color {0:?}: expected rrggbbaa")]
    InvalidColor(String),

    /// The keyboard extension could not be negotiated or queried.
    #[error("XKB: {0}")]
    Xkb(String),

    /// Pointer and keyboard could not both be grabbed.
    #[error("could not grab pointer and keyboard ({0:?})")]
    GrabFailed(GrabState),
}

impl Error {
    /// Setup-critical errors after which the locker cannot run at all.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::DisplayOpenFailed(_) | Error::NoVisual(_) | Error::Xkb(_)
        )
    }
}

/// Combine the outcomes of teardown steps that were all attempted.
///
/// Returns the first error. Later ones are only logged.
pub(crate) fn first_error(results: impl IntoIterator<Item = Result<()>>) -> Result<()> {
    let mut first = None;
    for result in results {
        if let Err(e) = result {
            match first {
                None => first = Some(e),
                Some(_) => log::warn!("teardown step failed: {}", e),
            }
        }
    }
    first.map_or(Ok(()), Err)
}
