// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;
use std::path::Path;

/// The one error kind the generator reports to its caller.
///
/// Anything that is wrong with the *inputs* (a malformed row, a bad pin name,
/// a hook the port never implemented) is a `PinGeneratorError`. These travel
/// inside `anyhow::Error` like everything else; the driver picks them back
/// out with `downcast_ref` to decide the exit status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PinGeneratorError {
    message: String,
}

impl PinGeneratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Error for a port hook that was invoked but never implemented.
    pub fn unimplemented(hook: &str) -> Self {
        Self::new(format!("{hook} is not implemented by this port"))
    }

    /// Prefixes the message with `file:line: `.
    pub fn at(self, file: &Path, line: u64) -> Self {
        Self::new(format!("{}:{}: {}", file.display(), line, self.message))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for PinGeneratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for PinGeneratorError {}

/// Builds an `anyhow::Error` wrapping a [`PinGeneratorError`].
#[macro_export]
macro_rules! pin_error {
    ($($arg:tt)*) => {
        ::anyhow::Error::from($crate::PinGeneratorError::new(format!($($arg)*)))
    };
}

/// Like `anyhow::bail!`, but the error is a [`PinGeneratorError`].
#[macro_export]
macro_rules! pin_bail {
    ($($arg:tt)*) => {
        return Err($crate::pin_error!($($arg)*))
    };
}

/// Annotates `err` with a source location if it is a [`PinGeneratorError`];
/// any other error passes through untouched.
pub(crate) fn annotate(err: anyhow::Error, file: &Path, line: u64) -> anyhow::Error {
    match err.downcast::<PinGeneratorError>() {
        Ok(e) => e.at(file, line).into(),
        Err(e) => e,
    }
}
