//! Unified error type.

use std::fmt;

/// The error type returned by weft's fallible operations.
///
/// Routing outcomes (404, 405) are ordinary HTTP [`Response`](crate::Response)
/// values, not `Error`s, and malformed path specs panic at registration time
/// so they abort startup. What remains for `Error` is infrastructure failure:
/// binding the listener or accepting a connection.
#[derive(Debug)]
pub struct Error(std::io::Error);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "io: {}", self.0)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self(e)
    }
}
