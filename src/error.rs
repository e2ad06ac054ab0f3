// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::fmt;

use canonical_error::{CanonicalError,
                      internal_error, invalid_argument_error, out_of_range_error};

/// Failures surfaced by the query, snapshot and sequence layers. Every variant
/// carries a message suitable for showing to the requester.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrreryError {
    /// Date string is not a valid `YYYY-MM-DD` calendar date.
    InvalidDate(String),
    /// Duration or interval is not an integer.
    InvalidNumber(String),
    /// Duration, interval or their ratio is outside the accepted bounds.
    OutOfRange(String),
    /// Date arithmetic ran past the representable calendar range.
    RangeOverflow(String),
    /// The ephemeris could not produce a position. Not a usage error.
    Computation(String),
}

impl OrreryError {
    pub fn message(&self) -> &str {
        match self {
            OrreryError::InvalidDate(msg) |
            OrreryError::InvalidNumber(msg) |
            OrreryError::OutOfRange(msg) |
            OrreryError::RangeOverflow(msg) |
            OrreryError::Computation(msg) => msg.as_str(),
        }
    }

    // True when the requester can fix the problem by changing its inputs.
    pub fn is_client_fault(&self) -> bool {
        !matches!(self, OrreryError::Computation(_))
    }
}

impl fmt::Display for OrreryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for OrreryError {}

impl From<OrreryError> for CanonicalError {
    fn from(err: OrreryError) -> Self {
        match err {
            OrreryError::InvalidDate(msg) |
            OrreryError::InvalidNumber(msg) => invalid_argument_error(msg.as_str()),
            OrreryError::OutOfRange(msg) |
            OrreryError::RangeOverflow(msg) => out_of_range_error(msg.as_str()),
            OrreryError::Computation(msg) => internal_error(msg.as_str()),
        }
    }
}

// Ephemeris failures arrive as CanonicalError from the oracle boundary; all of
// them are computation failures regardless of code.
impl From<CanonicalError> for OrreryError {
    fn from(err: CanonicalError) -> Self {
        OrreryError::Computation(err.message)
    }
}

// mod tests.
