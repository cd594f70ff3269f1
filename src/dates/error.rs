use chrono::{DateTime, Utc};
use std::fmt;

/// Errors that can occur while resolving the analysis window
#[derive(Debug, Clone, PartialEq)]
pub enum DateError {
    /// `"all"` was given as the end of the range
    AllTimeEnd,
    /// The expression is neither a known relative form nor a date
    Unparseable(String),
    /// The expression parsed but lands outside the representable range
    OutOfRange(String),
    /// The resolved start lies after the resolved end
    InvertedRange {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
}

impl fmt::Display for DateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateError::AllTimeEnd => write!(f, "'all' is not a valid end of range"),
            DateError::Unparseable(input) => write!(f, "Unrecognized date expression '{}'", input),
            DateError::OutOfRange(input) => write!(f, "Date expression '{}' is out of range", input),
            DateError::InvertedRange { from, to } => {
                write!(f, "Range start {} is after range end {}", from.to_rfc3339(), to.to_rfc3339())
            }
        }
    }
}

impl std::error::Error for DateError {}
