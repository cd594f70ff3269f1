//! Error types for breakdown-planner

use std::fmt;

use crate::dates::DateError;
use crate::executor::ExecutionError;
use crate::planner::PlanError;
use crate::query::SpecError;

/// Errors that can occur while loading a config
#[derive(Debug)]
pub enum ParseError {
    /// IO error reading file
    Io {
        path: String,
        source: std::io::Error,
    },
    /// YAML deserialization error
    Yaml {
        source: serde_yaml::Error,
    },
    /// Well-formed YAML with an unusable value
    Invalid {
        field: String,
        message: String,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Io { path, source } => {
                write!(f, "Failed to read '{}': {}", path, source)
            }
            ParseError::Yaml { source } => {
                write!(f, "Invalid YAML: {}", source)
            }
            ParseError::Invalid { field, message } => {
                write!(f, "Invalid config field '{}': {}", field, message)
            }
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Io { source, .. } => Some(source),
            ParseError::Yaml { source } => Some(source),
            ParseError::Invalid { .. } => None,
        }
    }
}

impl From<serde_yaml::Error> for ParseError {
    fn from(err: serde_yaml::Error) -> Self {
        ParseError::Yaml { source: err }
    }
}

/// Errors surfaced by a breakdown request.
///
/// Every variant is terminal for the request; none is retried.
#[derive(Debug)]
pub enum BreakdownError {
    /// The date range could not be resolved (`dateTo = "all"`, unparseable or inverted bounds)
    InvalidRange(DateError),
    /// The request failed basic shape checks
    InvalidSpec(SpecError),
    /// The plan could not be built
    Plan(PlanError),
    /// The executor failed; carries its diagnostics unchanged
    Execution(ExecutionError),
}

impl fmt::Display for BreakdownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakdownError::InvalidRange(err) => write!(f, "Invalid date range: {}", err),
            BreakdownError::InvalidSpec(err) => write!(f, "Invalid breakdown query: {}", err),
            BreakdownError::Plan(err) => write!(f, "Planning failed: {}", err),
            BreakdownError::Execution(err) => write!(f, "Execution failed: {}", err),
        }
    }
}

impl std::error::Error for BreakdownError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BreakdownError::InvalidRange(err) => Some(err),
            BreakdownError::InvalidSpec(err) => Some(err),
            BreakdownError::Plan(err) => Some(err),
            BreakdownError::Execution(err) => Some(err),
        }
    }
}

impl From<DateError> for BreakdownError {
    fn from(err: DateError) -> Self {
        BreakdownError::InvalidRange(err)
    }
}

impl From<SpecError> for BreakdownError {
    fn from(err: SpecError) -> Self {
        BreakdownError::InvalidSpec(err)
    }
}

impl From<PlanError> for BreakdownError {
    fn from(err: PlanError) -> Self {
        BreakdownError::Plan(err)
    }
}

impl From<ExecutionError> for BreakdownError {
    fn from(err: ExecutionError) -> Self {
        BreakdownError::Execution(err)
    }
}
