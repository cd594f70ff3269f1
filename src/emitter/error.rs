//! Emitter errors

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum EmitError {
    /// Expression that has no textual form (e.g. a non-finite float)
    UnsupportedExpression(String),
    /// Invalid plan structure
    InvalidPlan(String),
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmitError::UnsupportedExpression(expr) => {
                write!(f, "Unsupported expression: {}", expr)
            }
            EmitError::InvalidPlan(msg) => {
                write!(f, "Invalid plan: {}", msg)
            }
        }
    }
}

impl std::error::Error for EmitError {}
