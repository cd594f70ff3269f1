//! Planner errors

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum PlanError {
    /// No properties to break down by
    EmptyBreakdown,
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::EmptyBreakdown => {
                write!(f, "Breakdown must have at least one property")
            }
        }
    }
}

impl std::error::Error for PlanError {}
