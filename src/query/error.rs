use std::fmt;

/// Shape errors in a breakdown request, detected before planning
#[derive(Debug, Clone, PartialEq)]
pub enum SpecError {
    /// No dimensions requested
    EmptyBreakdown,
    /// A dimension name is blank
    BlankProperty { index: usize },
    /// The subject identifier is blank
    MissingSubject,
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecError::EmptyBreakdown => {
                write!(f, "breakdownProperties must contain at least one property")
            }
            SpecError::BlankProperty { index } => {
                write!(f, "breakdownProperties[{}] must not be blank", index)
            }
            SpecError::MissingSubject => write!(f, "issueId must not be blank"),
        }
    }
}

impl std::error::Error for SpecError {}
