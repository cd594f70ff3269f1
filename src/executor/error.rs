//! Executor errors

use std::fmt;

use super::timings::QueryTiming;

/// Failure category reported by an executor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionErrorKind {
    /// The store did not answer in time
    Timeout,
    /// A memory, row or scan limit was exceeded
    ResourceLimit,
    /// The plan could not be printed or evaluated
    InvalidPlan,
    /// The result did not have the expected shape
    InvalidResult,
    /// Any other backend failure
    Backend,
}

impl fmt::Display for ExecutionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionErrorKind::Timeout => write!(f, "timeout"),
            ExecutionErrorKind::ResourceLimit => write!(f, "resource limit exceeded"),
            ExecutionErrorKind::InvalidPlan => write!(f, "invalid plan"),
            ExecutionErrorKind::InvalidResult => write!(f, "invalid result"),
            ExecutionErrorKind::Backend => write!(f, "backend error"),
        }
    }
}

/// An executor failure together with whatever diagnostics were gathered
/// before it happened
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionError {
    kind: ExecutionErrorKind,
    message: String,
    query_text: Option<String>,
    timings: Vec<QueryTiming>,
}

impl ExecutionError {
    pub fn new(kind: ExecutionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            query_text: None,
            timings: Vec::new(),
        }
    }

    pub fn invalid_plan(message: impl Into<String>) -> Self {
        Self::new(ExecutionErrorKind::InvalidPlan, message)
    }

    pub fn invalid_result(message: impl Into<String>) -> Self {
        Self::new(ExecutionErrorKind::InvalidResult, message)
    }

    /// Attach the query text, keeping one that is already set
    pub fn with_query_text(mut self, query_text: impl Into<String>) -> Self {
        if self.query_text.is_none() {
            self.query_text = Some(query_text.into());
        }
        self
    }

    /// Attach timings, keeping ones that are already set
    pub fn with_timings(mut self, timings: Vec<QueryTiming>) -> Self {
        if self.timings.is_empty() {
            self.timings = timings;
        }
        self
    }

    pub fn kind(&self) -> ExecutionErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn query_text(&self) -> Option<&str> {
        self.query_text.as_deref()
    }

    pub fn timings(&self) -> &[QueryTiming] {
        &self.timings
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ExecutionError {}
