//! Execution context handed to an executor with every plan

use serde::{Deserialize, Serialize};

use super::timings::Timings;

/// Tenant the query runs for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamId(pub u64);

/// Result-size policy for the outermost query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LimitContext {
    /// Interactive query
    #[default]
    Query,
    /// Query run in the background
    QueryAsync,
    /// Export of the full result
    Export,
}

const DEFAULT_RETURNED_ROWS: usize = 100;
const MAX_SELECT_RETURNED_ROWS: usize = 50_000;
const EXPORT_RETURNED_ROWS: usize = 300_000;

impl LimitContext {
    /// Rows returned when the query sets no LIMIT
    pub fn default_rows(&self) -> usize {
        match self {
            LimitContext::Query | LimitContext::QueryAsync => DEFAULT_RETURNED_ROWS,
            LimitContext::Export => EXPORT_RETURNED_ROWS,
        }
    }

    /// Upper bound on rows regardless of the query's LIMIT
    pub fn max_rows(&self) -> usize {
        match self {
            LimitContext::Query | LimitContext::QueryAsync => MAX_SELECT_RETURNED_ROWS,
            LimitContext::Export => EXPORT_RETURNED_ROWS,
        }
    }

    /// Rows the outermost query may return given its own LIMIT
    pub fn row_cap(&self, requested: Option<i64>) -> usize {
        let requested = match requested {
            Some(limit) => usize::try_from(limit.max(0)).unwrap_or(usize::MAX),
            None => self.default_rows(),
        };
        requested.min(self.max_rows())
    }
}

/// Everything an executor needs besides the plan
#[derive(Debug)]
pub struct ExecutionContext<'a> {
    pub team: TeamId,
    /// Label for logs and query tagging
    pub query_type: String,
    pub timings: &'a mut Timings,
    pub limit_context: LimitContext,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(team: TeamId, query_type: impl Into<String>, timings: &'a mut Timings) -> Self {
        Self {
            team,
            query_type: query_type.into(),
            timings,
            limit_context: LimitContext::default(),
        }
    }

    pub fn with_limit_context(mut self, limit_context: LimitContext) -> Self {
        self.limit_context = limit_context;
        self
    }
}
