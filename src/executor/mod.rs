//! Query execution (verb module)
//!
//! The planner's output is handed to a [`QueryExecutor`] together with an
//! [`ExecutionContext`]. Executors return raw rows; reading them as
//! breakdown rows is left to [`QueryResult::breakdown_rows`].
//!
//! [`MemoryExecutor`] evaluates plans over events held in memory.

mod context;
mod error;
mod eval;
mod memory;
mod result;
mod timings;
mod value;

pub use context::{ExecutionContext, LimitContext, TeamId};
pub use error::{ExecutionError, ExecutionErrorKind};
pub use eval::{evaluate_select, Frame, TableSource};
pub use memory::{Event, MemoryExecutor, EVENTS_TABLE};
pub use result::{FlatResultRow, QueryResult};
pub use timings::{QueryTiming, Timings};
pub use value::Value;

use crate::plan::SelectQuery;

/// Runs a compiled plan for one team
pub trait QueryExecutor {
    fn execute(
        &self,
        query: &SelectQuery,
        context: &mut ExecutionContext<'_>,
    ) -> Result<QueryResult, ExecutionError>;
}

impl<T: QueryExecutor + ?Sized> QueryExecutor for &T {
    fn execute(
        &self,
        query: &SelectQuery,
        context: &mut ExecutionContext<'_>,
    ) -> Result<QueryResult, ExecutionError> {
        (**self).execute(query, context)
    }
}
