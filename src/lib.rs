//! breakdown-planner - Compile breakdown requests to layered top-K queries
//!
//! This library provides:
//! - Breakdown request types (BreakdownQuery, DateRange)
//! - Event schema configuration, parsed from YAML
//! - Relative date resolution (`-7d`, `mStart`, `2025-01-01`, ...)
//! - A serializable query tree (Expr, SelectQuery)
//! - The five-layer breakdown plan (unpivot, decompose, aggregate, rank, filter)
//! - ClickHouse-dialect SQL emission
//! - An executor interface plus an in-memory reference executor
//! - Grouping of flat result rows per dimension
//!
//! # Architecture
//!
//! **Noun modules** (data structures):
//! - `query/` - request types (BreakdownQuery, DateRange)
//! - `config/` - event schema names and defaults (BreakdownConfig)
//! - `plan/` - query tree types (Expr, SelectQuery, WindowExpr)
//!
//! **Verb modules** (transformations):
//! - `parser/` - YAML → BreakdownConfig
//! - `dates/` - date expressions → ResolvedWindow
//! - `planner/` - BreakdownQuery + ResolvedWindow → SelectQuery
//! - `emitter/` - SelectQuery → SQL text
//! - `executor/` - SelectQuery → rows
//! - `grouper/` - rows → GroupedBreakdownResult
//! - `runner` - all of the above for one request
//!
//! # Example
//!
//! ```ignore
//! use breakdown_planner::{parser, BreakdownQuery, BreakdownQueryRunner, TeamId};
//!
//! let config = parser::parse_file("breakdowns.yaml")?;
//! let query = BreakdownQuery::new(issue_id, ["$browser", "$os"])
//!     .with_date_range(Some("-14d"), None)
//!     .with_limit(5);
//! let runner = BreakdownQueryRunner::new(query, TeamId(1), &config, Utc::now())?;
//! let response = runner.calculate(&executor)?;
//! ```

pub mod config;
pub mod query;
pub mod plan;
pub mod parser;
pub mod dates;
pub mod planner;
pub mod emitter;
pub mod executor;
pub mod grouper;
pub mod runner;
pub mod error;

// Re-export commonly used types
pub use config::{BreakdownConfig, BREAKDOWN_NULL_VALUE};
pub use query::{BreakdownQuery, DateRange, SpecError};
pub use plan::{Expr, SelectQuery, TableExpr};
pub use dates::{relative_date_parse, resolve_from, resolve_to, DateError, DateResolver, ResolvedWindow};
pub use planner::{build_breakdown_query, build_where_clause, PlanError, TopKPerPartition};
pub use emitter::{emit_sql, EmitError};
pub use executor::{
    Event, ExecutionContext, ExecutionError, ExecutionErrorKind, FlatResultRow, LimitContext,
    MemoryExecutor, QueryExecutor, QueryResult, TeamId, Timings,
};
pub use grouper::{group_rows, BreakdownValue, DimensionBreakdown, GroupedBreakdownResult};
pub use runner::{BreakdownQueryRunner, BreakdownResponse};
pub use error::{BreakdownError, ParseError};
