//! Query planner (verb module)
//!
//! Transforms a breakdown request and its resolved window into a layered
//! `SelectQuery`.

mod breakdown;
mod error;
mod filter;
mod topk;

pub use breakdown::{
    build_breakdown_query, BREAKDOWN_PROPERTY, BREAKDOWN_TUPLE, BREAKDOWN_VALUE,
};
pub use error::PlanError;
pub use filter::build_where_clause;
pub use topk::{TopKPerPartition, COUNT, RANK, TOTAL_COUNT};
