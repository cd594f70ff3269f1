//! SQL emitter (verb module)
//!
//! Transforms a SelectQuery into ClickHouse-dialect query text.

mod error;
mod sql;

pub use error::EmitError;
pub use sql::{emit_expr, emit_sql};
