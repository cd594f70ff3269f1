//! Query tree types (noun module)
//!
//! A closed expression tree describing one relational query. Trees are built
//! bottom-up from already-constructed children and never mutated afterwards,
//! so a finished plan can be logged, serialized and replayed independently of
//! the code that built it.

mod expr;
mod select;

pub use expr::{CompareOp, Constant, Expr, OrderExpr, SortOrder, WindowExpr};
pub use select::{SelectQuery, TableExpr};
