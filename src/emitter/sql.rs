//! SQL emitter
//!
//! Prints a SelectQuery as indented ClickHouse-dialect SQL, one nesting level
//! per subquery.

use crate::plan::{Constant, Expr, OrderExpr, SelectQuery, TableExpr, WindowExpr};
use super::error::EmitError;

/// Emit a pretty-printed SQL string from a SelectQuery.
pub fn emit_sql(query: &SelectQuery) -> Result<String, EmitError> {
    emit_select(query, 0)
}

fn pad(indent: usize) -> String {
    "  ".repeat(indent)
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

fn emit_select(query: &SelectQuery, indent: usize) -> Result<String, EmitError> {
    if query.select.is_empty() {
        return Err(EmitError::InvalidPlan("SELECT list is empty".to_string()));
    }

    let p = pad(indent);
    let items = emit_list(&query.select)?;
    let mut sql = format!("{p}SELECT {items}\n{p}FROM {}", emit_table(&query.from, indent)?);

    if let Some(predicate) = &query.where_clause {
        sql.push_str(&format!("\n{p}WHERE {}", emit_expr(predicate)?));
    }
    if !query.group_by.is_empty() {
        sql.push_str(&format!("\n{p}GROUP BY {}", emit_list(&query.group_by)?));
    }
    if let Some(predicate) = &query.having {
        sql.push_str(&format!("\n{p}HAVING {}", emit_expr(predicate)?));
    }
    if !query.order_by.is_empty() {
        sql.push_str(&format!("\n{p}ORDER BY {}", emit_order_list(&query.order_by)?));
    }
    if let Some(limit) = query.limit {
        sql.push_str(&format!("\n{p}LIMIT {}", limit));
    }

    Ok(sql)
}

fn emit_table(table: &TableExpr, indent: usize) -> Result<String, EmitError> {
    match table {
        TableExpr::Table { chain } => emit_chain(chain),
        TableExpr::Subquery(inner) => {
            let inner_sql = emit_select(inner, indent + 1)?;
            Ok(format!("(\n{inner_sql}\n{p})", p = pad(indent)))
        }
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// Emit a single expression
pub fn emit_expr(expr: &Expr) -> Result<String, EmitError> {
    match expr {
        Expr::Constant { value } => emit_constant(value),
        Expr::Field { chain } => emit_chain(chain),
        Expr::Call { name, args } => {
            check_name(name)?;
            Ok(format!("{}({})", name, emit_list(args)?))
        }
        Expr::Tuple { exprs } => Ok(format!("tuple({})", emit_list(exprs)?)),
        Expr::Array { exprs } => Ok(format!("[{}]", emit_list(exprs)?)),
        Expr::Alias { alias, expr } => {
            Ok(format!("{} AS {}", emit_expr(expr)?, emit_identifier(alias)))
        }
        Expr::CompareOperation { left, op, right } => Ok(format!(
            "{} {} {}",
            emit_operand(left)?,
            op.as_str(),
            emit_operand(right)?
        )),
        Expr::And { exprs } => {
            if exprs.is_empty() {
                return Ok("true".to_string());
            }
            Ok(format!("and({})", emit_list(exprs)?))
        }
        Expr::WindowFunction { name, args, over } => {
            check_name(name)?;
            Ok(format!("{}({}) OVER ({})", name, emit_list(args)?, emit_window(over)?))
        }
    }
}

/// Comparisons nested inside comparisons need parentheses
fn emit_operand(expr: &Expr) -> Result<String, EmitError> {
    match expr {
        Expr::CompareOperation { .. } => Ok(format!("({})", emit_expr(expr)?)),
        _ => emit_expr(expr),
    }
}

fn emit_list(exprs: &[Expr]) -> Result<String, EmitError> {
    let parts = exprs
        .iter()
        .map(emit_expr)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join(", "))
}

fn emit_order_list(order_by: &[OrderExpr]) -> Result<String, EmitError> {
    let parts = order_by
        .iter()
        .map(|o| Ok(format!("{} {}", emit_expr(&o.expr)?, o.order.as_str())))
        .collect::<Result<Vec<_>, EmitError>>()?;
    Ok(parts.join(", "))
}

fn emit_window(over: &WindowExpr) -> Result<String, EmitError> {
    let mut clauses = Vec::new();
    if !over.partition_by.is_empty() {
        clauses.push(format!("PARTITION BY {}", emit_list(&over.partition_by)?));
    }
    if !over.order_by.is_empty() {
        clauses.push(format!("ORDER BY {}", emit_order_list(&over.order_by)?));
    }
    Ok(clauses.join(" "))
}

fn emit_chain(chain: &[String]) -> Result<String, EmitError> {
    if chain.is_empty() {
        return Err(EmitError::InvalidPlan("field reference has an empty path".to_string()));
    }
    Ok(chain
        .iter()
        .map(|part| emit_identifier(part))
        .collect::<Vec<_>>()
        .join("."))
}

/// Plain identifiers print bare, anything else is backquoted
fn emit_identifier(name: &str) -> String {
    let mut chars = name.chars();
    let plain = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_' || first == '$')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        None => false,
    };
    if plain {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

fn check_name(name: &str) -> Result<(), EmitError> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(EmitError::InvalidPlan(format!("invalid function name '{}'", name)));
    }
    Ok(())
}

fn emit_constant(value: &Constant) -> Result<String, EmitError> {
    match value {
        Constant::Null => Ok("NULL".to_string()),
        Constant::Bool(b) => Ok(if *b { "true" } else { "false" }.to_string()),
        Constant::Int(i) => Ok(i.to_string()),
        Constant::Float(f) => {
            if !f.is_finite() {
                return Err(EmitError::UnsupportedExpression(format!("float constant {}", f)));
            }
            Ok(format!("{:?}", f))
        }
        Constant::String(s) => Ok(emit_string(s)),
        Constant::DateTime(dt) => Ok(format!(
            "toDateTime64({}, 6, 'UTC')",
            emit_string(&dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string())
        )),
    }
}

fn emit_string(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}
