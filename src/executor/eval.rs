//! Plan evaluation over in-memory relations
//!
//! Clause order follows SQL: FROM, WHERE, array expansion and projection (or
//! GROUP BY with aggregates), window functions, HAVING, ORDER BY, LIMIT. A
//! SELECT item may refer to aliases defined earlier in the same SELECT list;
//! window functions see every non-window item of their row.

use indexmap::IndexMap;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::plan::{CompareOp, Expr, OrderExpr, SelectQuery, SortOrder, TableExpr, WindowExpr};
use super::error::{ExecutionError, ExecutionErrorKind};
use super::value::Value;

const AGGREGATES: &[&str] = &["count", "sum", "min", "max", "avg"];

/// Rows of a relation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Resolves named relations for `FROM`
pub trait TableSource {
    fn scan(&self, chain: &[String]) -> Result<Frame, ExecutionError>;
}

/// Column lookup for one row; later columns shadow earlier ones
#[derive(Clone, Copy)]
struct Row<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Row<'a> {
    fn lookup(&self, name: &str) -> Option<&'a Value> {
        let visible = self.values.len().min(self.columns.len());
        self.columns[..visible]
            .iter()
            .rposition(|c| c == name)
            .map(|i| &self.values[i])
    }
}

/// Evaluate a query to a frame holding only its SELECT columns
pub fn evaluate_select(query: &SelectQuery, tables: &dyn TableSource) -> Result<Frame, ExecutionError> {
    let input = match &query.from {
        TableExpr::Table { chain } => tables.scan(chain)?,
        TableExpr::Subquery(inner) => evaluate_select(inner, tables)?,
    };

    let mut source_rows = input.rows;
    if let Some(predicate) = &query.where_clause {
        let mut kept = Vec::with_capacity(source_rows.len());
        for row in source_rows {
            let env = Row { columns: &input.columns, values: &row };
            if eval(predicate, env, None)?.is_truthy() {
                kept.push(row);
            }
        }
        source_rows = kept;
    }

    let names: Vec<String> = query
        .select
        .iter()
        .enumerate()
        .map(|(i, item)| item.output_name().map(str::to_string).unwrap_or_else(|| format!("_{}", i)))
        .collect();
    let source_width = input.columns.len();
    let mut columns = input.columns.clone();
    columns.extend(names.iter().cloned());

    let mut rows = if is_aggregating(query) {
        project_groups(query, &input.columns, &columns, source_rows)?
    } else {
        project_rows(query, &columns, source_rows)?
    };

    for (i, item) in query.select.iter().enumerate() {
        if let Expr::WindowFunction { name, args, over } = item.unaliased() {
            apply_window(name, args, over, &columns, &mut rows, source_width + i)?;
        }
    }

    if let Some(predicate) = &query.having {
        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            if eval(predicate, Row { columns: &columns, values: &row }, None)?.is_truthy() {
                kept.push(row);
            }
        }
        rows = kept;
    }

    if !query.order_by.is_empty() {
        rows = sort_rows(rows, &columns, &query.order_by)?;
    }

    if let Some(limit) = query.limit {
        rows.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
    }

    Ok(Frame {
        columns: names,
        rows: rows.into_iter().map(|row| row[source_width..].to_vec()).collect(),
    })
}

fn is_aggregating(query: &SelectQuery) -> bool {
    !query.group_by.is_empty() || query.select.iter().any(contains_aggregate)
}

fn contains_aggregate(expr: &Expr) -> bool {
    match expr {
        Expr::Call { name, args } => is_aggregate(name) || args.iter().any(contains_aggregate),
        Expr::Alias { expr, .. } => contains_aggregate(expr),
        Expr::Tuple { exprs } | Expr::Array { exprs } | Expr::And { exprs } => {
            exprs.iter().any(contains_aggregate)
        }
        Expr::CompareOperation { left, right, .. } => {
            contains_aggregate(left) || contains_aggregate(right)
        }
        _ => false,
    }
}

fn is_aggregate(name: &str) -> bool {
    AGGREGATES.contains(&name)
}

fn is_array_join(expr: &Expr) -> bool {
    matches!(expr.unaliased(), Expr::Call { name, .. } if name == "arrayJoin")
}

/// Evaluate SELECT items row by row, expanding `arrayJoin` items into one row
/// per array element
fn project_rows(
    query: &SelectQuery,
    columns: &[String],
    source_rows: Vec<Vec<Value>>,
) -> Result<Vec<Vec<Value>>, ExecutionError> {
    let mut out = Vec::new();
    for row in source_rows {
        let mut partials = vec![row];
        for item in &query.select {
            let mut next = Vec::with_capacity(partials.len());
            for mut partial in partials {
                match item.unaliased() {
                    Expr::WindowFunction { .. } => {
                        partial.push(Value::Null);
                        next.push(partial);
                    }
                    Expr::Call { name, args } if name == "arrayJoin" => {
                        let [arg] = args.as_slice() else {
                            return Err(arity(name, 1, args.len()));
                        };
                        let elements = match eval(arg, Row { columns, values: &partial }, None)? {
                            Value::Array(elements) => elements,
                            other => {
                                return Err(ExecutionError::invalid_plan(format!(
                                    "arrayJoin expects an array, got {:?}",
                                    other
                                )))
                            }
                        };
                        for element in elements {
                            let mut expanded = partial.clone();
                            expanded.push(element);
                            next.push(expanded);
                        }
                    }
                    _ => {
                        let value = eval(item, Row { columns, values: &partial }, None)?;
                        partial.push(value);
                        next.push(partial);
                    }
                }
            }
            partials = next;
        }
        out.extend(partials);
    }
    Ok(out)
}

/// Evaluate SELECT items once per GROUP BY key. Without GROUP BY the whole
/// input forms a single group, even when empty.
fn project_groups(
    query: &SelectQuery,
    source_columns: &[String],
    columns: &[String],
    source_rows: Vec<Vec<Value>>,
) -> Result<Vec<Vec<Value>>, ExecutionError> {
    if query.select.iter().any(is_array_join) {
        return Err(ExecutionError::invalid_plan("arrayJoin is not supported with GROUP BY"));
    }

    let mut groups: IndexMap<GroupKey, Vec<Vec<Value>>> = IndexMap::new();
    for row in source_rows {
        let env = Row { columns: source_columns, values: &row };
        let key = query
            .group_by
            .iter()
            .map(|expr| eval(expr, env, None))
            .collect::<Result<Vec<_>, _>>()?;
        groups.entry(GroupKey(key)).or_default().push(row);
    }
    if query.group_by.is_empty() && groups.is_empty() {
        groups.insert(GroupKey(Vec::new()), Vec::new());
    }

    let mut out = Vec::with_capacity(groups.len());
    for (_, members) in groups {
        let mut working = members
            .first()
            .cloned()
            .unwrap_or_else(|| vec![Value::Null; source_columns.len()]);
        let group = Group { columns: source_columns, rows: &members };
        for item in &query.select {
            let value = if matches!(item.unaliased(), Expr::WindowFunction { .. }) {
                Value::Null
            } else {
                eval(item, Row { columns, values: &working }, Some(group))?
            };
            working.push(value);
        }
        out.push(working);
    }
    Ok(out)
}

/// GROUP BY or PARTITION BY key.
///
/// Cells match by variant and content. NULL matches NULL and floats match
/// bit for bit, so NaN keys share a group.
#[derive(Debug, Clone)]
struct GroupKey(Vec<Value>);

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        same_cells(&self.0, &other.0)
    }
}

impl Eq for GroupKey {}

impl Hash for GroupKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        for cell in &self.0 {
            hash_cell(cell, state);
        }
    }
}

fn same_cells(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_cell(x, y))
}

fn same_cell(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => x.to_bits() == y.to_bits(),
        (Value::Tuple(x), Value::Tuple(y)) | (Value::Array(x), Value::Array(y)) => same_cells(x, y),
        _ => a == b,
    }
}

fn hash_cell<H: Hasher>(value: &Value, state: &mut H) {
    std::mem::discriminant(value).hash(state);
    match value {
        Value::Null => {}
        Value::Bool(b) => b.hash(state),
        Value::Int(i) => i.hash(state),
        Value::Float(f) => f.to_bits().hash(state),
        Value::String(s) => s.hash(state),
        Value::DateTime(t) => t.hash(state),
        Value::Tuple(items) | Value::Array(items) => {
            items.len().hash(state);
            for item in items {
                hash_cell(item, state);
            }
        }
        // Entry order is not hashed; equal maps still collide
        Value::Map(map) => map.len().hash(state),
    }
}

#[derive(Clone, Copy)]
struct Group<'a> {
    columns: &'a [String],
    rows: &'a [Vec<Value>],
}

fn eval(expr: &Expr, env: Row<'_>, group: Option<Group<'_>>) -> Result<Value, ExecutionError> {
    match expr {
        Expr::Constant { value } => Ok(Value::from(value)),
        Expr::Field { chain } => eval_field(chain, env),
        Expr::Alias { expr, .. } => eval(expr, env, group),
        Expr::Tuple { exprs } => Ok(Value::Tuple(eval_all(exprs, env, group)?)),
        Expr::Array { exprs } => Ok(Value::Array(eval_all(exprs, env, group)?)),
        Expr::CompareOperation { left, op, right } => {
            let left = eval(left, env, group)?;
            let right = eval(right, env, group)?;
            Ok(compare(&left, *op, &right))
        }
        Expr::And { exprs } => {
            for e in exprs {
                if !eval(e, env, group)?.is_truthy() {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }
        Expr::Call { name, args } if is_aggregate(name) => {
            let group = group.ok_or_else(|| {
                ExecutionError::invalid_plan(format!("aggregate {}() outside of a grouped query", name))
            })?;
            let mut arg_rows = Vec::with_capacity(group.rows.len());
            for row in group.rows {
                let row_env = Row { columns: group.columns, values: row };
                arg_rows.push(eval_all(args, row_env, None)?);
            }
            aggregate(name, &arg_rows)
        }
        Expr::Call { name, args } => {
            let values = eval_all(args, env, group)?;
            call_scalar(name, values)
        }
        Expr::WindowFunction { name, .. } => Err(ExecutionError::invalid_plan(format!(
            "window function {}() is only allowed as a SELECT item",
            name
        ))),
    }
}

fn eval_all(exprs: &[Expr], env: Row<'_>, group: Option<Group<'_>>) -> Result<Vec<Value>, ExecutionError> {
    exprs.iter().map(|e| eval(e, env, group)).collect()
}

fn eval_field(chain: &[String], env: Row<'_>) -> Result<Value, ExecutionError> {
    let Some((head, path)) = chain.split_first() else {
        return Err(ExecutionError::invalid_plan("field reference has an empty path"));
    };
    let mut value = env
        .lookup(head)
        .cloned()
        .ok_or_else(|| ExecutionError::invalid_plan(format!("unknown column '{}'", head)))?;

    for key in path {
        value = match value {
            Value::Map(map) => map.get(key).map(Value::from_json).unwrap_or(Value::Null),
            _ => Value::Null,
        };
    }
    Ok(value)
}

fn compare(left: &Value, op: CompareOp, right: &Value) -> Value {
    if left.is_null() || right.is_null() {
        return Value::Null;
    }
    match left.compare(right) {
        Some(ordering) => Value::Bool(match op {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::NotEq => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::LtEq => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::GtEq => ordering != Ordering::Less,
        }),
        None => match op {
            CompareOp::Eq => Value::Bool(false),
            CompareOp::NotEq => Value::Bool(true),
            _ => Value::Null,
        },
    }
}

fn call_scalar(name: &str, args: Vec<Value>) -> Result<Value, ExecutionError> {
    match name {
        "toString" => {
            let [value] = args.as_slice() else {
                return Err(arity(name, 1, args.len()));
            };
            Ok(value.render().map(Value::String).unwrap_or(Value::Null))
        }
        "ifNull" | "coalesce" => {
            if name == "ifNull" && args.len() != 2 {
                return Err(arity(name, 2, args.len()));
            }
            Ok(args.into_iter().find(|v| !v.is_null()).unwrap_or(Value::Null))
        }
        "tuple" => Ok(Value::Tuple(args)),
        "tupleElement" => {
            let [tuple, index] = args.as_slice() else {
                return Err(arity(name, 2, args.len()));
            };
            let Value::Tuple(items) = tuple else {
                return Err(ExecutionError::invalid_plan(format!(
                    "tupleElement expects a tuple, got {:?}",
                    tuple
                )));
            };
            let position = index
                .as_i64()
                .and_then(|i| usize::try_from(i).ok())
                .filter(|i| (1..=items.len()).contains(i))
                .ok_or_else(|| {
                    ExecutionError::invalid_plan(format!("tuple index {:?} out of range", index))
                })?;
            Ok(items[position - 1].clone())
        }
        "arrayJoin" => Err(ExecutionError::invalid_plan(
            "arrayJoin is only allowed as a SELECT item",
        )),
        other => Err(ExecutionError::invalid_plan(format!("unknown function '{}'", other))),
    }
}

fn arity(name: &str, expected: usize, got: usize) -> ExecutionError {
    ExecutionError::invalid_plan(format!("{}() takes {} argument(s), got {}", name, expected, got))
}

/// Aggregate over per-row argument values
fn aggregate(name: &str, arg_rows: &[Vec<Value>]) -> Result<Value, ExecutionError> {
    let first_args = || arg_rows.iter().filter_map(|args| args.first()).filter(|v| !v.is_null());

    match name {
        "count" => {
            let n = if arg_rows.iter().all(Vec::is_empty) {
                arg_rows.len()
            } else {
                first_args().count()
            };
            Ok(Value::Int(n as i64))
        }
        "sum" => {
            let mut int_total: i64 = 0;
            let mut float_total: Option<f64> = None;
            for value in first_args() {
                match value {
                    Value::Int(i) => {
                        int_total = int_total.checked_add(*i).ok_or_else(|| {
                            ExecutionError::new(ExecutionErrorKind::ResourceLimit, "integer overflow in sum()")
                        })?
                    }
                    Value::Float(f) => *float_total.get_or_insert(0.0) += f,
                    other => {
                        return Err(ExecutionError::invalid_plan(format!(
                            "sum() expects numbers, got {:?}",
                            other
                        )))
                    }
                }
            }
            Ok(match float_total {
                Some(f) => Value::Float(f + int_total as f64),
                None => Value::Int(int_total),
            })
        }
        "min" => Ok(first_args().min_by(|a, b| a.sort_cmp(b)).cloned().unwrap_or(Value::Null)),
        "max" => Ok(first_args().max_by(|a, b| a.sort_cmp(b)).cloned().unwrap_or(Value::Null)),
        "avg" => {
            let numbers: Vec<f64> = first_args().filter_map(Value::as_f64).collect();
            if numbers.is_empty() {
                Ok(Value::Null)
            } else {
                Ok(Value::Float(numbers.iter().sum::<f64>() / numbers.len() as f64))
            }
        }
        other => Err(ExecutionError::invalid_plan(format!("unknown aggregate '{}'", other))),
    }
}

/// Fill `slot` of every row with the window function's value.
///
/// Rows are ordered inside their partition by a stable sort, so ties keep
/// their input order. Aggregates without ORDER BY cover the whole partition;
/// with ORDER BY they run up to the last peer of the current row.
fn apply_window(
    name: &str,
    args: &[Expr],
    over: &WindowExpr,
    columns: &[String],
    rows: &mut [Vec<Value>],
    slot: usize,
) -> Result<(), ExecutionError> {
    let mut partitions: IndexMap<GroupKey, Vec<usize>> = IndexMap::new();
    let mut order_keys = Vec::with_capacity(rows.len());
    let mut arg_values = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let env = Row { columns, values: row };
        let key = eval_all(&over.partition_by, env, None)?;
        partitions.entry(GroupKey(key)).or_default().push(index);
        order_keys.push(
            over.order_by
                .iter()
                .map(|o| eval(&o.expr, env, None))
                .collect::<Result<Vec<_>, _>>()?,
        );
        arg_values.push(eval_all(args, env, None)?);
    }

    for (_, mut members) in partitions {
        members.sort_by(|a, b| compare_keys(&order_keys[*a], &order_keys[*b], &over.order_by));

        let peers_end = |position: usize| {
            let mut end = position;
            while end + 1 < members.len()
                && compare_keys(&order_keys[members[end + 1]], &order_keys[members[position]], &over.order_by)
                    == Ordering::Equal
            {
                end += 1;
            }
            end
        };

        let mut results = Vec::with_capacity(members.len());
        match name {
            "row_number" => {
                for position in 0..members.len() {
                    results.push(Value::Int(position as i64 + 1));
                }
            }
            "rank" | "dense_rank" => {
                let mut rank = 0i64;
                let mut dense = 0i64;
                for position in 0..members.len() {
                    let new_peer_group = position == 0
                        || compare_keys(
                            &order_keys[members[position - 1]],
                            &order_keys[members[position]],
                            &over.order_by,
                        ) != Ordering::Equal;
                    if new_peer_group {
                        rank = position as i64 + 1;
                        dense += 1;
                    }
                    results.push(Value::Int(if name == "rank" { rank } else { dense }));
                }
            }
            _ if is_aggregate(name) => {
                let whole: Vec<Vec<Value>> = members.iter().map(|i| arg_values[*i].clone()).collect();
                if over.order_by.is_empty() {
                    let value = aggregate(name, &whole)?;
                    results.resize(members.len(), value);
                } else {
                    for position in 0..members.len() {
                        results.push(aggregate(name, &whole[..=peers_end(position)])?);
                    }
                }
            }
            other => {
                return Err(ExecutionError::invalid_plan(format!(
                    "unknown window function '{}'",
                    other
                )))
            }
        }

        for (index, value) in members.iter().zip(results) {
            rows[*index][slot] = value;
        }
    }
    Ok(())
}

fn compare_keys(a: &[Value], b: &[Value], order_by: &[OrderExpr]) -> Ordering {
    for ((x, y), order) in a.iter().zip(b.iter()).zip(order_by.iter()) {
        let ordering = match order.order {
            SortOrder::Asc => x.sort_cmp(y),
            SortOrder::Desc => y.sort_cmp(x),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn sort_rows(
    rows: Vec<Vec<Value>>,
    columns: &[String],
    order_by: &[OrderExpr],
) -> Result<Vec<Vec<Value>>, ExecutionError> {
    let mut keyed = Vec::with_capacity(rows.len());
    for row in rows {
        let env = Row { columns, values: &row };
        let key = order_by
            .iter()
            .map(|o| eval(&o.expr, env, None))
            .collect::<Result<Vec<_>, _>>()?;
        keyed.push((key, row));
    }
    keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b, order_by));
    Ok(keyed.into_iter().map(|(_, row)| row).collect())
}
