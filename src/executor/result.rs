//! Executor output

use serde::{Deserialize, Serialize};

use super::error::ExecutionError;
use super::timings::QueryTiming;
use super::value::Value;

/// Flat tabular result of one plan execution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    /// Rows were dropped to fit the limit context's row cap
    pub has_more: bool,
    /// Printed form of the executed plan
    pub query_text: String,
    pub timings: Vec<QueryTiming>,
}

impl QueryResult {
    /// Read every row as `(property, value, count, total_count)`
    pub fn breakdown_rows(&self) -> Result<Vec<FlatResultRow>, ExecutionError> {
        self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                FlatResultRow::from_values(row).map_err(|e| {
                    ExecutionError::invalid_result(format!("row {}: {}", index, e.message()))
                })
            })
            .collect()
    }
}

/// One surviving `(dimension, value)` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatResultRow {
    pub dimension: String,
    pub value: String,
    pub count: i64,
    /// Count over every value of the dimension, not just the surviving ones
    pub total_count: i64,
}

impl FlatResultRow {
    pub fn new(
        dimension: impl Into<String>,
        value: impl Into<String>,
        count: i64,
        total_count: i64,
    ) -> Self {
        Self {
            dimension: dimension.into(),
            value: value.into(),
            count,
            total_count,
        }
    }

    pub fn from_values(row: &[Value]) -> Result<Self, ExecutionError> {
        let [dimension, value, count, total_count] = row else {
            return Err(ExecutionError::invalid_result(format!(
                "expected 4 columns, got {}",
                row.len()
            )));
        };

        let text = |cell: &Value, column: &str| {
            cell.render()
                .ok_or_else(|| ExecutionError::invalid_result(format!("{} is NULL", column)))
        };
        let integer = |cell: &Value, column: &str| {
            cell.as_i64().ok_or_else(|| {
                ExecutionError::invalid_result(format!("{} is not an integer: {:?}", column, cell))
            })
        };

        Ok(Self {
            dimension: text(dimension, "breakdown_property")?,
            value: text(value, "breakdown_value")?,
            count: integer(count, "count")?,
            total_count: integer(total_count, "total_count")?,
        })
    }
}
