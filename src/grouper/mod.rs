//! Result grouping (verb module)
//!
//! Reshapes flat `(dimension, value, count, total_count)` rows into one
//! entry per dimension.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::executor::FlatResultRow;

/// One surviving value of a dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownValue {
    #[serde(rename = "breakdown_value")]
    pub value: String,
    pub count: i64,
}

/// Top values of one dimension plus its overall event count
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DimensionBreakdown {
    pub values: Vec<BreakdownValue>,
    pub total_count: i64,
}

/// Dimension name to breakdown, in first-seen order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupedBreakdownResult(IndexMap<String, DimensionBreakdown>);

impl GroupedBreakdownResult {
    pub fn get(&self, dimension: &str) -> Option<&DimensionBreakdown> {
        self.0.get(dimension)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DimensionBreakdown)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn dimensions(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Group rows by dimension.
///
/// The first row of a dimension sets its `total_count`; every row of that
/// dimension carries the same total, so later rows are not re-read for it.
/// Values keep the order the rows arrived in.
pub fn group_rows(rows: &[FlatResultRow]) -> GroupedBreakdownResult {
    let mut grouped: IndexMap<String, DimensionBreakdown> = IndexMap::new();
    for row in rows {
        let entry = grouped
            .entry(row.dimension.clone())
            .or_insert_with(|| DimensionBreakdown {
                values: Vec::new(),
                total_count: row.total_count,
            });
        entry.values.push(BreakdownValue {
            value: row.value.clone(),
            count: row.count,
        });
    }
    GroupedBreakdownResult(grouped)
}
