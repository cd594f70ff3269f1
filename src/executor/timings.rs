//! Timing sink shared between the runner and the executor

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::trace;

/// One measured scope, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryTiming {
    /// Scope path, e.g. `./error_tracking_breakdowns_hogql_execute/execute`
    pub k: String,
    pub t: f64,
}

/// Collects nested wall-clock timings.
///
/// Scopes are keyed by their path from the root (`./outer/inner`). A scope
/// measured more than once accumulates. Scopes are recorded when they close,
/// so inner scopes are listed before the scopes that contain them.
#[derive(Debug)]
pub struct Timings {
    started: Instant,
    stack: Vec<String>,
    timings: IndexMap<String, f64>,
}

impl Default for Timings {
    fn default() -> Self {
        Self::new()
    }
}

impl Timings {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            stack: Vec::new(),
            timings: IndexMap::new(),
        }
    }

    /// Run `f` inside a named scope
    pub fn measure<T>(&mut self, key: &str, f: impl FnOnce(&mut Self) -> T) -> T {
        self.stack.push(key.to_string());
        let path = format!("./{}", self.stack.join("/"));
        let start = Instant::now();

        let result = f(self);

        let elapsed = start.elapsed().as_secs_f64();
        self.stack.pop();
        *self.timings.entry(path.clone()).or_insert(0.0) += elapsed;
        trace!(scope = %path, elapsed_ms = elapsed * 1000.0, "timing");
        result
    }

    /// Paths of every closed scope, in recording order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.timings.keys().map(String::as_str)
    }

    /// Closed scopes plus the total since creation under `.`
    pub fn to_list(&self) -> Vec<QueryTiming> {
        self.timings
            .iter()
            .map(|(k, t)| QueryTiming { k: k.clone(), t: *t })
            .chain(std::iter::once(QueryTiming {
                k: ".".to_string(),
                t: self.started.elapsed().as_secs_f64(),
            }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_scopes() {
        let mut timings = Timings::new();
        let value = timings.measure("outer", |t| {
            t.measure("inner", |_| ());
            t.measure("inner", |_| ());
            42
        });

        assert_eq!(value, 42);
        let keys: Vec<&str> = timings.keys().collect();
        assert_eq!(keys, vec!["./outer/inner", "./outer"]);
    }

    #[test]
    fn test_to_list_ends_with_total() {
        let mut timings = Timings::new();
        timings.measure("a", |_| ());
        let list = timings.to_list();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].k, "./a");
        assert_eq!(list[1].k, ".");
        assert!(list.iter().all(|t| t.t >= 0.0));
    }
}
