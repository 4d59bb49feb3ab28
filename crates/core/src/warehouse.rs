//! Warehouse collaborator trait.
//!
//! The loop never talks to the warehouse directly; it reaches it through a
//! registered tool holding a [`QueryExecutor`]. The trait keeps the actual
//! client (an owned, explicitly constructed handle — no process-wide
//! singleton) swappable for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WarehouseError;

/// A tabular query result: column names plus row-major values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// The whole result as a JSON value (what tools bind into the state store).
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "columns": self.columns,
            "rows": self.rows,
        })
    }

    /// A short human-readable preview for observations: header plus up to
    /// `max_rows` pipe-separated rows.
    pub fn preview(&self, max_rows: usize) -> String {
        let mut out = self.columns.join(" | ");
        for row in self.rows.iter().take(max_rows) {
            let cells: Vec<String> = row
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    Value::Null => "NULL".into(),
                    other => other.to_string(),
                })
                .collect();
            out.push('\n');
            out.push_str(&cells.join(" | "));
        }
        if self.rows.len() > max_rows {
            out.push_str(&format!("\n... ({} rows total)", self.rows.len()));
        }
        out
    }

    /// Extract a column as f64 values, skipping cells that are not numeric.
    pub fn numeric_column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        let values = self
            .rows
            .iter()
            .filter_map(|row| row.get(idx))
            .filter_map(as_f64)
            .collect();
        Some(values)
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        // Warehouse REST APIs return numerics as strings.
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Anything that can run SQL and hand back a tabular result.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute a SQL statement and return its result set.
    async fn execute_query(
        &self,
        sql: &str,
    ) -> std::result::Result<QueryResult, WarehouseError>;
}
