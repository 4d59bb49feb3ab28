//! The `execute_query` tool.
//!
//! Runs a SQL statement through the warehouse executor, returns a short
//! preview as the observation, and binds the full result set into the state
//! store under `result_N` so later steps can reference it by name instead of
//! re-serializing rows into the prompt.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, info};

use quarry_core::error::ToolError;
use quarry_core::tool::{Tool, ToolResult};
use quarry_core::warehouse::QueryExecutor;

const PREVIEW_ROWS: usize = 10;

pub struct ExecuteQueryTool {
    executor: Arc<dyn QueryExecutor>,
    counter: AtomicUsize,
}

impl ExecuteQueryTool {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            executor,
            counter: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Tool for ExecuteQueryTool {
    fn name(&self) -> &str {
        "execute_query"
    }

    fn description(&self) -> &str {
        "Execute a SQL query against the warehouse and return a preview of the \
         result. The full result set is stored in a state variable named in the \
         observation; pass that variable name to later tools to reuse the data."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The SQL statement to execute"
                }
            },
            "required": ["query"]
        })
    }

    fn output_type(&self) -> &str {
        "object"
    }

    async fn execute(&self, arguments: Value) -> std::result::Result<ToolResult, ToolError> {
        let sql = arguments
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ToolError::InvalidArguments("expected a string argument 'query'".into())
            })?;

        debug!(sql = %sql, "Executing warehouse query");

        let result = self
            .executor
            .execute_query(sql)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "execute_query".into(),
                reason: e.to_string(),
            })?;

        let key = format!("result_{}", self.counter.fetch_add(1, Ordering::SeqCst) + 1);
        info!(rows = result.row_count(), state_key = %key, "Query succeeded");

        let output = format!(
            "Query returned {} rows. Full result stored in state variable '{}'.\n{}",
            result.row_count(),
            key,
            result.preview(PREVIEW_ROWS),
        );

        Ok(ToolResult::with_state(output, key, result.to_value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::error::WarehouseError;
    use quarry_core::warehouse::QueryResult;

    struct StubExecutor {
        fail: bool,
    }

    #[async_trait]
    impl QueryExecutor for StubExecutor {
        async fn execute_query(
            &self,
            _sql: &str,
        ) -> std::result::Result<QueryResult, WarehouseError> {
            if self.fail {
                return Err(WarehouseError::QueryFailed("syntax error at line 1".into()));
            }
            Ok(QueryResult {
                columns: vec!["n".into()],
                rows: vec![vec![json!(1)], vec![json!(2)]],
            })
        }
    }

    fn tool(fail: bool) -> ExecuteQueryTool {
        ExecuteQueryTool::new(Arc::new(StubExecutor { fail }))
    }

    #[tokio::test]
    async fn binds_result_under_sequential_state_keys() {
        let tool = tool(false);
        let first = tool.execute(json!({"query": "SELECT 1"})).await.unwrap();
        let second = tool.execute(json!({"query": "SELECT 2"})).await.unwrap();
        assert_eq!(first.state_key.as_deref(), Some("result_1"));
        assert_eq!(second.state_key.as_deref(), Some("result_2"));
        assert!(first.output.contains("2 rows"));
        assert_eq!(first.data.unwrap()["rows"][1][0], json!(2));
    }

    #[tokio::test]
    async fn missing_query_is_an_argument_error() {
        let err = tool(false).execute(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn warehouse_failure_is_an_execution_error() {
        let err = tool(true)
            .execute(json!({"query": "SELEC 1"}))
            .await
            .unwrap_err();
        match err {
            ToolError::ExecutionFailed { tool_name, reason } => {
                assert_eq!(tool_name, "execute_query");
                assert!(reason.contains("syntax error"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
