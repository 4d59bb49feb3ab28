//! The reserved `final_answer` tool.
//!
//! The only way a run ends successfully: the model must call this tool with
//! its answer. The loop intercepts the call name before dispatch, so this
//! implementation exists to put the tool (and its schema) into the registry
//! and to render sensibly if executed directly in tests.

use async_trait::async_trait;
use serde_json::{Value, json};

use quarry_core::error::ToolError;
use quarry_core::tool::{FINAL_ANSWER_TOOL, Tool, ToolResult};

pub struct FinalAnswerTool;

#[async_trait]
impl Tool for FinalAnswerTool {
    fn name(&self) -> &str {
        FINAL_ANSWER_TOOL
    }

    fn description(&self) -> &str {
        "Provide the final answer to the task. Call this tool once the task is \
         complete; the run ends with the value you pass. If a previous step \
         stored the answer in a state variable, pass that variable's name."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "answer": {
                    "type": "any",
                    "description": "The final answer to the problem"
                }
            },
            "required": ["answer"]
        })
    }

    fn output_type(&self) -> &str {
        "any"
    }

    async fn execute(&self, arguments: Value) -> std::result::Result<ToolResult, ToolError> {
        let answer = arguments
            .get("answer")
            .cloned()
            .ok_or_else(|| ToolError::InvalidArguments("expected an argument 'answer'".into()))?;

        let output = match &answer {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        Ok(ToolResult {
            output,
            data: Some(answer),
            state_key: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_the_answer_value() {
        let result = FinalAnswerTool
            .execute(json!({"answer": "SELECT 1"}))
            .await
            .unwrap();
        assert_eq!(result.output, "SELECT 1");
        assert_eq!(result.data, Some(json!("SELECT 1")));
        assert!(result.state_key.is_none());
    }

    #[tokio::test]
    async fn missing_answer_is_an_argument_error() {
        let err = FinalAnswerTool.execute(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
