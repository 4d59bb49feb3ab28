//! Snowflake Cortex inference provider.
//!
//! Speaks the `POST /api/v2/cortex/inference:complete` endpoint:
//!
//! - Bearer token authentication
//! - Tool schemas wrapped as `{"tool_spec": {...}}` entries
//! - Tool calls and results carried in `content_list` blocks
//!   (`tool_use` / `tool_results`)
//!
//! The reserved `final_answer` tool is special-cased during schema
//! translation: Cortex is stricter about typed fields on terminal outputs, so
//! its `answer` property is forced to type `"string"` on the wire regardless
//! of the declared tool schema.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, warn};

use quarry_config::WarehouseConfig;
use quarry_core::error::ProviderError;
use quarry_core::message::{Message, MessageToolCall, Role};
use quarry_core::provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
use quarry_core::tool::FINAL_ANSWER_TOOL;

/// Snowflake Cortex inference gateway.
pub struct CortexProvider {
    name: String,
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl CortexProvider {
    /// Create a new Cortex provider for the given account host.
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .unwrap_or_default();

        Self {
            name: "cortex".into(),
            base_url: format!("https://{}", host.into().trim_end_matches('/')),
            token: token.into(),
            client,
        }
    }

    /// Build a provider from warehouse configuration (the inference endpoint
    /// lives on the same account host).
    pub fn from_config(config: &WarehouseConfig) -> Result<Self, ProviderError> {
        let token = config.token.clone().ok_or_else(|| {
            ProviderError::NotConfigured("no token configured for the Cortex endpoint".into())
        })?;
        Ok(Self::new(config.host.clone(), token))
    }

    /// Convert messages to the Cortex wire format.
    fn to_api_messages(messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|msg| {
                let role = match msg.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                let mut entry = json!({
                    "role": role,
                    "content": msg.content,
                });

                if !msg.tool_calls.is_empty() {
                    let blocks: Vec<Value> = msg
                        .tool_calls
                        .iter()
                        .map(|call| {
                            json!({
                                "type": "tool_use",
                                "tool_use": {
                                    "tool_use_id": call.id,
                                    "name": call.name,
                                    "input": call.arguments,
                                }
                            })
                        })
                        .collect();
                    entry["content_list"] = Value::Array(blocks);
                } else if let Some(result) = &msg.tool_result {
                    entry["content_list"] = json!([{
                        "type": "tool_results",
                        "tool_results": {
                            "tool_use_id": result.tool_use_id,
                            "name": result.tool_name,
                            "content": [{"type": "text", "text": result.text}],
                        }
                    }]);
                }

                entry
            })
            .collect()
    }

    /// Convert tool definitions to Cortex `tool_spec` entries.
    ///
    /// The `final_answer` tool's `answer` property is coerced to type
    /// "string" — the provider contract requires a concretely typed terminal
    /// field even when the tool itself declares a looser type.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<Value> {
        tools
            .iter()
            .map(|tool| {
                let mut properties = tool
                    .parameters
                    .get("properties")
                    .cloned()
                    .unwrap_or_else(|| json!({}));

                if tool.name == FINAL_ANSWER_TOOL {
                    let description = properties
                        .pointer("/answer/description")
                        .and_then(Value::as_str)
                        .unwrap_or("The final answer to the problem")
                        .to_string();
                    properties["answer"] = json!({
                        "description": description,
                        "type": "string",
                    });
                }

                let required: Vec<String> = properties
                    .as_object()
                    .map(|props| props.keys().cloned().collect())
                    .unwrap_or_default();

                json!({
                    "tool_spec": {
                        "type": "generic",
                        "name": tool.name,
                        "input_schema": {
                            "type": "object",
                            "properties": properties,
                            "required": required,
                        }
                    }
                })
            })
            .collect()
    }

    /// Parse a Cortex response payload into a provider response.
    fn parse_response(payload: Value, requested_model: &str) -> Result<ProviderResponse, ProviderError> {
        let message = payload
            .pointer("/choices/0/message")
            .ok_or_else(|| {
                ProviderError::MalformedResponse("response has no choices[0].message".into())
            })?;

        let content = message
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let tool_calls: Vec<MessageToolCall> = message
            .get("content_list")
            .and_then(Value::as_array)
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|block| block.get("type").and_then(Value::as_str) == Some("tool_use"))
                    .filter_map(|block| block.get("tool_use"))
                    .map(|tool_use| MessageToolCall {
                        id: tool_use
                            .get("tool_use_id")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        name: tool_use
                            .get("name")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        arguments: tool_use.get("input").cloned().unwrap_or(json!({})),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let usage = payload.get("usage").and_then(|u| {
            Some(Usage {
                prompt_tokens: u.get("prompt_tokens")?.as_u64()? as u32,
                completion_tokens: u.get("completion_tokens")?.as_u64()? as u32,
                total_tokens: u.get("total_tokens")?.as_u64()? as u32,
            })
        });

        let model = payload
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or(requested_model)
            .to_string();

        Ok(ProviderResponse {
            message: Message::assistant_with_calls(content, tool_calls),
            usage,
            model,
            raw: payload,
        })
    }
}

#[async_trait]
impl Provider for CortexProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/api/v2/cortex/inference:complete", self.base_url);

        let mut body = json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "max_tokens": request.max_tokens.unwrap_or(4096),
            "temperature": request.temperature,
            "top_p": 1,
            "stream": false,
        });
        if !request.tools.is_empty() {
            body["tools"] = Value::Array(Self::to_api_tools(&request.tools));
        }
        if !request.stop.is_empty() {
            body["stop_sequences"] = json!(request.stop);
        }

        debug!(provider = "cortex", model = %request.model, messages = request.messages.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Cortex rejected the token".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Cortex API error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        Self::parse_response(payload, &request.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::message::ToolResultBlock;

    fn final_answer_definition() -> ToolDefinition {
        ToolDefinition {
            name: FINAL_ANSWER_TOOL.into(),
            description: "Return the final answer".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "answer": {"type": "any", "description": "The final answer to the problem"}
                },
                "required": ["answer"]
            }),
            output_type: "any".into(),
        }
    }

    #[test]
    fn final_answer_schema_forced_to_string() {
        let tools = CortexProvider::to_api_tools(&[final_answer_definition()]);
        let answer = tools[0]
            .pointer("/tool_spec/input_schema/properties/answer")
            .unwrap();
        assert_eq!(answer["type"], json!("string"));
        assert_eq!(answer["description"], json!("The final answer to the problem"));
        assert_eq!(
            tools[0].pointer("/tool_spec/input_schema/required").unwrap(),
            &json!(["answer"])
        );
    }

    #[test]
    fn other_tool_schemas_pass_through() {
        let def = ToolDefinition {
            name: "execute_query".into(),
            description: "Run SQL".into(),
            parameters: json!({
                "type": "object",
                "properties": {"query": {"type": "string"}},
                "required": ["query"]
            }),
            output_type: "object".into(),
        };
        let tools = CortexProvider::to_api_tools(&[def]);
        assert_eq!(
            tools[0].pointer("/tool_spec/input_schema/properties/query/type"),
            Some(&json!("string"))
        );
        assert_eq!(tools[0]["tool_spec"]["type"], json!("generic"));
    }

    #[test]
    fn tool_result_message_becomes_content_list() {
        let msg = Message::tool_result(
            "Query returned 3 rows",
            ToolResultBlock {
                tool_use_id: "call_1".into(),
                tool_name: "execute_query".into(),
                text: "Query returned 3 rows".into(),
            },
        );
        let api = CortexProvider::to_api_messages(&[msg]);
        assert_eq!(api[0]["role"], json!("user"));
        assert_eq!(
            api[0].pointer("/content_list/0/tool_results/tool_use_id"),
            Some(&json!("call_1"))
        );
    }

    #[test]
    fn assistant_tool_calls_become_tool_use_blocks() {
        let msg = Message::assistant_with_calls(
            "Running",
            vec![MessageToolCall {
                id: "call_2".into(),
                name: "execute_query".into(),
                arguments: json!({"query": "SELECT 1"}),
            }],
        );
        let api = CortexProvider::to_api_messages(&[msg]);
        assert_eq!(
            api[0].pointer("/content_list/0/tool_use/input/query"),
            Some(&json!("SELECT 1"))
        );
    }

    #[test]
    fn parse_response_extracts_tool_calls_and_raw() {
        let payload = json!({
            "model": "claude-3-5-sonnet",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "I'll run the query.",
                    "content_list": [
                        {"type": "text", "text": "I'll run the query."},
                        {"type": "tool_use", "tool_use": {
                            "tool_use_id": "tooluse_abc",
                            "name": "execute_query",
                            "input": {"query": "SELECT 1"}
                        }}
                    ]
                }
            }],
            "usage": {"prompt_tokens": 120, "completion_tokens": 30, "total_tokens": 150}
        });
        let response = CortexProvider::parse_response(payload, "claude-3-5-sonnet").unwrap();
        assert_eq!(response.message.content, "I'll run the query.");
        assert_eq!(response.message.tool_calls.len(), 1);
        assert_eq!(response.message.tool_calls[0].id, "tooluse_abc");
        assert_eq!(response.usage.unwrap().total_tokens, 150);
        // Raw payload kept for audit.
        assert!(response.raw.pointer("/choices/0/message").is_some());
    }

    #[test]
    fn parse_response_without_tool_calls() {
        let payload = json!({
            "choices": [{"message": {"role": "assistant", "content": "plain text"}}]
        });
        let response = CortexProvider::parse_response(payload, "m").unwrap();
        assert!(response.message.tool_calls.is_empty());
        assert_eq!(response.model, "m");
    }

    #[test]
    fn parse_response_rejects_empty_payload() {
        let err = CortexProvider::parse_response(json!({}), "m").unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }
}
