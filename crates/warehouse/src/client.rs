//! Snowflake SQL API v2 client.
//!
//! Executes statements via `POST /api/v2/statements` with bearer-token
//! authentication. Token acquisition is out of scope; the token arrives as an
//! opaque string from configuration. Statements run synchronously from the
//! caller's perspective: the request carries a timeout and the API is asked
//! not to return before the statement finishes.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use quarry_config::WarehouseConfig;
use quarry_core::error::WarehouseError;
use quarry_core::warehouse::{QueryExecutor, QueryResult};

/// An owned warehouse connection handle.
pub struct WarehouseClient {
    base_url: String,
    token: String,
    role: Option<String>,
    warehouse: Option<String>,
    database: Option<String>,
    schema: Option<String>,
    query_timeout_secs: u64,
    client: reqwest::Client,
}

impl WarehouseClient {
    /// Build a client from warehouse configuration.
    ///
    /// Fails with [`WarehouseError::AuthenticationFailed`] if no token is
    /// configured — we refuse to construct a handle that cannot authenticate.
    pub fn new(config: &WarehouseConfig) -> Result<Self, WarehouseError> {
        let token = config.token.clone().ok_or_else(|| {
            WarehouseError::AuthenticationFailed("no warehouse token configured".into())
        })?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.query_timeout_secs + 30))
            .build()
            .map_err(|e| WarehouseError::Network(e.to_string()))?;

        Ok(Self {
            base_url: format!("https://{}", config.host.trim_end_matches('/')),
            token,
            role: config.role.clone(),
            warehouse: config.warehouse.clone(),
            database: config.database.clone(),
            schema: config.schema.clone(),
            query_timeout_secs: config.query_timeout_secs,
            client,
        })
    }

    fn request_body(&self, sql: &str) -> Value {
        let mut body = serde_json::json!({
            "statement": sql,
            "timeout": self.query_timeout_secs,
        });
        if let Some(role) = &self.role {
            body["role"] = Value::String(role.clone());
        }
        if let Some(warehouse) = &self.warehouse {
            body["warehouse"] = Value::String(warehouse.clone());
        }
        if let Some(database) = &self.database {
            body["database"] = Value::String(database.clone());
        }
        if let Some(schema) = &self.schema {
            body["schema"] = Value::String(schema.clone());
        }
        body
    }

    /// Parse a SQL API response body into a [`QueryResult`].
    fn parse_response(payload: &Value) -> Result<QueryResult, WarehouseError> {
        let columns = payload
            .pointer("/resultSetMetaData/rowType")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                WarehouseError::MalformedResponse(
                    "response has no resultSetMetaData.rowType".into(),
                )
            })?
            .iter()
            .map(|col| {
                col.get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        WarehouseError::MalformedResponse("column without a name".into())
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rows = payload
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| WarehouseError::MalformedResponse("response has no data".into()))?
            .iter()
            .map(|row| {
                row.as_array().cloned().ok_or_else(|| {
                    WarehouseError::MalformedResponse("row is not an array".into())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(QueryResult { columns, rows })
    }
}

#[async_trait]
impl QueryExecutor for WarehouseClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult, WarehouseError> {
        let url = format!("{}/api/v2/statements", self.base_url);
        let request_id = Uuid::new_v4();

        debug!(%request_id, statement_bytes = sql.len(), "Submitting statement");

        let response = self
            .client
            .post(&url)
            .query(&[("requestId", request_id.to_string()), ("async", "false".into())])
            .bearer_auth(&self.token)
            .header(
                "X-Snowflake-Authorization-Token-Type",
                "PROGRAMMATIC_ACCESS_TOKEN",
            )
            .header("Accept", "application/json")
            .json(&self.request_body(sql))
            .send()
            .await
            .map_err(|e| WarehouseError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return Err(WarehouseError::AuthenticationFailed(
                "warehouse rejected the token".into(),
            ));
        }
        if status == 202 {
            // The statement outlived the synchronous window.
            return Err(WarehouseError::QueryFailed(format!(
                "statement did not complete within {}s",
                self.query_timeout_secs
            )));
        }
        if status == 422 {
            let payload: Value = response.json().await.unwrap_or_default();
            let message = payload
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("statement failed")
                .to_string();
            warn!(%request_id, %message, "Statement rejected");
            return Err(WarehouseError::QueryFailed(message));
        }
        if status != 200 {
            let message = response.text().await.unwrap_or_default();
            return Err(WarehouseError::ApiError {
                status_code: status,
                message,
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| WarehouseError::MalformedResponse(e.to_string()))?;

        let result = Self::parse_response(&payload)?;
        debug!(
            %request_id,
            rows = result.row_count(),
            columns = result.column_count(),
            "Statement completed"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> WarehouseConfig {
        WarehouseConfig {
            host: "acme-xy123.snowflakecomputing.com".into(),
            token: Some("token".into()),
            role: Some("ANALYST".into()),
            warehouse: Some("ANALYTICS_WH".into()),
            database: Some("REVENUE".into()),
            schema: Some("TIMESERIES".into()),
            query_timeout_secs: 60,
        }
    }

    #[test]
    fn construction_requires_token() {
        let mut cfg = config();
        cfg.token = None;
        assert!(matches!(
            WarehouseClient::new(&cfg),
            Err(WarehouseError::AuthenticationFailed(_))
        ));
    }

    #[test]
    fn request_body_includes_context() {
        let client = WarehouseClient::new(&config()).unwrap();
        let body = client.request_body("SELECT 1");
        assert_eq!(body["statement"], json!("SELECT 1"));
        assert_eq!(body["warehouse"], json!("ANALYTICS_WH"));
        assert_eq!(body["database"], json!("REVENUE"));
        assert_eq!(body["schema"], json!("TIMESERIES"));
        assert_eq!(body["role"], json!("ANALYST"));
        assert_eq!(body["timeout"], json!(60));
    }

    #[test]
    fn parse_response_extracts_columns_and_rows() {
        let payload = json!({
            "resultSetMetaData": {
                "rowType": [
                    {"name": "DATE", "type": "date"},
                    {"name": "REVENUE", "type": "fixed"}
                ]
            },
            "data": [
                ["2024-01-01", "100.5"],
                ["2024-01-02", "200.0"]
            ],
            "code": "090001"
        });
        let result = WarehouseClient::parse_response(&payload).unwrap();
        assert_eq!(result.columns, vec!["DATE", "REVENUE"]);
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.rows[0][1], json!("100.5"));
    }

    #[test]
    fn parse_response_rejects_missing_metadata() {
        let payload = json!({"data": []});
        assert!(matches!(
            WarehouseClient::parse_response(&payload),
            Err(WarehouseError::MalformedResponse(_))
        ));
    }
}
