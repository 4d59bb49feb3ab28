//! The end-to-end feature-engineering pipeline.
//!
//! One pipeline run: ground a business question in the semantic model, let
//! the agent loop produce SQL for it, judge the SQL, and on acceptance record
//! it as a verified query and score its result set.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use quarry_agent::AgentLoop;
use quarry_core::error::{Error, Result};
use quarry_core::message::Message;
use quarry_core::provider::{Provider, ProviderRequest};
use quarry_core::warehouse::QueryExecutor;
use quarry_semantic::SemanticModelManager;

use crate::evaluation::EvaluationStrategy;
use crate::validation::{Judge, StrategyReport};

const TASK_SUFFIX: &str = "\n\nPlease provide the SQL query to achieve this. \
This query should either extend an existing database table by adding new \
columns while retaining the original ones, or potentially create an entirely \
new table.";

/// How a pipeline run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    /// The agent produced SQL, the judge accepted it, and it was recorded.
    Completed,
    /// The agent's step budget ran out before a final answer.
    Incomplete,
    /// The judge rejected the generated SQL.
    Rejected,
}

/// The full record of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub question: String,
    pub sql: Option<String>,
    pub validation: Vec<StrategyReport>,
    pub metrics: BTreeMap<String, f64>,
    pub status: PipelineStatus,
}

pub struct FeatureEngineeringPipeline {
    provider: Arc<dyn Provider>,
    model: String,
    agent: AgentLoop,
    judge: Judge,
    evaluator: Box<dyn EvaluationStrategy>,
    executor: Arc<dyn QueryExecutor>,
    semantic: SemanticModelManager,
    model_path: PathBuf,
}

impl FeatureEngineeringPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        agent: AgentLoop,
        judge: Judge,
        evaluator: Box<dyn EvaluationStrategy>,
        executor: Arc<dyn QueryExecutor>,
        semantic: SemanticModelManager,
        model_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            agent,
            judge,
            evaluator,
            executor,
            semantic,
            model_path: model_path.into(),
        }
    }

    /// Ask the model for one business question grounded in the semantic model.
    async fn make_business_question(&self, model_context: &str) -> Result<String> {
        let prompt = format!(
            "You are a data scientist preparing features for a forecasting model.\n\n\
             {model_context}\n\n\
             Propose exactly one concrete business question whose answer would \
             make a useful feature, phrased as a single sentence. Reply with \
             the question only."
        );

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            temperature: 0.7,
            max_tokens: Some(512),
            tools: vec![],
            stop: vec![],
        };

        let response = self.provider.complete(request).await?;
        Ok(response.message.content.trim().to_string())
    }

    pub async fn run(&self) -> Result<PipelineReport> {
        let run_id = Uuid::new_v4();
        info!(%run_id, model_path = %self.model_path.display(), "Starting pipeline run");

        let semantic_model = self
            .semantic
            .load(&self.model_path)
            .map_err(|e| Error::Semantic(e.to_string()))?;
        let context = semantic_model.prompt_context();

        let question = self.make_business_question(&context).await?;
        info!(%run_id, question = %question, "Business question generated");

        let task = format!("{question}{TASK_SUFFIX}");
        let outcome = self.agent.run(&task).await?;

        let Some(sql) = outcome.answer_text() else {
            warn!(%run_id, "Agent run ended without a final answer");
            return Ok(PipelineReport {
                run_id,
                question,
                sql: None,
                validation: vec![],
                metrics: BTreeMap::new(),
                status: PipelineStatus::Incomplete,
            });
        };

        let validation = self.judge.validate(&sql, &question, &context).await;
        if !Judge::passed(&validation) {
            return Ok(PipelineReport {
                run_id,
                question,
                sql: Some(sql),
                validation,
                metrics: BTreeMap::new(),
                status: PipelineStatus::Rejected,
            });
        }

        self.semantic
            .update_verified_queries(
                &self.model_path,
                &format!("verified_{}", run_id.simple()),
                &question,
                &sql,
                "judge",
            )
            .map_err(|e| Error::Semantic(e.to_string()))?;

        let result = self.executor.execute_query(&sql).await?;
        let metrics = self.evaluator.evaluate(&result);
        info!(%run_id, ?metrics, "Pipeline run completed");

        Ok(PipelineReport {
            run_id,
            question,
            sql: Some(sql),
            validation,
            metrics,
            status: PipelineStatus::Completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::Write;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::evaluation::BaselineEvaluation;
    use crate::validation::{SyntaxValidation, ValidationStrategy, Verdict};
    use quarry_core::error::{ProviderError, WarehouseError};
    use quarry_core::message::MessageToolCall;
    use quarry_core::provider::ProviderResponse;
    use quarry_core::tool::ToolRegistry;
    use quarry_core::warehouse::QueryResult;

    struct ScriptedProvider {
        responses: Mutex<VecDeque<ProviderResponse>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<ProviderResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }
        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ProviderError::MalformedResponse("script exhausted".into()))
        }
    }

    struct StubExecutor;

    #[async_trait]
    impl QueryExecutor for StubExecutor {
        async fn execute_query(
            &self,
            _sql: &str,
        ) -> std::result::Result<QueryResult, WarehouseError> {
            Ok(QueryResult {
                columns: vec!["revenue".into()],
                rows: vec![vec![json!(1.0)], vec![json!(3.0)]],
            })
        }
    }

    struct AlwaysInvalid;

    #[async_trait]
    impl ValidationStrategy for AlwaysInvalid {
        fn name(&self) -> &str {
            "always_invalid"
        }
        async fn validate(&self, _sql: &str, _question: &str, _ctx: &str) -> Verdict {
            Verdict::fail("rejected on principle")
        }
    }

    fn text(content: &str) -> ProviderResponse {
        ProviderResponse {
            message: Message::assistant(content),
            usage: None,
            model: "stub".into(),
            raw: json!({}),
        }
    }

    fn final_answer(sql: &str) -> ProviderResponse {
        ProviderResponse {
            message: Message::assistant_with_calls(
                "Done.",
                vec![MessageToolCall {
                    id: "c1".into(),
                    name: "final_answer".into(),
                    arguments: json!({"answer": sql}),
                }],
            ),
            usage: None,
            model: "stub".into(),
            raw: json!({}),
        }
    }

    fn sample_model() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "name: revenue\ntables:\n  - name: daily_revenue\n").unwrap();
        file
    }

    fn pipeline(
        question_provider: ScriptedProvider,
        agent_provider: ScriptedProvider,
        judge: Judge,
        model_path: &std::path::Path,
    ) -> FeatureEngineeringPipeline {
        let agent = AgentLoop::new(Arc::new(agent_provider), Arc::new(ToolRegistry::new()))
            .with_max_steps(2);
        FeatureEngineeringPipeline::new(
            Arc::new(question_provider),
            "stub-model",
            agent,
            judge,
            Box::new(BaselineEvaluation),
            Arc::new(StubExecutor),
            SemanticModelManager::new(),
            model_path,
        )
    }

    #[tokio::test]
    async fn accepted_query_is_recorded_and_evaluated() {
        let file = sample_model();
        let p = pipeline(
            ScriptedProvider::new(vec![text("What is the 7-day revenue average?")]),
            ScriptedProvider::new(vec![final_answer(
                "SELECT AVG(revenue) OVER (ORDER BY date ROWS 6 PRECEDING) FROM daily_revenue",
            )]),
            Judge::new(vec![Box::new(SyntaxValidation)]),
            file.path(),
        );

        let report = p.run().await.unwrap();
        assert_eq!(report.status, PipelineStatus::Completed);
        assert!(report.sql.as_ref().unwrap().starts_with("SELECT"));
        assert_eq!(report.metrics["mse"], 1.0);

        // The verified query landed back in the model file.
        let model = SemanticModelManager::new().load(file.path()).unwrap();
        assert_eq!(model.verified_queries.len(), 1);
        assert_eq!(model.verified_queries[0].verified_by, "judge");
    }

    #[tokio::test]
    async fn rejected_query_is_not_recorded() {
        let file = sample_model();
        let p = pipeline(
            ScriptedProvider::new(vec![text("A question")]),
            ScriptedProvider::new(vec![final_answer("SELECT 1")]),
            Judge::new(vec![Box::new(AlwaysInvalid)]),
            file.path(),
        );

        let report = p.run().await.unwrap();
        assert_eq!(report.status, PipelineStatus::Rejected);
        assert!(report.metrics.is_empty());

        let model = SemanticModelManager::new().load(file.path()).unwrap();
        assert!(model.verified_queries.is_empty());
    }

    #[tokio::test]
    async fn incomplete_agent_run_is_reported_as_incomplete() {
        let file = sample_model();
        // A zero-step budget forces the incomplete path without scripting.
        let agent_provider = ScriptedProvider::new(vec![]);
        let agent = AgentLoop::new(
            Arc::new(agent_provider),
            Arc::new(ToolRegistry::new()),
        )
        .with_max_steps(0);
        let p = FeatureEngineeringPipeline::new(
            Arc::new(ScriptedProvider::new(vec![text("A question")])),
            "stub-model",
            agent,
            Judge::new(vec![Box::new(SyntaxValidation)]),
            Box::new(BaselineEvaluation),
            Arc::new(StubExecutor),
            SemanticModelManager::new(),
            file.path(),
        );

        let report = p.run().await.unwrap();
        assert_eq!(report.status, PipelineStatus::Incomplete);
        assert!(report.sql.is_none());
        assert!(report.validation.is_empty());
    }
}
