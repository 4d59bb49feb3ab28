//! SQL validation strategies and the judge that chains them.
//!
//! Strategies run in a fixed order (syntax, execution, semantic) and the
//! judge short-circuits on the first failure. A strategy never returns an
//! error: anything that goes wrong becomes an invalid [`Verdict`] so the
//! caller always gets a per-strategy report.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use quarry_core::message::Message;
use quarry_core::provider::{Provider, ProviderRequest};
use quarry_core::warehouse::QueryExecutor;

/// One strategy's pass/fail decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub valid: bool,
    pub message: String,
}

impl Verdict {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            valid: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

/// A verdict tagged with the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyReport {
    pub strategy: String,
    pub verdict: Verdict,
}

/// A single way of judging a generated SQL query.
#[async_trait]
pub trait ValidationStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Judge `sql` against the question it should answer and the semantic
    /// model context it was generated from.
    async fn validate(&self, sql: &str, question: &str, model_context: &str) -> Verdict;
}

/// Lightweight statement-shape check: catches obviously broken output before
/// anything touches the warehouse.
pub struct SyntaxValidation;

const STATEMENT_OPENERS: &[&str] = &["SELECT", "WITH", "CREATE", "INSERT"];

#[async_trait]
impl ValidationStrategy for SyntaxValidation {
    fn name(&self) -> &str {
        "syntax"
    }

    async fn validate(&self, sql: &str, _question: &str, _model_context: &str) -> Verdict {
        let trimmed = sql.trim();
        if trimmed.is_empty() {
            return Verdict::fail("Empty SQL statement");
        }

        let upper = trimmed.to_uppercase();
        if !STATEMENT_OPENERS.iter().any(|kw| upper.starts_with(kw)) {
            return Verdict::fail(format!(
                "Statement does not start with one of {}",
                STATEMENT_OPENERS.join(", ")
            ));
        }

        let opens = trimmed.matches('(').count();
        let closes = trimmed.matches(')').count();
        if opens != closes {
            return Verdict::fail(format!(
                "Unbalanced parentheses: {opens} open vs {closes} close"
            ));
        }

        Verdict::pass("Syntax validation passed")
    }
}

/// Round-trips the query through the warehouse planner with `EXPLAIN`: the
/// statement is fully compiled without paying for a real execution.
pub struct ExecutionValidation {
    executor: Arc<dyn QueryExecutor>,
}

impl ExecutionValidation {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ValidationStrategy for ExecutionValidation {
    fn name(&self) -> &str {
        "execution"
    }

    async fn validate(&self, sql: &str, _question: &str, _model_context: &str) -> Verdict {
        match self.executor.execute_query(&format!("EXPLAIN {sql}")).await {
            Ok(_) => Verdict::pass("Query compiled successfully"),
            Err(e) => Verdict::fail(format!("Execution failed: {e}")),
        }
    }
}

/// Asks a model whether the query plausibly answers the question, given the
/// semantic model context. The reply must start with VALID or INVALID.
pub struct SemanticValidation {
    provider: Arc<dyn Provider>,
    model: String,
}

impl SemanticValidation {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

#[async_trait]
impl ValidationStrategy for SemanticValidation {
    fn name(&self) -> &str {
        "semantic"
    }

    async fn validate(&self, sql: &str, question: &str, model_context: &str) -> Verdict {
        let prompt = format!(
            "You are judging whether a SQL query answers a business question.\n\n\
             {model_context}\n\n\
             Question:\n{question}\n\n\
             Query:\n{sql}\n\n\
             Reply with exactly one line starting with VALID or INVALID, \
             followed by a short justification."
        );

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            temperature: 0.0,
            max_tokens: Some(512),
            tools: vec![],
            stop: vec![],
        };

        match self.provider.complete(request).await {
            Ok(response) => {
                let reply = response.message.content.trim().to_string();
                if reply.to_uppercase().starts_with("VALID") {
                    Verdict::pass(reply)
                } else {
                    Verdict::fail(reply)
                }
            }
            Err(e) => Verdict::fail(format!("Judge call failed: {e}")),
        }
    }
}

/// Chains validation strategies in a fixed order, stopping at the first
/// failure.
pub struct Judge {
    strategies: Vec<Box<dyn ValidationStrategy>>,
}

impl Judge {
    pub fn new(strategies: Vec<Box<dyn ValidationStrategy>>) -> Self {
        Self { strategies }
    }

    /// The standard chain: syntax, execution, semantic.
    pub fn standard(
        executor: Arc<dyn QueryExecutor>,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
    ) -> Self {
        Self::new(vec![
            Box::new(SyntaxValidation),
            Box::new(ExecutionValidation::new(executor)),
            Box::new(SemanticValidation::new(provider, model)),
        ])
    }

    pub async fn validate(
        &self,
        sql: &str,
        question: &str,
        model_context: &str,
    ) -> Vec<StrategyReport> {
        let mut reports = Vec::new();
        for strategy in &self.strategies {
            let verdict = strategy.validate(sql, question, model_context).await;
            let valid = verdict.valid;
            reports.push(StrategyReport {
                strategy: strategy.name().to_string(),
                verdict,
            });
            if !valid {
                error!(
                    strategy = strategy.name(),
                    message = %reports.last().map(|r| r.verdict.message.as_str()).unwrap_or_default(),
                    "Validation failed"
                );
                return reports;
            }
        }
        info!("All validations passed");
        reports
    }

    /// Whether every strategy in `reports` passed.
    pub fn passed(reports: &[StrategyReport]) -> bool {
        !reports.is_empty() && reports.iter().all(|r| r.verdict.valid)
    }
}
