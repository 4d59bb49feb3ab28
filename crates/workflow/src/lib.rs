//! The workflow around the agent loop: judge a generated query, record it as
//! verified, and score its result set.

pub mod evaluation;
pub mod pipeline;
pub mod validation;

pub use evaluation::{BaselineEvaluation, EvaluationStrategy};
pub use pipeline::{FeatureEngineeringPipeline, PipelineReport, PipelineStatus};
pub use validation::{
    ExecutionValidation, Judge, SemanticValidation, StrategyReport, SyntaxValidation,
    ValidationStrategy, Verdict,
};
