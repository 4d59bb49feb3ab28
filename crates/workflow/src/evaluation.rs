//! Result-set evaluation strategies.

use std::collections::BTreeMap;

use tracing::{info, warn};

use quarry_core::warehouse::QueryResult;

/// Scores a query's result set into named metrics.
pub trait EvaluationStrategy: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(&self, result: &QueryResult) -> BTreeMap<String, f64>;
}

/// Mean-predictor baseline: the MSE of always predicting the mean of the
/// target column (the last numeric column in the result). A feature set is
/// only interesting if a model can beat this number.
pub struct BaselineEvaluation;

impl EvaluationStrategy for BaselineEvaluation {
    fn name(&self) -> &str {
        "baseline"
    }

    fn evaluate(&self, result: &QueryResult) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();

        let target = result
            .columns
            .iter()
            .rev()
            .filter_map(|name| {
                result
                    .numeric_column(name)
                    .filter(|values| !values.is_empty())
                    .map(|values| (name.clone(), values))
            })
            .next();

        let Some((column, values)) = target else {
            warn!("No numeric column found; nothing to evaluate");
            return metrics;
        };

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let mse = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        info!(column = %column, rows = values.len(), mse, "Baseline evaluation");
        metrics.insert("mse".into(), mse);
        metrics.insert("rows".into(), n);
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mse_of_constant_column_is_zero() {
        let result = QueryResult {
            columns: vec!["revenue".into()],
            rows: vec![vec![json!(5.0)], vec![json!(5.0)], vec![json!(5.0)]],
        };
        let metrics = BaselineEvaluation.evaluate(&result);
        assert_eq!(metrics["mse"], 0.0);
        assert_eq!(metrics["rows"], 3.0);
    }

    #[test]
    fn targets_the_last_numeric_column() {
        let result = QueryResult {
            columns: vec!["date".into(), "revenue".into()],
            rows: vec![
                vec![json!("2024-01-01"), json!(1.0)],
                vec![json!("2024-01-02"), json!(3.0)],
            ],
        };
        // mean 2.0, squared errors 1.0 each
        let metrics = BaselineEvaluation.evaluate(&result);
        assert_eq!(metrics["mse"], 1.0);
    }

    #[test]
    fn empty_result_yields_no_metrics() {
        let result = QueryResult {
            columns: vec!["date".into()],
            rows: vec![],
        };
        assert!(BaselineEvaluation.evaluate(&result).is_empty());
    }
}
