//! Typed view of a semantic model document.
//!
//! Only the fields the workflow touches are modeled; table bodies and any
//! vendor extensions ride along as untyped YAML so a load/save cycle
//! preserves them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A SQL query the judge has accepted, recorded back into the model file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedQuery {
    pub name: String,
    pub question: String,
    pub sql: String,
    /// Epoch seconds at verification time.
    pub verified_at: i64,
    pub verified_by: String,
}

/// A semantic model document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticModel {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Table definitions, kept untyped: the workflow appends whole tables but
    /// never reaches into their structure.
    #[serde(default)]
    pub tables: Vec<serde_yaml::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verified_queries: Vec<VerifiedQuery>,

    /// Any other top-level keys, preserved verbatim on rewrite.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl SemanticModel {
    /// Render the model's description and verified queries as prompt context.
    pub fn prompt_context(&self) -> String {
        let mut out = format!("Semantic model: {}", self.name);
        if let Some(description) = &self.description {
            out.push('\n');
            out.push_str(description);
        }
        out.push_str(&format!("\nTables: {}", self.tables.len()));
        for query in &self.verified_queries {
            out.push_str(&format!(
                "\n\nVerified query '{}' answering \"{}\":\n{}",
                query.name, query.question, query.sql
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
name: revenue_timeseries
description: Daily revenue by product line
tables:
  - name: daily_revenue
    base_table:
      database: sales
      schema: public
      table: daily_revenue
custom_instructions: prefer ANSI SQL
verified_queries:
  - name: total_revenue
    question: What was total revenue last month?
    sql: SELECT SUM(revenue) FROM daily_revenue
    verified_at: 1724900000
    verified_by: system
";

    #[test]
    fn parses_known_fields_and_preserves_extras() {
        let model: SemanticModel = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(model.name, "revenue_timeseries");
        assert_eq!(model.tables.len(), 1);
        assert_eq!(model.verified_queries[0].name, "total_revenue");
        assert!(model.extra.contains_key("custom_instructions"));

        let rewritten = serde_yaml::to_string(&model).unwrap();
        assert!(rewritten.contains("custom_instructions"));
    }

    #[test]
    fn prompt_context_includes_verified_queries() {
        let model: SemanticModel = serde_yaml::from_str(SAMPLE).unwrap();
        let context = model.prompt_context();
        assert!(context.contains("revenue_timeseries"));
        assert!(context.contains("SELECT SUM(revenue)"));
        assert!(context.contains("What was total revenue last month?"));
    }
}
