//! Load, update, and derive semantic model files.

use std::path::Path;

use chrono::Utc;
use tracing::info;

use crate::graph::ModelGraph;
use crate::model::{SemanticModel, VerifiedQuery};
use crate::{Result, SemanticError};

/// Manages semantic model files and the derivation graph between them.
pub struct SemanticModelManager {
    graph: ModelGraph,
}

impl SemanticModelManager {
    pub fn new() -> Self {
        Self {
            graph: ModelGraph::new(),
        }
    }

    pub fn graph(&self) -> &ModelGraph {
        &self.graph
    }

    /// Read a semantic model file as raw YAML text.
    pub fn load_yaml(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SemanticError::NotFound(path.display().to_string()));
        }
        Ok(std::fs::read_to_string(path)?)
    }

    /// Load and parse a semantic model file.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<SemanticModel> {
        let yaml = self.load_yaml(&path)?;
        Ok(serde_yaml::from_str(&yaml)?)
    }

    /// Append a verified query to a model file, timestamped now.
    pub fn update_verified_queries(
        &self,
        path: impl AsRef<Path>,
        query_name: &str,
        question: &str,
        sql: &str,
        verified_by: &str,
    ) -> Result<()> {
        let path = path.as_ref();
        let mut model = self.load(path)?;
        model.verified_queries.push(VerifiedQuery {
            name: query_name.to_string(),
            question: question.to_string(),
            sql: sql.to_string(),
            verified_at: Utc::now().timestamp(),
            verified_by: verified_by.to_string(),
        });
        std::fs::write(path, serde_yaml::to_string(&model)?)?;
        info!(path = %path.display(), query = query_name, "Recorded verified query");
        Ok(())
    }

    /// Derive a new model from `original_path`: same content with `new_table`
    /// appended, the name suffixed `_extended`, and verified queries stripped
    /// (they were verified against the base model, not the derived one).
    pub fn create_extended_model(
        &mut self,
        original_path: impl AsRef<Path>,
        new_path: impl AsRef<Path>,
        new_table: serde_yaml::Value,
    ) -> Result<()> {
        let original_path = original_path.as_ref();
        let new_path = new_path.as_ref();

        let mut model = self.load(original_path)?;
        model.name = format!("{}_extended", model.name);
        model.tables.push(new_table);
        model.verified_queries.clear();

        std::fs::write(new_path, serde_yaml::to_string(&model)?)?;
        self.graph.add_edge(
            original_path.display().to_string(),
            new_path.display().to_string(),
        );
        info!(from = %original_path.display(), to = %new_path.display(), "Created derived semantic model");
        Ok(())
    }
}

impl Default for SemanticModelManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_sample() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "name: revenue\ntables:\n  - name: daily_revenue\n"
        )
        .unwrap();
        file
    }

    #[test]
    fn missing_file_is_not_found() {
        let manager = SemanticModelManager::new();
        let err = manager.load("/nonexistent/model.yaml").unwrap_err();
        assert!(matches!(err, SemanticError::NotFound(_)));
    }

    #[test]
    fn verified_query_appends_and_persists() {
        let file = write_sample();
        let manager = SemanticModelManager::new();
        manager
            .update_verified_queries(
                file.path(),
                "q1",
                "How much revenue?",
                "SELECT SUM(revenue) FROM daily_revenue",
                "judge",
            )
            .unwrap();

        let model = manager.load(file.path()).unwrap();
        assert_eq!(model.verified_queries.len(), 1);
        assert_eq!(model.verified_queries[0].verified_by, "judge");
        assert!(model.verified_queries[0].verified_at > 0);
    }

    #[test]
    fn extended_model_renames_and_strips_verified_queries() {
        let file = write_sample();
        let mut manager = SemanticModelManager::new();
        manager
            .update_verified_queries(file.path(), "q1", "?", "SELECT 1", "judge")
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let derived = dir.path().join("revenue_extended.yaml");
        let table: serde_yaml::Value =
            serde_yaml::from_str("name: revenue_features\n").unwrap();
        manager
            .create_extended_model(file.path(), &derived, table)
            .unwrap();

        let model = manager.load(&derived).unwrap();
        assert_eq!(model.name, "revenue_extended");
        assert_eq!(model.tables.len(), 2);
        assert!(model.verified_queries.is_empty());

        let children = manager
            .graph()
            .children(&file.path().display().to_string());
        assert_eq!(children, vec![derived.display().to_string()]);
    }
}
