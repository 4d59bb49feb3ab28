//! Semantic model file management.
//!
//! A semantic model is a YAML document describing warehouse tables (names,
//! dimensions, measures) plus a `verified_queries` section of known-good SQL.
//! The workflow reads the model to ground prompts and writes back queries the
//! judge has accepted. Derived models (a base model extended with a new
//! feature table) are tracked in a [`ModelGraph`].

pub mod graph;
pub mod manager;
pub mod model;

pub use graph::ModelGraph;
pub use manager::SemanticModelManager;
pub use model::{SemanticModel, VerifiedQuery};

use thiserror::Error;

/// Failures while reading, parsing, or writing semantic model files.
#[derive(Debug, Error)]
pub enum SemanticError {
    #[error("Semantic model file not found: {0}")]
    NotFound(String),

    #[error("Failed to read semantic model: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse semantic model YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SemanticError>;
