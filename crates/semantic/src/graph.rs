//! Derivation graph between semantic model files.
//!
//! A directed edge `base -> derived` records that `derived` was generated by
//! extending `base`. Process-local bookkeeping; nothing is persisted.

use std::collections::BTreeMap;

use tracing::debug;

#[derive(Debug, Default)]
pub struct ModelGraph {
    edges: BTreeMap<String, Vec<String>>,
}

impl ModelGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge(&mut self, source: String, target: String) {
        debug!(%source, %target, "Recording model derivation");
        self.edges.entry(source).or_default().push(target);
    }

    /// Models derived directly from `source`.
    pub fn children(&self, source: &str) -> Vec<String> {
        self.edges.get(source).cloned().unwrap_or_default()
    }

    /// Models that are derived from nothing (graph roots).
    pub fn roots(&self) -> Vec<String> {
        let derived: std::collections::BTreeSet<&String> =
            self.edges.values().flatten().collect();
        self.edges
            .keys()
            .filter(|k| !derived.contains(k))
            .cloned()
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_derivation_chains() {
        let mut graph = ModelGraph::new();
        graph.add_edge("base.yaml".into(), "ext1.yaml".into());
        graph.add_edge("base.yaml".into(), "ext2.yaml".into());
        graph.add_edge("ext1.yaml".into(), "ext1b.yaml".into());

        assert_eq!(graph.children("base.yaml"), vec!["ext1.yaml", "ext2.yaml"]);
        assert_eq!(graph.roots(), vec!["base.yaml"]);
        assert_eq!(graph.edge_count(), 3);
        assert!(graph.children("ext2.yaml").is_empty());
    }
}
