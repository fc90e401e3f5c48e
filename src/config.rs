//! Graph construction parameters.

use serde::{Deserialize, Serialize};

/// Sizes of the attribute pools of a graph.
///
/// Pools are fixed for the lifetime of the graph: a graph built with
/// `node_attrs = 2` can hold at most two node attributes allocated at once.
///
/// ## Example
///
/// ```
/// use nestgraph::GraphConfig;
///
/// let config = GraphConfig::from_json(r#"{"node_attrs": 2}"#).unwrap();
/// assert_eq!(config.node_attrs, 2);
/// assert_eq!(config.group_attrs, 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Number of graph-level string attributes.
    pub graph_attrs: usize,
    /// Number of per-node string attributes.
    pub node_attrs: usize,
    /// Number of per-group string attributes.
    pub group_attrs: usize,
}

impl GraphConfig {
    /// Create a configuration with explicit pool sizes.
    pub fn new(graph_attrs: usize, node_attrs: usize, group_attrs: usize) -> Self {
        Self {
            graph_attrs,
            node_attrs,
            group_attrs,
        }
    }

    /// One slot per kind, enough for a label on everything.
    pub fn labelled() -> Self {
        Self::new(1, 1, 1)
    }

    /// Set the graph-level pool size.
    pub fn with_graph_attrs(mut self, n: usize) -> Self {
        self.graph_attrs = n;
        self
    }

    /// Set the node pool size.
    pub fn with_node_attrs(mut self, n: usize) -> Self {
        self.node_attrs = n;
        self
    }

    /// Set the group pool size.
    pub fn with_group_attrs(mut self, n: usize) -> Self {
        self.group_attrs = n;
        self
    }

    /// Parse a configuration from JSON. Missing fields default to zero.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_empty_pools() {
        let config = GraphConfig::default();
        assert_eq!(config, GraphConfig::new(0, 0, 0));
    }

    #[test]
    fn test_builder() {
        let config = GraphConfig::default().with_node_attrs(3).with_group_attrs(1);
        assert_eq!(config.graph_attrs, 0);
        assert_eq!(config.node_attrs, 3);
        assert_eq!(config.group_attrs, 1);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = GraphConfig::labelled();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(GraphConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_json_rejects_garbage() {
        assert!(GraphConfig::from_json("{\"node_attrs\": -1}").is_err());
    }
}
