//! Structure snapshots and fingerprints.
//!
//! A [`StructureSnapshot`] is a plain-data copy of everything that defines a
//! graph's shape: the group tree, member lists in list order, and edge
//! attribution. Attribute values are not part of it.
//!
//! ## Determinism
//!
//! - Groups serialize in preorder, member lists in list order
//! - Ids are the numeric ids only, so structurally identical graphs built
//!   the same way fingerprint identically
//! - The fingerprint is xxh64 (seed 0) over the snapshot's JSON encoding

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

use crate::graph::Graph;
use crate::types::{EdgeId, NodeId};
use crate::SNAPSHOT_SCHEMA_VERSION;

/// One group of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEntry {
    /// Group id.
    pub id: u32,
    /// Parent group id, absent for the root.
    pub parent: Option<u32>,
    /// Depth in the tree.
    pub level: u32,
    /// Child group ids in list order.
    pub children: Vec<u32>,
    /// Member node ids in list order.
    pub nodes: Vec<u32>,
    /// Attributed edge ids in list order.
    pub edges: Vec<u32>,
}

/// One edge of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeEntry {
    /// Edge id.
    pub id: u32,
    /// Source node id.
    pub source: u32,
    /// Target node id.
    pub target: u32,
    /// Attributed group id.
    pub group: Option<u32>,
}

/// Plain-data copy of a graph's structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureSnapshot {
    /// Layout version, [`SNAPSHOT_SCHEMA_VERSION`].
    pub schema_version: String,
    /// Number of nodes.
    pub node_count: usize,
    /// Groups in preorder.
    pub groups: Vec<GroupEntry>,
    /// Edges by id.
    pub edges: Vec<EdgeEntry>,
}

impl StructureSnapshot {
    /// Canonical JSON bytes of the snapshot.
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        // Plain structs with string keys only; encoding cannot fail.
        serde_json::to_vec(self).expect("snapshot serialization failed")
    }

    /// 64-bit fingerprint.
    pub fn fingerprint_u64(&self) -> u64 {
        xxh64(&self.to_canonical_bytes(), 0)
    }

    /// Fingerprint as 16 lowercase hex digits.
    pub fn fingerprint(&self) -> String {
        format!("{:016x}", self.fingerprint_u64())
    }
}

impl Graph {
    /// Capture the current structure.
    pub fn snapshot(&self) -> StructureSnapshot {
        let tree = self.hierarchy();

        let groups = tree
            .preorder()
            .map(|g| {
                let record = tree.get(g);
                let mut children = Vec::new();
                let mut cursor = record.first_child;
                while let Some(c) = cursor {
                    children.push(c.id());
                    cursor = tree.get(c).next_sibling;
                }

                GroupEntry {
                    id: g.id(),
                    parent: record.parent.map(|p| p.id()),
                    level: record.level,
                    children,
                    nodes: self.members(record.first_node),
                    edges: self.attributed(record.first_edge),
                }
            })
            .collect();

        let edges = self
            .edges
            .iter()
            .map(|e| EdgeEntry {
                id: e.id.id(),
                source: e.source.id(),
                target: e.target.id(),
                group: e.group.map(|g| g.id()),
            })
            .collect();

        StructureSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION.to_string(),
            node_count: self.node_count(),
            groups,
            edges,
        }
    }

    /// Fingerprint of the current structure; see [`StructureSnapshot::fingerprint`].
    pub fn fingerprint(&self) -> String {
        self.snapshot().fingerprint()
    }

    fn members(&self, mut cursor: Option<NodeId>) -> Vec<u32> {
        let mut out = Vec::new();
        while let Some(n) = cursor {
            out.push(n.id());
            cursor = self.nodes[n.index()].next_in_group;
        }
        out
    }

    fn attributed(&self, mut cursor: Option<EdgeId>) -> Vec<u32> {
        let mut out = Vec::new();
        while let Some(e) = cursor {
            out.push(e.id());
            cursor = self.edges[e.index()].next_in_group;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;

    fn build() -> Graph {
        let mut graph = Graph::new(GraphConfig::labelled());
        let a = graph.new_group();
        let b = graph.new_group_in(a).unwrap();
        let n1 = graph.new_node_in(a).unwrap();
        let n2 = graph.new_node_in(b).unwrap();
        graph.new_edge(n1, n2).unwrap();
        graph
    }

    #[test]
    fn test_snapshot_shape() {
        let snap = build().snapshot();
        assert_eq!(snap.schema_version, SNAPSHOT_SCHEMA_VERSION);
        assert_eq!(snap.node_count, 2);
        assert_eq!(snap.groups.len(), 3);
        assert_eq!(snap.groups[0].parent, None);
        assert_eq!(snap.groups[0].children, vec![1]);
        assert_eq!(snap.groups[1].nodes, vec![0]);
        assert_eq!(snap.groups[1].edges, vec![0]);
        assert_eq!(snap.groups[2].level, 2);
        assert_eq!(snap.edges[0].group, Some(1));
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let f1 = build().fingerprint();
        let f2 = build().fingerprint();
        assert_eq!(f1, f2);
        assert_eq!(f1.len(), 16);
    }

    #[test]
    fn test_fingerprint_tracks_structure() {
        let mut graph = build();
        let before = graph.fingerprint();
        let n = graph.new_node();
        assert_ne!(graph.fingerprint(), before);

        let root = graph.root_group();
        let after_add = graph.fingerprint();
        graph.move_node(n, root).unwrap();
        assert_eq!(graph.fingerprint(), after_add);
    }

    #[test]
    fn test_attributes_do_not_affect_fingerprint() {
        let mut graph = build();
        let before = graph.fingerprint();
        let attr = graph.new_node_attr().unwrap();
        let n = graph.first_node().unwrap();
        graph.set_node_attr(n, &attr, "label").unwrap();
        assert_eq!(graph.fingerprint(), before);
    }
}
