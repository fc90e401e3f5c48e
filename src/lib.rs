//! # nestgraph
//!
//! Directed graphs whose nodes are partitioned into a tree of nested groups.
//!
//! Every edge is attributed to exactly one group: the nearest common
//! ancestor of the groups holding its two endpoints. Edge attribution is
//! maintained automatically as nodes move between groups and as groups are
//! re-parented.
//!
//! ## Core Contract
//!
//! 1. Every node belongs to exactly one group; new nodes start in the root
//! 2. Every edge's group is the nearest common ancestor of its endpoints' groups
//! 3. Element ids increase monotonically and are never reused
//! 4. Group member lists are the exact inverse of the elements' group backlinks
//!
//! ## Architecture
//!
//! ```text
//! Graph ─┬─ nodes / edges (arenas, intrusive adjacency lists)
//!        ├─ Hierarchy ── groups (arena, parent/child/sibling links)
//!        ├─ attribute pools (graph, node; group pool lives in Hierarchy)
//!        └─ reattribution on new_edge / move_node / set_group_parent
//!
//! emit::dot / emit::graphml ── read-only walkers over the above
//! ```
//!
//! ## Failure model
//!
//! Caller mistakes come back as [`GraphError`] or [`AttrError`]. Internal
//! inconsistencies are [`ConsistencyFault`]s and abort the operation with a
//! panic carrying the fault; [`Graph::check_consistency`] audits a graph
//! without panicking.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod attr;
pub mod config;
pub mod graph;
pub mod hierarchy;
pub mod check;
pub mod snapshot;
pub mod emit;

mod reattribute;

// Re-exports
pub use types::{ContainerId, NodeId, EdgeId, GroupId, Node, Edge, Group, ROOT_LEVEL};
pub use attr::{AttrError, AttrHandle, AttrKind, GraphAttr, NodeAttr, GroupAttr, GraphKind, NodeKind, GroupKind};
pub use config::GraphConfig;
pub use graph::{
    Graph, GraphError, Endpoint,
    Nodes, NodesRev, Outgoing, Incoming, GroupNodes, GroupEdges,
};
pub use hierarchy::{Hierarchy, Preorder, Children};
pub use check::ConsistencyFault;
pub use snapshot::{StructureSnapshot, GroupEntry, EdgeEntry};
pub use emit::{EmitConfig, EmitError, EmitSpec, Element};
pub use emit::dot::{write_dot, to_dot_string};
pub use emit::graphml::{write_graphml, to_graphml_string};

/// Schema version of [`StructureSnapshot`].
/// Increment on any change to the snapshot layout.
pub const SNAPSHOT_SCHEMA_VERSION: &str = "1.0.0";
