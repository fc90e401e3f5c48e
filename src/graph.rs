//! Graph element store.
//!
//! A [`Graph`] owns its nodes, its edges and its group [`Hierarchy`]. All
//! records live in arenas indexed by their id; the links between them are
//! ids, never references.
//!
//! ## Node order
//!
//! Whole-graph node iteration walks the hierarchy in depth-first preorder
//! and, within each group, its member list from head to tail. Member lists
//! are head-inserted, so the most recently placed node of a group comes
//! first.
//!
//! ## Edges
//!
//! There is no whole-graph edge iterator. Edges are reached through the
//! adjacency lists of their endpoints ([`Graph::outgoing`],
//! [`Graph::incoming`]) or through the group they are attributed to
//! ([`Graph::group_edges`]).

use std::fmt;

use crate::attr::{sweep_slot, AttrError, GraphAttr, GraphKind, GroupAttr, NodeAttr, NodeKind, SlotPool, SlotValues};
use crate::check::{raise, ConsistencyFault};
use crate::config::GraphConfig;
use crate::hierarchy::Hierarchy;
use crate::types::{ContainerId, Edge, EdgeId, GroupId, Node, NodeId};

/// Which end of an edge an endpoint error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// The source node.
    Source,
    /// The destination node.
    Target,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Source => write!(f, "source"),
            Endpoint::Target => write!(f, "destination"),
        }
    }
}

/// Error type for graph and hierarchy operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// An edge endpoint is not a node of this graph.
    #[error("Invalid {endpoint} node {node}: not a node of graph {graph}")]
    InvalidEndpoint {
        /// Which endpoint was rejected.
        endpoint: Endpoint,
        /// The rejected node id.
        node: NodeId,
        /// The graph the edge was created in.
        graph: ContainerId,
    },

    /// The node id does not belong to this graph.
    #[error("Unknown node {0}")]
    UnknownNode(NodeId),

    /// The edge id does not belong to this graph.
    #[error("Unknown edge {0}")]
    UnknownEdge(EdgeId),

    /// The group id does not belong to this graph's hierarchy.
    #[error("Unknown group {0}")]
    UnknownGroup(GroupId),

    /// The root group has no parent and cannot be given one.
    #[error("The root group cannot be re-parented")]
    RootReparent,

    /// The new parent is the group itself or lies inside it.
    #[error("Group {group} cannot be nested in {parent}, which lies inside it")]
    CyclicNesting {
        /// The group being moved.
        group: GroupId,
        /// The rejected parent.
        parent: GroupId,
    },

    /// Attribute error.
    #[error(transparent)]
    Attr(#[from] AttrError),
}

/// A directed graph whose nodes are partitioned into nested groups.
///
/// Every edge is attributed to the nearest common ancestor of its endpoints'
/// groups. The attribution is maintained automatically across
/// [`new_edge`](Graph::new_edge), [`move_node`](Graph::move_node) and
/// [`set_group_parent`](Graph::set_group_parent).
///
/// ## Example
///
/// ```
/// use nestgraph::{Graph, GraphConfig};
///
/// let mut graph = Graph::new(GraphConfig::default());
/// let a = graph.new_group();
/// let b = graph.new_group_in(a).unwrap();
///
/// let n1 = graph.new_node();
/// let n2 = graph.new_node();
/// graph.move_node(n1, a).unwrap();
/// graph.move_node(n2, b).unwrap();
///
/// let e = graph.new_edge(n1, n2).unwrap();
/// assert_eq!(graph.edge(e).unwrap().group(), Some(a));
/// ```
///
/// A graph is not `Clone`: a copy would share the container id, and ids and
/// attribute handles issued by one would be accepted by the other.
///
/// ```compile_fail
/// let graph = nestgraph::Graph::default();
/// let copy = graph.clone();
/// ```
#[derive(Debug)]
pub struct Graph {
    pub(crate) id: ContainerId,
    config: GraphConfig,
    pub(crate) tree: Hierarchy,
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,
    graph_attrs: SlotPool<GraphKind>,
    graph_values: SlotValues,
    node_attrs: SlotPool<NodeKind>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(GraphConfig::default())
    }
}

impl Graph {
    /// Create an empty graph with an empty hierarchy (root group only).
    pub fn new(config: GraphConfig) -> Self {
        let id = ContainerId::fresh();
        tracing::debug!(
            graph = %id,
            graph_attrs = config.graph_attrs,
            node_attrs = config.node_attrs,
            group_attrs = config.group_attrs,
            "graph created"
        );

        Self {
            id,
            config,
            tree: Hierarchy::new(id, config.group_attrs),
            nodes: Vec::new(),
            edges: Vec::new(),
            graph_attrs: SlotPool::new(id, config.graph_attrs),
            graph_values: SlotValues::new(config.graph_attrs),
            node_attrs: SlotPool::new(id, config.node_attrs),
        }
    }

    /// Container id of the graph; node and edge ids carry it.
    pub fn id(&self) -> ContainerId {
        self.id
    }

    /// The configuration the graph was built with.
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// The group hierarchy, read-only. Groups are created and changed through
    /// the graph so node and edge links stay in step with the tree.
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.tree
    }

    /// The root group.
    pub fn root_group(&self) -> GroupId {
        self.tree.root()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Element creation
    // ─────────────────────────────────────────────────────────────────────

    /// Create a node in the root group.
    pub fn new_node(&mut self) -> NodeId {
        let id = NodeId::new(self.id, self.nodes.len());
        let root = self.tree.root();

        self.nodes.push(Node::new(id, root, self.node_attrs.capacity()));
        self.tree.link_node(&mut self.nodes, root, id);

        tracing::trace!(node = %id, "node created");
        id
    }

    /// Create a node directly inside `group`.
    pub fn new_node_in(&mut self, group: GroupId) -> Result<NodeId, GraphError> {
        self.tree.resolve(group)?;
        let id = self.new_node();
        self.move_node(id, group)?;
        Ok(id)
    }

    /// Create a directed edge from `source` to `target`.
    ///
    /// Parallel edges and self-loops are allowed. The edge is attributed
    /// before this returns.
    pub fn new_edge(&mut self, source: NodeId, target: NodeId) -> Result<EdgeId, GraphError> {
        self.endpoint(source, Endpoint::Source)?;
        self.endpoint(target, Endpoint::Target)?;

        let id = EdgeId::new(self.id, self.edges.len());
        self.edges.push(Edge::new(id, source, target));
        self.link_adjacency(id);
        self.reattribute(id);

        tracing::trace!(edge = %id, source = %source, target = %target, "edge created");
        Ok(id)
    }

    /// Create a group as a new first child of the root.
    pub fn new_group(&mut self) -> GroupId {
        self.tree.new_group()
    }

    /// Create a group and nest it in `parent`.
    pub fn new_group_in(&mut self, parent: GroupId) -> Result<GroupId, GraphError> {
        self.tree.resolve(parent)?;
        let group = self.tree.new_group();
        self.set_group_parent(group, parent)?;
        Ok(group)
    }

    fn endpoint(&self, node: NodeId, endpoint: Endpoint) -> Result<(), GraphError> {
        self.resolve_node(node)
            .map(|_| ())
            .map_err(|_| GraphError::InvalidEndpoint {
                endpoint,
                node,
                graph: self.id,
            })
    }

    fn link_adjacency(&mut self, id: EdgeId) {
        let (source, target) = {
            let edge = &self.edges[id.index()];
            (edge.source, edge.target)
        };

        let first_out = self.nodes[source.index()].first_outgoing;
        if let Some(f) = first_out {
            self.edges[f.index()].prev_outgoing = Some(id);
        }
        self.edges[id.index()].next_outgoing = first_out;
        self.nodes[source.index()].first_outgoing = Some(id);

        let first_in = self.nodes[target.index()].first_incoming;
        if let Some(f) = first_in {
            self.edges[f.index()].prev_incoming = Some(id);
        }
        self.edges[id.index()].next_incoming = first_in;
        self.nodes[target.index()].first_incoming = Some(id);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lookup
    // ─────────────────────────────────────────────────────────────────────

    pub(crate) fn resolve_node(&self, id: NodeId) -> Result<usize, GraphError> {
        if id.owner() == self.id && id.index() < self.nodes.len() {
            Ok(id.index())
        } else {
            Err(GraphError::UnknownNode(id))
        }
    }

    pub(crate) fn resolve_edge(&self, id: EdgeId) -> Result<usize, GraphError> {
        if id.owner() == self.id && id.index() < self.edges.len() {
            Ok(id.index())
        } else {
            Err(GraphError::UnknownEdge(id))
        }
    }

    /// Look up a node record.
    pub fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        let index = self.resolve_node(id)?;
        Ok(&self.nodes[index])
    }

    /// Look up an edge record.
    pub fn edge(&self, id: EdgeId) -> Result<&Edge, GraphError> {
        let index = self.resolve_edge(id)?;
        Ok(&self.edges[index])
    }

    /// Group a node belongs to.
    pub fn node_group(&self, id: NodeId) -> Result<GroupId, GraphError> {
        Ok(self.node(id)?.group)
    }

    /// Group an edge is attributed to.
    pub fn edge_group(&self, id: EdgeId) -> Result<GroupId, GraphError> {
        match self.edge(id)?.group {
            Some(group) => Ok(group),
            None => raise(ConsistencyFault::UnattributedEdge { edge: id }),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Traversal
    // ─────────────────────────────────────────────────────────────────────

    /// First node in graph order.
    pub fn first_node(&self) -> Option<NodeId> {
        self.first_node_from(Some(self.tree.root()))
    }

    /// Last node in graph order.
    pub fn last_node(&self) -> Option<NodeId> {
        self.last_node_from(Some(self.tree.last_group()))
    }

    /// Node after `node` in graph order.
    pub fn next_node(&self, node: NodeId) -> Result<Option<NodeId>, GraphError> {
        self.resolve_node(node)?;
        Ok(self.node_after(node))
    }

    /// Node before `node` in graph order.
    pub fn prev_node(&self, node: NodeId) -> Result<Option<NodeId>, GraphError> {
        self.resolve_node(node)?;
        Ok(self.node_before(node))
    }

    /// Iterate all nodes in graph order.
    pub fn nodes(&self) -> Nodes<'_> {
        Nodes {
            graph: self,
            next: self.first_node(),
        }
    }

    /// Iterate all nodes in reverse graph order.
    pub fn nodes_rev(&self) -> NodesRev<'_> {
        NodesRev {
            graph: self,
            next: self.last_node(),
        }
    }

    /// Iterate the edges leaving `node`, most recent first.
    pub fn outgoing(&self, node: NodeId) -> Result<Outgoing<'_>, GraphError> {
        let index = self.resolve_node(node)?;
        Ok(Outgoing {
            edges: &self.edges,
            next: self.nodes[index].first_outgoing,
        })
    }

    /// Iterate the edges entering `node`, most recent first.
    pub fn incoming(&self, node: NodeId) -> Result<Incoming<'_>, GraphError> {
        let index = self.resolve_node(node)?;
        Ok(Incoming {
            edges: &self.edges,
            next: self.nodes[index].first_incoming,
        })
    }

    /// Iterate the member nodes of `group`.
    pub fn group_nodes(&self, group: GroupId) -> Result<GroupNodes<'_>, GraphError> {
        let record = self.tree.group(group)?;
        Ok(GroupNodes {
            nodes: &self.nodes,
            front: record.first_node,
            back: record.last_node,
        })
    }

    /// Iterate the edges attributed to `group`.
    pub fn group_edges(&self, group: GroupId) -> Result<GroupEdges<'_>, GraphError> {
        let record = self.tree.group(group)?;
        Ok(GroupEdges {
            edges: &self.edges,
            next: record.first_edge,
        })
    }

    fn first_node_from(&self, mut cursor: Option<GroupId>) -> Option<NodeId> {
        while let Some(g) = cursor {
            if let Some(n) = self.tree.get(g).first_node {
                return Some(n);
            }
            cursor = self.tree.successor(g);
        }
        None
    }

    fn last_node_from(&self, mut cursor: Option<GroupId>) -> Option<NodeId> {
        while let Some(g) = cursor {
            if let Some(n) = self.tree.get(g).last_node {
                return Some(n);
            }
            cursor = self.tree.predecessor(g);
        }
        None
    }

    fn node_after(&self, node: NodeId) -> Option<NodeId> {
        let record = &self.nodes[node.index()];
        record
            .next_in_group
            .or_else(|| self.first_node_from(self.tree.successor(record.group)))
    }

    fn node_before(&self, node: NodeId) -> Option<NodeId> {
        let record = &self.nodes[node.index()];
        record
            .prev_in_group
            .or_else(|| self.last_node_from(self.tree.predecessor(record.group)))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Graph attributes
    // ─────────────────────────────────────────────────────────────────────

    /// Allocate a graph-level string attribute.
    pub fn new_graph_attr(&mut self) -> Result<GraphAttr, AttrError> {
        self.graph_attrs.allocate()
    }

    /// Release a graph-level attribute and clear its value.
    pub fn release_graph_attr(&mut self, attr: &mut GraphAttr) -> Result<(), AttrError> {
        let slot = self.graph_attrs.release(attr)?;
        sweep_slot(slot, std::iter::once(&mut self.graph_values));
        Ok(())
    }

    /// Set a graph-level attribute.
    pub fn set_graph_attr(&mut self, attr: &GraphAttr, value: impl Into<String>) -> Result<(), AttrError> {
        self.graph_attrs.set(&mut self.graph_values, attr, value.into())
    }

    /// Get a graph-level attribute.
    pub fn graph_attr(&self, attr: &GraphAttr) -> Result<&str, AttrError> {
        self.graph_attrs.get(&self.graph_values, attr)
    }

    /// Check whether a graph-level attribute is set.
    pub fn is_graph_attr_set(&self, attr: &GraphAttr) -> Result<bool, AttrError> {
        self.graph_attrs.is_set(&self.graph_values, attr)
    }

    /// Remove a graph-level attribute value.
    pub fn remove_graph_attr(&mut self, attr: &GraphAttr) -> Result<(), AttrError> {
        self.graph_attrs.remove(&mut self.graph_values, attr)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Node attributes
    // ─────────────────────────────────────────────────────────────────────

    /// Allocate a node string attribute.
    pub fn new_node_attr(&mut self) -> Result<NodeAttr, AttrError> {
        self.node_attrs.allocate()
    }

    /// Release a node attribute, clearing it on every node.
    pub fn release_node_attr(&mut self, attr: &mut NodeAttr) -> Result<(), AttrError> {
        let slot = self.node_attrs.release(attr)?;
        sweep_slot(slot, self.nodes.iter_mut().map(|n| &mut n.attrs));
        Ok(())
    }

    /// Set a node attribute.
    pub fn set_node_attr(
        &mut self,
        node: NodeId,
        attr: &NodeAttr,
        value: impl Into<String>,
    ) -> Result<(), AttrError> {
        let index = self.attr_target(node)?;
        self.node_attrs.set(&mut self.nodes[index].attrs, attr, value.into())
    }

    /// Get a node attribute.
    pub fn node_attr(&self, node: NodeId, attr: &NodeAttr) -> Result<&str, AttrError> {
        let index = self.attr_target(node)?;
        self.node_attrs.get(&self.nodes[index].attrs, attr)
    }

    /// Check whether a node attribute is set.
    pub fn is_node_attr_set(&self, node: NodeId, attr: &NodeAttr) -> Result<bool, AttrError> {
        let index = self.attr_target(node)?;
        self.node_attrs.is_set(&self.nodes[index].attrs, attr)
    }

    /// Remove a node attribute value from one node.
    pub fn remove_node_attr(&mut self, node: NodeId, attr: &NodeAttr) -> Result<(), AttrError> {
        let index = self.attr_target(node)?;
        self.node_attrs.remove(&mut self.nodes[index].attrs, attr)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Group attributes
    // ─────────────────────────────────────────────────────────────────────

    /// Allocate a group string attribute.
    pub fn new_group_attr(&mut self) -> Result<GroupAttr, AttrError> {
        self.tree.new_group_attr()
    }

    /// Release a group attribute, clearing it on every group.
    pub fn release_group_attr(&mut self, attr: &mut GroupAttr) -> Result<(), AttrError> {
        self.tree.release_group_attr(attr)
    }

    /// Set a group attribute. Read it back through [`Hierarchy::group_attr`].
    pub fn set_group_attr(
        &mut self,
        group: GroupId,
        attr: &GroupAttr,
        value: impl Into<String>,
    ) -> Result<(), AttrError> {
        self.tree.set_group_attr(group, attr, value)
    }

    /// Remove a group attribute value from one group.
    pub fn remove_group_attr(&mut self, group: GroupId, attr: &GroupAttr) -> Result<(), AttrError> {
        self.tree.remove_group_attr(group, attr)
    }

    fn attr_target(&self, node: NodeId) -> Result<usize, AttrError> {
        self.resolve_node(node).map_err(|_| AttrError::UnknownElement {
            kind: "node",
            id: node.id(),
            owner: self.id,
        })
    }
}

/// Iterator over all nodes in graph order.
#[derive(Debug, Clone)]
pub struct Nodes<'a> {
    graph: &'a Graph,
    next: Option<NodeId>,
}

impl Iterator for Nodes<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.graph.node_after(current);
        Some(current)
    }
}

/// Iterator over all nodes in reverse graph order.
#[derive(Debug, Clone)]
pub struct NodesRev<'a> {
    graph: &'a Graph,
    next: Option<NodeId>,
}

impl Iterator for NodesRev<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.graph.node_before(current);
        Some(current)
    }
}

/// Iterator over a node's outgoing edges.
#[derive(Debug, Clone)]
pub struct Outgoing<'a> {
    edges: &'a [Edge],
    next: Option<EdgeId>,
}

impl Iterator for Outgoing<'_> {
    type Item = EdgeId;

    fn next(&mut self) -> Option<EdgeId> {
        let current = self.next?;
        self.next = self.edges[current.index()].next_outgoing;
        Some(current)
    }
}

/// Iterator over a node's incoming edges.
#[derive(Debug, Clone)]
pub struct Incoming<'a> {
    edges: &'a [Edge],
    next: Option<EdgeId>,
}

impl Iterator for Incoming<'_> {
    type Item = EdgeId;

    fn next(&mut self) -> Option<EdgeId> {
        let current = self.next?;
        self.next = self.edges[current.index()].next_incoming;
        Some(current)
    }
}

/// Iterator over the member nodes of one group. Double-ended.
#[derive(Debug, Clone)]
pub struct GroupNodes<'a> {
    nodes: &'a [Node],
    front: Option<NodeId>,
    back: Option<NodeId>,
}

impl Iterator for GroupNodes<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.front?;
        if self.back == Some(current) {
            self.front = None;
            self.back = None;
        } else {
            self.front = self.nodes[current.index()].next_in_group;
        }
        Some(current)
    }
}

impl DoubleEndedIterator for GroupNodes<'_> {
    fn next_back(&mut self) -> Option<NodeId> {
        let current = self.back?;
        if self.front == Some(current) {
            self.front = None;
            self.back = None;
        } else {
            self.back = self.nodes[current.index()].prev_in_group;
        }
        Some(current)
    }
}

/// Iterator over the edges attributed to one group.
#[derive(Debug, Clone)]
pub struct GroupEdges<'a> {
    edges: &'a [Edge],
    next: Option<EdgeId>,
}

impl Iterator for GroupEdges<'_> {
    type Item = EdgeId;

    fn next(&mut self) -> Option<EdgeId> {
        let current = self.next?;
        self.next = self.edges[current.index()].next_in_group;
        Some(current)
    }
}
