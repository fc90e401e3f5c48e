//! Consistency faults and the structural audit.
//!
//! A [`ConsistencyFault`] means the graph's internal links contradict each
//! other. Client misuse never produces one; only a bug (or deliberate
//! corruption in a test) does.
//!
//! ## Escalation
//!
//! Internal routines return `Result<_, ConsistencyFault>`. Public mutating
//! operations escalate with [`raise`], which logs the fault and panics with
//! the fault itself as the payload:
//!
//! ```
//! use std::panic::catch_unwind;
//! use nestgraph::ConsistencyFault;
//!
//! let payload = catch_unwind(|| {
//!     std::panic::panic_any(ConsistencyFault::UnreachableGroup { group: 3 })
//! })
//! .unwrap_err();
//! assert!(payload.downcast_ref::<ConsistencyFault>().is_some());
//! ```
//!
//! [`Graph::check_consistency`] runs every check without panicking and is
//! what tests use to validate a graph after a sequence of operations.

use crate::graph::Graph;
use crate::types::{EdgeId, Group, GroupId, NodeId, ROOT_LEVEL};

/// Internal inconsistency detected in a graph.
///
/// `UnreachableGroup` carries a raw numeric id, since the offending record
/// is not reachable through normal lookup; every other variant carries
/// typed ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConsistencyFault {
    /// An ancestor walk reached a group with no parent before the root.
    #[error("Ancestor walk from group {from} reached a missing parent")]
    DisconnectedAncestor {
        /// Group whose parent was missing.
        from: GroupId,
    },

    /// An ancestor walk did not terminate within the group count.
    #[error("Parent links around group {group} form a cycle")]
    CycleDetected {
        /// Group at which the walk was cut off.
        group: GroupId,
    },

    /// The root group has a parent.
    #[error("The root group has a parent")]
    RootHasParent,

    /// A group's level is not its parent's level plus one.
    #[error("Group {group} has level {found}, expected {expected}")]
    LevelMismatch {
        /// Offending group.
        group: GroupId,
        /// Level derived from the parent.
        expected: u32,
        /// Level stored in the group.
        found: u32,
    },

    /// A group is listed as a child by a group that is not its parent.
    #[error("Group {child} is listed under {listed_by} but names another parent")]
    ParentMismatch {
        /// The child group.
        child: GroupId,
        /// The group whose child list holds it.
        listed_by: GroupId,
    },

    /// Sibling links of a child list disagree in the two directions.
    #[error("Child list of group {group} has inconsistent sibling links")]
    SiblingLinkBroken {
        /// Parent whose list is broken.
        group: GroupId,
    },

    /// A group cannot be reached from the root.
    #[error("Group {group} is not reachable from the root")]
    UnreachableGroup {
        /// Raw id of the unreachable group.
        group: u32,
    },

    /// A node sits in a group's member list but its backlink names another group.
    #[error("Node {node} is listed by group {listed_by} but belongs to {actual}")]
    NodeBacklink {
        /// The node.
        node: NodeId,
        /// Group whose member list holds it.
        listed_by: GroupId,
        /// Group its backlink names.
        actual: GroupId,
    },

    /// A node appears more than once across member lists.
    #[error("Node {node} is listed more than once")]
    DuplicateNode {
        /// The node.
        node: NodeId,
    },

    /// A node appears in no member list.
    #[error("Node {node} is not listed by any group")]
    OrphanNode {
        /// The node.
        node: NodeId,
    },

    /// The node member list of a group has inconsistent links.
    #[error("Node list of group {group} has inconsistent links")]
    NodeLinkBroken {
        /// The group.
        group: GroupId,
    },

    /// An edge sits in a group's edge list but is attributed elsewhere.
    #[error("Edge {edge} is listed by group {listed_by} but attributed elsewhere")]
    EdgeBacklink {
        /// The edge.
        edge: EdgeId,
        /// Group whose edge list holds it.
        listed_by: GroupId,
    },

    /// An edge appears more than once across group edge lists.
    #[error("Edge {edge} is listed more than once")]
    DuplicateEdge {
        /// The edge.
        edge: EdgeId,
    },

    /// An edge appears in no group edge list.
    #[error("Edge {edge} is not listed by any group")]
    OrphanEdge {
        /// The edge.
        edge: EdgeId,
    },

    /// The edge list of a group has inconsistent links.
    #[error("Edge list of group {group} has inconsistent links")]
    EdgeLinkBroken {
        /// The group.
        group: GroupId,
    },

    /// An edge has no group.
    #[error("Edge {edge} is not attributed to any group")]
    UnattributedEdge {
        /// The edge.
        edge: EdgeId,
    },

    /// An edge is attributed to a group other than its endpoints' nearest
    /// common ancestor.
    #[error("Edge {edge} is attributed to {found}, expected {expected}")]
    MisattributedEdge {
        /// The edge.
        edge: EdgeId,
        /// Nearest common ancestor of the endpoint groups.
        expected: GroupId,
        /// Group the edge is attributed to.
        found: GroupId,
    },

    /// An edge sits in an adjacency list of a node it is not incident to, or
    /// is missing from its endpoint's list.
    #[error("Edge {edge} and node {node} disagree about adjacency")]
    AdjacencyMismatch {
        /// The edge.
        edge: EdgeId,
        /// The node whose list is wrong.
        node: NodeId,
    },

    /// An adjacency list of a node has inconsistent links.
    #[error("Adjacency lists of node {node} have inconsistent links")]
    AdjacencyLinkBroken {
        /// The node.
        node: NodeId,
    },
}

/// Log a fault and panic with it as the payload.
#[cold]
#[track_caller]
pub(crate) fn raise(fault: ConsistencyFault) -> ! {
    tracing::error!(fault = %fault, "graph consistency violated");
    std::panic::panic_any(fault)
}

impl Graph {
    /// Audit every structural invariant of the graph.
    ///
    /// Checks, in order: the group tree (root, parent/child/sibling links,
    /// levels, reachability), node membership, edge membership, edge
    /// attribution against an independently computed common ancestor, and
    /// the adjacency lists. Returns the first fault found.
    pub fn check_consistency(&self) -> Result<(), ConsistencyFault> {
        let groups = self.tree.groups();
        self.check_tree(groups)?;
        self.check_node_membership(groups)?;
        self.check_edge_membership(groups)?;
        self.check_attribution(groups)?;
        self.check_adjacency()
    }

    fn check_tree(&self, groups: &[Group]) -> Result<(), ConsistencyFault> {
        let root = &groups[0];
        if root.parent.is_some() {
            return Err(ConsistencyFault::RootHasParent);
        }
        if root.level != ROOT_LEVEL {
            return Err(ConsistencyFault::LevelMismatch {
                group: root.id,
                expected: ROOT_LEVEL,
                found: root.level,
            });
        }

        let mut seen = vec![false; groups.len()];
        seen[0] = true;
        let mut stack = vec![root.id];

        while let Some(g) = stack.pop() {
            let parent = &groups[g.index()];
            let mut prev = None;
            let mut cursor = parent.first_child;

            while let Some(c) = cursor {
                let child = &groups[c.index()];
                if seen[c.index()] {
                    return Err(ConsistencyFault::CycleDetected { group: c });
                }
                if child.parent != Some(g) {
                    return Err(ConsistencyFault::ParentMismatch { child: c, listed_by: g });
                }
                if child.prev_sibling != prev {
                    return Err(ConsistencyFault::SiblingLinkBroken { group: g });
                }
                if child.level != parent.level + 1 {
                    return Err(ConsistencyFault::LevelMismatch {
                        group: c,
                        expected: parent.level + 1,
                        found: child.level,
                    });
                }

                seen[c.index()] = true;
                stack.push(c);
                prev = Some(c);
                cursor = child.next_sibling;
            }

            if parent.last_child != prev {
                return Err(ConsistencyFault::SiblingLinkBroken { group: g });
            }
        }

        match seen.iter().position(|s| !*s) {
            Some(index) => Err(ConsistencyFault::UnreachableGroup { group: index as u32 }),
            None => Ok(()),
        }
    }

    fn check_node_membership(&self, groups: &[Group]) -> Result<(), ConsistencyFault> {
        let mut claimed = vec![false; self.nodes.len()];

        for group in groups {
            let mut prev = None;
            let mut cursor = group.first_node;

            while let Some(n) = cursor {
                let node = &self.nodes[n.index()];
                if claimed[n.index()] {
                    return Err(ConsistencyFault::DuplicateNode { node: n });
                }
                if node.group != group.id {
                    return Err(ConsistencyFault::NodeBacklink {
                        node: n,
                        listed_by: group.id,
                        actual: node.group,
                    });
                }
                if node.prev_in_group != prev {
                    return Err(ConsistencyFault::NodeLinkBroken { group: group.id });
                }

                claimed[n.index()] = true;
                prev = Some(n);
                cursor = node.next_in_group;
            }

            if group.last_node != prev {
                return Err(ConsistencyFault::NodeLinkBroken { group: group.id });
            }
        }

        match claimed.iter().position(|c| !*c) {
            Some(index) => Err(ConsistencyFault::OrphanNode {
                node: self.nodes[index].id,
            }),
            None => Ok(()),
        }
    }

    fn check_edge_membership(&self, groups: &[Group]) -> Result<(), ConsistencyFault> {
        let mut claimed = vec![false; self.edges.len()];

        for group in groups {
            let mut prev = None;
            let mut cursor = group.first_edge;

            while let Some(e) = cursor {
                let edge = &self.edges[e.index()];
                if claimed[e.index()] {
                    return Err(ConsistencyFault::DuplicateEdge { edge: e });
                }
                if edge.group != Some(group.id) {
                    return Err(ConsistencyFault::EdgeBacklink { edge: e, listed_by: group.id });
                }
                if edge.prev_in_group != prev {
                    return Err(ConsistencyFault::EdgeLinkBroken { group: group.id });
                }

                claimed[e.index()] = true;
                prev = Some(e);
                cursor = edge.next_in_group;
            }
        }

        match claimed.iter().position(|c| !*c) {
            Some(index) => {
                let edge = &self.edges[index];
                Err(match edge.group {
                    Some(_) => ConsistencyFault::OrphanEdge { edge: edge.id },
                    None => ConsistencyFault::UnattributedEdge { edge: edge.id },
                })
            }
            None => Ok(()),
        }
    }

    fn check_attribution(&self, groups: &[Group]) -> Result<(), ConsistencyFault> {
        for edge in &self.edges {
            let found = edge
                .group
                .ok_or(ConsistencyFault::UnattributedEdge { edge: edge.id })?;
            let a = self.nodes[edge.source.index()].group;
            let b = self.nodes[edge.target.index()].group;
            let expected = ancestor_set_nca(groups, a, b);

            if found != expected {
                return Err(ConsistencyFault::MisattributedEdge {
                    edge: edge.id,
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }

    fn check_adjacency(&self) -> Result<(), ConsistencyFault> {
        let mut in_outgoing = vec![false; self.edges.len()];
        let mut in_incoming = vec![false; self.edges.len()];

        for node in &self.nodes {
            let mut prev = None;
            let mut cursor = node.first_outgoing;
            while let Some(e) = cursor {
                let edge = &self.edges[e.index()];
                if edge.source != node.id {
                    return Err(ConsistencyFault::AdjacencyMismatch { edge: e, node: node.id });
                }
                if in_outgoing[e.index()] || edge.prev_outgoing != prev {
                    return Err(ConsistencyFault::AdjacencyLinkBroken { node: node.id });
                }
                in_outgoing[e.index()] = true;
                prev = Some(e);
                cursor = edge.next_outgoing;
            }

            let mut prev = None;
            let mut cursor = node.first_incoming;
            while let Some(e) = cursor {
                let edge = &self.edges[e.index()];
                if edge.target != node.id {
                    return Err(ConsistencyFault::AdjacencyMismatch { edge: e, node: node.id });
                }
                if in_incoming[e.index()] || edge.prev_incoming != prev {
                    return Err(ConsistencyFault::AdjacencyLinkBroken { node: node.id });
                }
                in_incoming[e.index()] = true;
                prev = Some(e);
                cursor = edge.next_incoming;
            }
        }

        for edge in &self.edges {
            if !in_outgoing[edge.id.index()] {
                return Err(ConsistencyFault::AdjacencyMismatch {
                    edge: edge.id,
                    node: edge.source,
                });
            }
            if !in_incoming[edge.id.index()] {
                return Err(ConsistencyFault::AdjacencyMismatch {
                    edge: edge.id,
                    node: edge.target,
                });
            }
        }
        Ok(())
    }
}

/// Common ancestor by marking every ancestor of `a`, then walking up from
/// `b` to the first marked group. Assumes a validated tree.
fn ancestor_set_nca(groups: &[Group], a: GroupId, b: GroupId) -> GroupId {
    let mut marked = vec![false; groups.len()];
    let mut cursor = Some(a);
    while let Some(g) = cursor {
        marked[g.index()] = true;
        cursor = groups[g.index()].parent;
    }

    let mut current = b;
    while !marked[current.index()] {
        match groups[current.index()].parent {
            Some(p) => current = p,
            None => break,
        }
    }
    current
}
