//! Reattribution engine.
//!
//! Keeps every edge attributed to the nearest common ancestor (NCA) of its
//! endpoints' groups. Node moves reattribute the moved node's edges, and
//! group reparenting reattributes every edge touching the moved subtree.
//! Edges outside those sets cannot change attribution, since the ancestor
//! chains of their endpoints are untouched.

use crate::check::{raise, ConsistencyFault};
use crate::graph::{Graph, GraphError};
use crate::hierarchy::Hierarchy;
use crate::types::{EdgeId, GroupId, NodeId};

impl Hierarchy {
    /// Level-synchronized nearest common ancestor of `a` and `b`.
    ///
    /// The walk is bounded by the group count; exceeding it means the parent
    /// links contain a cycle.
    pub(crate) fn nca(&self, a: GroupId, b: GroupId) -> Result<GroupId, ConsistencyFault> {
        let limit = self.group_count();
        let mut steps = 0;
        let (mut a, mut b) = (a, b);

        let up = |g: GroupId, steps: &mut usize| -> Result<GroupId, ConsistencyFault> {
            *steps += 1;
            if *steps > 2 * limit {
                return Err(ConsistencyFault::CycleDetected { group: g });
            }
            self.get(g)
                .parent
                .ok_or(ConsistencyFault::DisconnectedAncestor { from: g })
        };

        while self.get(a).level > self.get(b).level {
            a = up(a, &mut steps)?;
        }
        while self.get(b).level > self.get(a).level {
            b = up(b, &mut steps)?;
        }
        while a != b {
            a = up(a, &mut steps)?;
            b = up(b, &mut steps)?;
        }

        Ok(a)
    }

    /// Public NCA query.
    ///
    /// # Panics
    ///
    /// Panics with a [`ConsistencyFault`] payload if the hierarchy is corrupted.
    pub fn common_ancestor(&self, a: GroupId, b: GroupId) -> Result<GroupId, GraphError> {
        self.resolve(a)?;
        self.resolve(b)?;
        Ok(self.nca(a, b).unwrap_or_else(|fault| raise(fault)))
    }
}

impl Graph {
    /// Move `node` into `target`, then reattribute its incident edges.
    ///
    /// Moving a node into the group it already belongs to changes nothing.
    ///
    /// # Panics
    ///
    /// Panics with a [`ConsistencyFault`] payload if an incident edge is
    /// unattributed or the hierarchy is corrupted.
    pub fn move_node(&mut self, node: NodeId, target: GroupId) -> Result<(), GraphError> {
        self.resolve_node(node)?;
        self.tree.resolve(target)?;

        let from = self.nodes[node.index()].group;
        if from == target {
            return Ok(());
        }

        let incident = self.incident_edges(node).unwrap_or_else(|fault| raise(fault));

        self.tree.unlink_node(&mut self.nodes, node);
        self.tree.link_node(&mut self.nodes, target, node);
        tracing::trace!(node = %node, from = %from, to = %target, "node moved");

        for edge in incident {
            self.reattribute(edge);
        }
        Ok(())
    }

    /// Nest `group` inside `parent`, then reattribute edges touching the subtree.
    ///
    /// Reparenting to the current parent changes nothing.
    ///
    /// # Panics
    ///
    /// Panics with a [`ConsistencyFault`] payload if the hierarchy is corrupted.
    pub fn set_group_parent(&mut self, group: GroupId, parent: GroupId) -> Result<(), GraphError> {
        self.tree.resolve(group)?;
        self.tree.resolve(parent)?;

        let Some(current) = self.tree.get(group).parent else {
            tracing::warn!(group = %group, "rejected reparenting of the root group");
            return Err(GraphError::RootReparent);
        };

        if self.tree.within(parent, group) {
            tracing::warn!(group = %group, parent = %parent, "rejected cyclic nesting");
            return Err(GraphError::CyclicNesting { group, parent });
        }

        if current == parent {
            return Ok(());
        }

        self.tree.detach_group(group);
        self.tree.attach_group(group, parent);
        self.tree.relevel(group);
        tracing::trace!(group = %group, from = %current, to = %parent, "group reparented");

        let mut touched = Vec::new();
        for g in self.tree.subtree(group) {
            let mut member = self.tree.get(g).first_node;
            while let Some(n) = member {
                touched.extend(self.incident_edges(n).unwrap_or_else(|fault| raise(fault)));
                member = self.nodes[n.index()].next_in_group;
            }
        }
        touched.sort_unstable();
        touched.dedup();

        for edge in touched {
            self.reattribute(edge);
        }
        Ok(())
    }

    /// Recompute the attribution of one edge.
    ///
    /// An edge whose group is unchanged is left where it is in that group's
    /// edge list. Only an edge that changes group is unlinked and
    /// head-inserted into its new group, so moves that leave an attribution
    /// alone never reorder group edge lists or emitter output.
    pub(crate) fn reattribute(&mut self, edge: EdgeId) {
        let (source, target, current) = {
            let record = &self.edges[edge.index()];
            (record.source, record.target, record.group)
        };
        let a = self.nodes[source.index()].group;
        let b = self.nodes[target.index()].group;

        let group = self.tree.nca(a, b).unwrap_or_else(|fault| raise(fault));
        if current == Some(group) {
            return;
        }

        self.tree.unlink_edge(&mut self.edges, edge);
        self.tree.link_edge(&mut self.edges, group, edge);
        tracing::trace!(edge = %edge, group = %group, "edge reattributed");
    }

    /// Outgoing then incoming edges of `node`, after checking each is
    /// attributed and actually incident.
    fn incident_edges(&self, node: NodeId) -> Result<Vec<EdgeId>, ConsistencyFault> {
        let record = &self.nodes[node.index()];
        let mut out = Vec::new();

        let mut cursor = record.first_outgoing;
        while let Some(e) = cursor {
            let edge = &self.edges[e.index()];
            if edge.source != node {
                return Err(ConsistencyFault::AdjacencyMismatch { edge: e, node });
            }
            if edge.group.is_none() {
                return Err(ConsistencyFault::UnattributedEdge { edge: e });
            }
            out.push(e);
            cursor = edge.next_outgoing;
        }

        let mut cursor = record.first_incoming;
        while let Some(e) = cursor {
            let edge = &self.edges[e.index()];
            if edge.target != node {
                return Err(ConsistencyFault::AdjacencyMismatch { edge: e, node });
            }
            if edge.group.is_none() {
                return Err(ConsistencyFault::UnattributedEdge { edge: e });
            }
            out.push(e);
            cursor = edge.next_incoming;
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    /// root ── a ── b, with n1 in a and n2 in b.
    fn two_level() -> (Graph, GroupId, GroupId, NodeId, NodeId) {
        let mut graph = Graph::new(GraphConfig::labelled());
        let a = graph.new_group();
        let b = graph.new_group_in(a).unwrap();
        let n1 = graph.new_node_in(a).unwrap();
        let n2 = graph.new_node_in(b).unwrap();
        (graph, a, b, n1, n2)
    }

    #[test]
    fn test_nca_levels() {
        let (graph, a, b, ..) = two_level();
        let tree = graph.hierarchy();
        let root = tree.root();

        assert_eq!(tree.common_ancestor(a, b).unwrap(), a);
        assert_eq!(tree.common_ancestor(b, a).unwrap(), a);
        assert_eq!(tree.common_ancestor(b, b).unwrap(), b);
        assert_eq!(tree.common_ancestor(root, b).unwrap(), root);
    }

    #[test]
    fn test_nca_of_cousins() {
        let mut graph = Graph::default();
        let a = graph.new_group();
        let x = graph.new_group_in(a).unwrap();
        let y = graph.new_group_in(a).unwrap();
        let deep = graph.new_group_in(y).unwrap();
        let other = graph.new_group();

        let tree = graph.hierarchy();
        assert_eq!(tree.common_ancestor(x, deep).unwrap(), a);
        assert_eq!(tree.common_ancestor(deep, other).unwrap(), tree.root());
    }

    #[test]
    fn test_edge_follows_node_moves() {
        let (mut graph, a, b, n1, n2) = two_level();
        let e = graph.new_edge(n1, n2).unwrap();
        assert_eq!(graph.edge_group(e).unwrap(), a);

        graph.move_node(n1, b).unwrap();
        assert_eq!(graph.edge_group(e).unwrap(), b);
        assert_eq!(graph.group_edges(a).unwrap().count(), 0);
        assert_eq!(graph.group_edges(b).unwrap().collect::<Vec<_>>(), vec![e]);

        let root = graph.root_group();
        graph.move_node(n1, root).unwrap();
        assert_eq!(graph.edge_group(e).unwrap(), root);
    }

    #[test]
    fn test_move_to_same_group_keeps_order() {
        let (mut graph, a, _, n1, _) = two_level();
        let other = graph.new_node_in(a).unwrap();
        let before: Vec<_> = graph.group_nodes(a).unwrap().collect();
        assert_eq!(before, vec![other, n1]);

        graph.move_node(n1, a).unwrap();
        assert_eq!(graph.group_nodes(a).unwrap().collect::<Vec<_>>(), before);
    }

    #[test]
    fn test_move_unknown_ids() {
        let (mut graph, a, ..) = two_level();
        let mut other = Graph::default();
        let stray_node = other.new_node();
        let stray_group = other.new_group();
        let n = graph.new_node();

        assert_eq!(graph.move_node(stray_node, a), Err(GraphError::UnknownNode(stray_node)));
        assert_eq!(graph.move_node(n, stray_group), Err(GraphError::UnknownGroup(stray_group)));
    }

    #[test]
    fn test_self_loop_follows_node() {
        let (mut graph, _, b, n1, _) = two_level();
        let lp = graph.new_edge(n1, n1).unwrap();
        graph.move_node(n1, b).unwrap();
        assert_eq!(graph.edge_group(lp).unwrap(), b);
        assert_eq!(graph.group_edges(b).unwrap().count(), 1);
    }

    #[test]
    fn test_reparent_reattributes_subtree_edges() {
        let mut graph = Graph::default();
        let left = graph.new_group();
        let right = graph.new_group();
        let inner = graph.new_group_in(left).unwrap();

        let x = graph.new_node_in(inner).unwrap();
        let y = graph.new_node_in(right).unwrap();
        let e = graph.new_edge(x, y).unwrap();
        assert_eq!(graph.edge_group(e).unwrap(), graph.root_group());

        graph.set_group_parent(inner, right).unwrap();
        assert_eq!(graph.edge_group(e).unwrap(), right);
        assert_eq!(graph.hierarchy().group(inner).unwrap().level(), 2);
        assert_eq!(graph.hierarchy().children(left).unwrap().count(), 0);
    }

    #[test]
    fn test_reparent_relevels_whole_subtree() {
        let mut graph = Graph::default();
        let a = graph.new_group();
        let b = graph.new_group_in(a).unwrap();
        let c = graph.new_group_in(b).unwrap();
        let host = graph.new_group();
        let deeper = graph.new_group_in(host).unwrap();

        graph.set_group_parent(b, deeper).unwrap();
        let tree = graph.hierarchy();
        assert_eq!(tree.group(b).unwrap().level(), 3);
        assert_eq!(tree.group(c).unwrap().level(), 4);
    }

    #[test]
    fn test_reparent_rejections() {
        let (mut graph, a, b, ..) = two_level();
        let root = graph.root_group();

        assert_eq!(graph.set_group_parent(root, a), Err(GraphError::RootReparent));
        assert_eq!(
            graph.set_group_parent(a, b),
            Err(GraphError::CyclicNesting { group: a, parent: b })
        );
        assert_eq!(
            graph.set_group_parent(a, a),
            Err(GraphError::CyclicNesting { group: a, parent: a })
        );
        assert_eq!(graph.set_group_parent(b, a), Ok(()));
        assert_eq!(graph.hierarchy().group(b).unwrap().parent(), Some(a));
    }

    #[test]
    fn test_unchanged_attribution_keeps_list_position() {
        let mut graph = Graph::default();
        let root = graph.root_group();
        let a = graph.new_group();
        let (x, y, z) = (graph.new_node(), graph.new_node(), graph.new_node());
        let first = graph.new_edge(x, y).unwrap();
        let second = graph.new_edge(y, z).unwrap();
        let edges = |g: &Graph| g.group_edges(root).unwrap().collect::<Vec<_>>();
        assert_eq!(edges(&graph), vec![second, first]);

        // x leaves the root, but x -> y still meets at the root
        graph.move_node(x, a).unwrap();
        assert_eq!(graph.edge_group(first).unwrap(), root);
        assert_eq!(edges(&graph), vec![second, first]);
    }

    #[test]
    fn test_disconnected_ancestor_is_fatal() {
        let (mut graph, _, b, n1, n2) = two_level();
        graph.tree.groups_mut()[b.index()].parent = None;

        let result = catch_unwind(AssertUnwindSafe(|| graph.new_edge(n1, n2)));
        let payload = result.unwrap_err();
        assert_eq!(
            payload.downcast_ref::<ConsistencyFault>(),
            Some(&ConsistencyFault::DisconnectedAncestor { from: b })
        );
    }

    #[test]
    fn test_parent_cycle_is_fatal() {
        let (mut graph, a, b, n1, n2) = two_level();
        {
            let groups = graph.tree.groups_mut();
            groups[a.index()].parent = Some(b);
            groups[a.index()].level = 3;
            groups[b.index()].level = 3;
        }

        let result = catch_unwind(AssertUnwindSafe(|| graph.new_edge(n1, n2)));
        let payload = result.unwrap_err();
        assert!(matches!(
            payload.downcast_ref::<ConsistencyFault>(),
            Some(ConsistencyFault::CycleDetected { .. })
        ));
    }
}
