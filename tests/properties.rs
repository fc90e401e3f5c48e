//! Property tests over random operation sequences.
//!
//! Covers: edge attribution against an independently computed common
//! ancestor, membership and level invariants, preorder inverse, idempotent
//! moves, and attribute round-trips.

use nestgraph::{Graph, GraphConfig, GraphError, GroupId, NodeId};
use proptest::prelude::*;

// ─────────────────────────────────────────────────────────────────────────────
// Operation model
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    NewNode,
    NewGroup,
    NewEdge(usize, usize),
    MoveNode(usize, usize),
    Reparent(usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => Just(Op::NewNode),
        1 => Just(Op::NewGroup),
        3 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::NewEdge(a, b)),
        3 => (any::<usize>(), any::<usize>()).prop_map(|(n, g)| Op::MoveNode(n, g)),
        2 => (any::<usize>(), any::<usize>()).prop_map(|(g, p)| Op::Reparent(g, p)),
    ]
}

/// A graph plus the ids created so far (root group included).
struct Model {
    graph: Graph,
    nodes: Vec<NodeId>,
    groups: Vec<GroupId>,
}

impl Model {
    fn run(ops: &[Op]) -> Self {
        let graph = Graph::new(GraphConfig::labelled());
        let root = graph.root_group();
        let mut model = Self {
            graph,
            nodes: Vec::new(),
            groups: vec![root],
        };
        for op in ops {
            model.apply(op);
        }
        model
    }

    fn apply(&mut self, op: &Op) {
        match *op {
            Op::NewNode => self.nodes.push(self.graph.new_node()),
            Op::NewGroup => self.groups.push(self.graph.new_group()),
            Op::NewEdge(a, b) => {
                if !self.nodes.is_empty() {
                    let (src, dst) = (self.node(a), self.node(b));
                    self.graph.new_edge(src, dst).unwrap();
                }
            }
            Op::MoveNode(n, g) => {
                if !self.nodes.is_empty() {
                    let (node, group) = (self.node(n), self.group(g));
                    self.graph.move_node(node, group).unwrap();
                }
            }
            Op::Reparent(g, p) => {
                let (group, parent) = (self.group(g), self.group(p));
                match self.graph.set_group_parent(group, parent) {
                    Ok(()) | Err(GraphError::RootReparent) | Err(GraphError::CyclicNesting { .. }) => {}
                    Err(other) => panic!("unexpected reparent error: {}", other),
                }
            }
        }
    }

    fn node(&self, i: usize) -> NodeId {
        self.nodes[i % self.nodes.len()]
    }

    fn group(&self, i: usize) -> GroupId {
        self.groups[i % self.groups.len()]
    }

    /// Ancestor chain of `g`, `g` first, root last.
    fn chain(&self, g: GroupId) -> Vec<GroupId> {
        let tree = self.graph.hierarchy();
        let mut out = vec![g];
        let mut cursor = g;
        while let Some(parent) = tree.group(cursor).unwrap().parent() {
            out.push(parent);
            cursor = parent;
        }
        out
    }

    /// Common ancestor by intersecting full ancestor chains.
    fn brute_force_nca(&self, a: GroupId, b: GroupId) -> GroupId {
        let ours = self.chain(a);
        let theirs = self.chain(b);
        *ours
            .iter()
            .find(|g| theirs.contains(g))
            .expect("chains share the root")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn audit_passes_after_any_sequence(ops in prop::collection::vec(op(), 0..60)) {
        let model = Model::run(&ops);
        prop_assert_eq!(model.graph.check_consistency(), Ok(()));
    }

    #[test]
    fn every_edge_sits_at_the_common_ancestor(ops in prop::collection::vec(op(), 0..60)) {
        let model = Model::run(&ops);
        let graph = &model.graph;

        for &node in &model.nodes {
            for edge in graph.outgoing(node).unwrap() {
                let record = graph.edge(edge).unwrap();
                let expected = model.brute_force_nca(
                    graph.node_group(record.source()).unwrap(),
                    graph.node_group(record.target()).unwrap(),
                );
                prop_assert_eq!(graph.edge_group(edge).unwrap(), expected);
            }
        }
    }

    #[test]
    fn levels_and_membership_hold(ops in prop::collection::vec(op(), 0..60)) {
        let model = Model::run(&ops);
        let graph = &model.graph;
        let tree = graph.hierarchy();

        for g in tree.preorder() {
            let group = tree.group(g).unwrap();
            match group.parent() {
                Some(p) => prop_assert_eq!(group.level(), tree.group(p).unwrap().level() + 1),
                None => prop_assert_eq!(g, tree.root()),
            }
            for node in graph.group_nodes(g).unwrap() {
                prop_assert_eq!(graph.node_group(node).unwrap(), g);
            }
        }

        let claimed: usize = tree.preorder().map(|g| graph.group_nodes(g).unwrap().count()).sum();
        prop_assert_eq!(claimed, graph.node_count());
        prop_assert_eq!(tree.preorder().count(), tree.group_count());
    }

    #[test]
    fn prev_group_inverts_next_group(ops in prop::collection::vec(op(), 0..60)) {
        let model = Model::run(&ops);
        let tree = model.graph.hierarchy();

        for &g in &model.groups {
            if let Some(next) = tree.next_group(g).unwrap() {
                prop_assert_eq!(tree.prev_group(next).unwrap(), Some(g));
            }
        }
    }

    #[test]
    fn node_walks_agree(ops in prop::collection::vec(op(), 0..60)) {
        let model = Model::run(&ops);
        let forward: Vec<_> = model.graph.nodes().collect();
        let mut backward: Vec<_> = model.graph.nodes_rev().collect();
        backward.reverse();

        prop_assert_eq!(forward.len(), model.graph.node_count());
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn moving_in_place_changes_nothing(
        ops in prop::collection::vec(op(), 1..60),
        pick in any::<usize>(),
    ) {
        let mut model = Model::run(&ops);
        prop_assume!(!model.nodes.is_empty());

        let before = model.graph.fingerprint();
        let node = model.node(pick);
        let group = model.graph.node_group(node).unwrap();
        model.graph.move_node(node, group).unwrap();
        prop_assert_eq!(model.graph.fingerprint(), before);
    }

    #[test]
    fn node_attr_round_trip(values in prop::collection::vec("[a-z]{0,8}", 1..12)) {
        let mut graph = Graph::new(GraphConfig::labelled());
        let nodes: Vec<_> = values.iter().map(|_| graph.new_node()).collect();
        let mut attr = graph.new_node_attr().unwrap();

        for (node, value) in nodes.iter().zip(&values) {
            graph.set_node_attr(*node, &attr, value.clone()).unwrap();
        }
        for (node, value) in nodes.iter().zip(&values) {
            prop_assert_eq!(graph.node_attr(*node, &attr).unwrap(), value.as_str());
        }

        graph.release_node_attr(&mut attr).unwrap();
        let fresh = graph.new_node_attr().unwrap();
        for node in &nodes {
            prop_assert!(!graph.is_node_attr_set(*node, &fresh).unwrap());
        }
    }
}
