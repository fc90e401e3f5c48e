//! Performance benchmarks for edge reattribution.
//!
//! Run with: `cargo bench --bench reattribution`
//!
//! ## Performance Targets
//!
//! | Operation | Target | Notes |
//! |-----------|--------|-------|
//! | Common ancestor | O(depth) | Level-synchronized climb |
//! | move_node | O(degree * depth) | One climb per incident edge |
//! | set_group_parent | O(subtree edges * depth) | Plus one subtree walk |

use criterion::{
    black_box, criterion_group, criterion_main,
    BenchmarkId, Criterion, Throughput,
};

use nestgraph::{Graph, GroupId, NodeId};

/// A chain of `depth` nested groups below the root, root first.
fn make_chain(graph: &mut Graph, from: GroupId, depth: usize) -> Vec<GroupId> {
    let mut chain = vec![from];
    for _ in 0..depth {
        let parent = *chain.last().unwrap();
        chain.push(graph.new_group_in(parent).unwrap());
    }
    chain
}

/// One node per chain level, plus a hub in the deepest group wired to all of them.
fn make_hub(depth: usize) -> (Graph, Vec<GroupId>, NodeId) {
    let mut graph = Graph::default();
    let root = graph.root_group();
    let chain = make_chain(&mut graph, root, depth);

    let hub = graph.new_node_in(*chain.last().unwrap()).unwrap();
    for &group in &chain {
        let spoke = graph.new_node_in(group).unwrap();
        graph.new_edge(hub, spoke).unwrap();
        graph.new_edge(spoke, hub).unwrap();
    }
    (graph, chain, hub)
}

/// Benchmark the common-ancestor climb alone.
fn bench_common_ancestor(c: &mut Criterion) {
    let mut group = c.benchmark_group("common_ancestor");

    for depth in [4, 16, 64, 256] {
        let mut graph = Graph::default();
        let root = graph.root_group();
        let left = make_chain(&mut graph, root, depth);
        let right = make_chain(&mut graph, root, depth);
        let (a, b) = (*left.last().unwrap(), *right.last().unwrap());

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("depth", depth), &depth, |bench, _| {
            bench.iter(|| graph.hierarchy().common_ancestor(black_box(a), black_box(b)).unwrap())
        });
    }

    group.finish();
}

/// Benchmark moving a well-connected node up and down a deep chain.
fn bench_move_node(c: &mut Criterion) {
    let mut group = c.benchmark_group("move_node");

    for depth in [4, 16, 64, 256] {
        let (mut graph, chain, hub) = make_hub(depth);
        let (top, bottom) = (chain[0], *chain.last().unwrap());

        group.throughput(Throughput::Elements(graph.edge_count() as u64 * 2));
        group.bench_with_input(BenchmarkId::new("depth", depth), &depth, |bench, _| {
            bench.iter(|| {
                graph.move_node(black_box(hub), top).unwrap();
                graph.move_node(black_box(hub), bottom).unwrap();
            })
        });
    }

    group.finish();
}

/// Benchmark re-parenting a populated subtree between two deep branches.
fn bench_set_group_parent(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_group_parent");

    for depth in [4, 16, 64] {
        let mut graph = Graph::default();
        let root = graph.root_group();
        let left = *make_chain(&mut graph, root, depth).last().unwrap();
        let right = *make_chain(&mut graph, root, depth).last().unwrap();
        let anchor = graph.new_node_in(left).unwrap();

        let moving = graph.new_group_in(left).unwrap();
        let inner = make_chain(&mut graph, moving, depth / 2);
        for &g in &inner {
            let member = graph.new_node_in(g).unwrap();
            graph.new_edge(member, anchor).unwrap();
        }

        group.throughput(Throughput::Elements(graph.edge_count() as u64 * 2));
        group.bench_with_input(BenchmarkId::new("depth", depth), &depth, |bench, _| {
            bench.iter(|| {
                graph.set_group_parent(black_box(moving), right).unwrap();
                graph.set_group_parent(black_box(moving), left).unwrap();
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_common_ancestor,
    bench_move_node,
    bench_set_group_parent,
);

criterion_main!(benches);
