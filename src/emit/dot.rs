//! Graphviz DOT emitter.
//!
//! Every non-root group becomes a `subgraph cluster_<id>` block holding, in
//! order: its label, its child groups, its member nodes, its member edges.
//! Root members follow the cluster blocks after a `node [shape=box];`
//! default. Render with e.g. `dot -Tpng graph.gv -o graph.png`.

use std::io;

use super::{escape_dot, graph_label, group_label, node_label, EmitConfig, EmitError, EmitSpec, Lines};
use crate::graph::Graph;
use crate::types::GroupId;

enum Frame {
    Enter { group: GroupId, depth: usize },
    Leave { group: GroupId, depth: usize },
}

/// Write `graph` in DOT format.
pub fn write_dot<W: io::Write>(
    graph: &Graph,
    spec: &EmitSpec<'_>,
    config: &EmitConfig,
    out: W,
) -> Result<(), EmitError> {
    let mut lines = Lines::new(out, &config.indent);
    let label = graph_label(graph, spec)?;
    let name = escape_dot(label.unwrap_or(config.untitled_name.as_str()));

    tracing::debug!(
        graph = %graph.id(),
        groups = graph.hierarchy().group_count(),
        nodes = graph.node_count(),
        "emitting dot"
    );

    lines.line(0, "graph header", format_args!("digraph \"{}\" {{", name))?;
    lines.line(1, "graph properties", format_args!("rankdir = {}", config.rankdir))?;
    if label.is_some() {
        lines.line(1, "graph properties", format_args!("label = \"{}\"", name))?;
    }

    let tree = graph.hierarchy();
    let root = tree.root();

    let mut stack: Vec<Frame> = tree
        .children(root)?
        .map(|group| Frame::Enter { group, depth: 1 })
        .collect();
    stack.reverse();

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Enter { group, depth } => {
                lines.line(depth, "subgraph header", format_args!("subgraph cluster_{} {{", group))?;
                if let Some(text) = group_label(graph, spec, group)? {
                    lines.line(
                        depth + 1,
                        "subgraph label",
                        format_args!("label=\"{}\";", escape_dot(text)),
                    )?;
                }

                stack.push(Frame::Leave { group, depth });
                let first = stack.len();
                stack.extend(tree.children(group)?.map(|child| Frame::Enter {
                    group: child,
                    depth: depth + 1,
                }));
                stack[first..].reverse();
            }
            Frame::Leave { group, depth } => {
                write_members(graph, spec, group, depth + 1, &mut lines)?;
                lines.line(depth, "subgraph footer", format_args!("}}"))?;
            }
        }
    }

    lines.line(1, "node defaults", format_args!("node [shape=box];"))?;
    write_members(graph, spec, root, 1, &mut lines)?;
    lines.line(0, "graph footer", format_args!("}}"))?;
    lines.finish()
}

/// Render `graph` in DOT format to a string.
pub fn to_dot_string(graph: &Graph, spec: &EmitSpec<'_>, config: &EmitConfig) -> Result<String, EmitError> {
    let mut buf = Vec::new();
    write_dot(graph, spec, config, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn write_members<W: io::Write>(
    graph: &Graph,
    spec: &EmitSpec<'_>,
    group: GroupId,
    depth: usize,
    lines: &mut Lines<'_, W>,
) -> Result<(), EmitError> {
    for node in graph.group_nodes(group)? {
        match node_label(graph, spec, node)? {
            Some(text) => lines.line(
                depth,
                "node",
                format_args!("{} [label=\"{}\"];", node, escape_dot(text)),
            )?,
            None => lines.line(depth, "node", format_args!("{};", node))?,
        }
    }

    for edge in graph.group_edges(group)? {
        let record = graph.edge(edge)?;
        lines.line(
            depth,
            "edge",
            format_args!("{} -> {};", record.source(), record.target()),
        )?;
    }

    Ok(())
}
