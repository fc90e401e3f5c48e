//! yFiles GraphML emitter.
//!
//! Groups become folder nodes (`yfiles.foldertype="folder"`) wrapping a
//! nested `<graph>`; yEd can fold and unfold them. Element ids encode the
//! path through the hierarchy:
//!
//! ```text
//! group 3 at top level      nest3        graph  nest3:
//! group 5 inside group 3    nest3::nest5 graph  nest3::nest5:
//! node 7 inside group 5     nest3::nest5::n7
//! edge 2 inside group 3     nest3::e2
//! ```

use std::io;

use super::{escape_xml, group_label, node_label, EmitConfig, EmitError, EmitSpec, Lines};
use crate::graph::Graph;
use crate::types::{GroupId, NodeId};

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#;

const GRAPHML_OPEN: &str = concat!(
    r#"<graphml xmlns="http://graphml.graphdrawing.org/xmlns" "#,
    r#"xmlns:sys="http://www.yworks.com/xml/yfiles-common/markup/primitives/2.0" "#,
    r#"xmlns:x="http://www.yworks.com/xml/yfiles-common/markup/2.0" "#,
    r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
    r#"xmlns:y="http://www.yworks.com/xml/graphml" "#,
    r#"xsi:schemaLocation="http://graphml.graphdrawing.org/xmlns "#,
    r#"http://www.yworks.com/xml/schema/graphml/1.1/ygraphml.xsd">"#,
);

/// Data key carrying yFiles node graphics.
const NODE_GRAPHICS_KEY: &str = "d0";

enum Frame {
    Enter { group: GroupId, depth: usize, prefix: String },
    Leave { group: GroupId, depth: usize, inner: String },
}

/// Write `graph` in yFiles GraphML format.
///
/// Only node and group labels are emitted; the graph label has no GraphML
/// counterpart here.
pub fn write_graphml<W: io::Write>(
    graph: &Graph,
    spec: &EmitSpec<'_>,
    config: &EmitConfig,
    out: W,
) -> Result<(), EmitError> {
    let mut lines = Lines::new(out, &config.indent);

    tracing::debug!(
        graph = %graph.id(),
        groups = graph.hierarchy().group_count(),
        nodes = graph.node_count(),
        "emitting graphml"
    );

    lines.line(0, "xml declaration", format_args!("{}", XML_DECL))?;
    lines.line(0, "graphml header", format_args!("{}", GRAPHML_OPEN))?;
    lines.line(
        1,
        "attribute declarations",
        format_args!(
            r#"<key id="{}" yfiles.type="nodegraphics" for="node"/>"#,
            NODE_GRAPHICS_KEY
        ),
    )?;
    lines.line(1, "graph header", format_args!(r#"<graph id="G" edgedefault="directed">"#))?;

    let tree = graph.hierarchy();
    let root = tree.root();

    let mut stack: Vec<Frame> = tree
        .children(root)?
        .map(|group| Frame::Enter {
            group,
            depth: 2,
            prefix: String::new(),
        })
        .collect();
    stack.reverse();

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Enter { group, depth, prefix } => {
                write_group_node(graph, spec, group, depth, &prefix, &mut lines)?;

                let inner = format!("{}nest{}::", prefix, group);
                lines.line(
                    depth + 1,
                    "subgraph header",
                    format_args!(r#"<graph id="{}nest{}:" edgedefault="directed">"#, prefix, group),
                )?;

                let first = stack.len() + 1;
                stack.push(Frame::Leave {
                    group,
                    depth,
                    inner: inner.clone(),
                });
                stack.extend(tree.children(group)?.map(|child| Frame::Enter {
                    group: child,
                    depth: depth + 2,
                    prefix: inner.clone(),
                }));
                stack[first..].reverse();
            }
            Frame::Leave { group, depth, inner } => {
                write_members(graph, spec, group, depth + 2, &inner, &mut lines)?;
                lines.line(depth + 1, "subgraph footer", format_args!("</graph>"))?;
                lines.line(depth, "group node footer", format_args!("</node>"))?;
            }
        }
    }

    write_members(graph, spec, root, 2, "", &mut lines)?;
    lines.line(1, "graph footer", format_args!("</graph>"))?;
    lines.line(0, "graphml footer", format_args!("</graphml>"))?;
    lines.finish()
}

/// Render `graph` in yFiles GraphML format to a string.
pub fn to_graphml_string(graph: &Graph, spec: &EmitSpec<'_>, config: &EmitConfig) -> Result<String, EmitError> {
    let mut buf = Vec::new();
    write_graphml(graph, spec, config, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Folder node header: everything up to, not including, the nested graph.
fn write_group_node<W: io::Write>(
    graph: &Graph,
    spec: &EmitSpec<'_>,
    group: GroupId,
    depth: usize,
    prefix: &str,
    lines: &mut Lines<'_, W>,
) -> Result<(), EmitError> {
    const CONTEXT: &str = "group node";
    let label = group_label(graph, spec, group)?.map(escape_xml);

    lines.line(
        depth,
        CONTEXT,
        format_args!(r#"<node id="{}nest{}" yfiles.foldertype="folder">"#, prefix, group),
    )?;
    lines.line(depth + 1, CONTEXT, format_args!(r#"<data key="{}">"#, NODE_GRAPHICS_KEY))?;
    lines.line(depth + 2, CONTEXT, format_args!("<y:ProxyAutoBoundsNode>"))?;
    lines.line(depth + 3, CONTEXT, format_args!(r#"<y:Realizers active="1">"#))?;

    // Expanded state: label inside the bounds, at the top.
    lines.line(depth + 4, CONTEXT, format_args!("<y:GroupNode>"))?;
    if let Some(text) = &label {
        lines.line(
            depth + 5,
            CONTEXT,
            format_args!(r#"<y:NodeLabel modelName="internal" modelPosition="t">{}</y:NodeLabel>"#, text),
        )?;
    }
    lines.line(depth + 5, CONTEXT, format_args!(r#"<y:State closed="false"/>"#))?;
    lines.line(depth + 5, CONTEXT, format_args!(r#"<y:NodeBounds considerNodeLabelSize="true"/>"#))?;
    lines.line(depth + 4, CONTEXT, format_args!("</y:GroupNode>"))?;

    // Collapsed state.
    lines.line(depth + 4, CONTEXT, format_args!("<y:GroupNode>"))?;
    if let Some(text) = &label {
        lines.line(depth + 5, CONTEXT, format_args!("<y:NodeLabel>{}</y:NodeLabel>", text))?;
    }
    lines.line(depth + 5, CONTEXT, format_args!(r#"<y:State closed="true"/>"#))?;
    lines.line(depth + 4, CONTEXT, format_args!("</y:GroupNode>"))?;

    lines.line(depth + 3, CONTEXT, format_args!("</y:Realizers>"))?;
    lines.line(depth + 2, CONTEXT, format_args!("</y:ProxyAutoBoundsNode>"))?;
    lines.line(depth + 1, CONTEXT, format_args!("</data>"))
}

fn write_members<W: io::Write>(
    graph: &Graph,
    spec: &EmitSpec<'_>,
    group: GroupId,
    depth: usize,
    prefix: &str,
    lines: &mut Lines<'_, W>,
) -> Result<(), EmitError> {
    for node in graph.group_nodes(group)? {
        lines.line(depth, "node", format_args!(r#"<node id="{}n{}">"#, prefix, node))?;
        lines.line(depth + 1, "node", format_args!(r#"<data key="{}">"#, NODE_GRAPHICS_KEY))?;
        lines.line(depth + 2, "node", format_args!("<y:ShapeNode>"))?;
        if let Some(text) = node_label(graph, spec, node)? {
            lines.line(
                depth + 3,
                "node",
                format_args!("<y:NodeLabel>{}</y:NodeLabel>", escape_xml(text)),
            )?;
        }
        lines.line(depth + 2, "node", format_args!("</y:ShapeNode>"))?;
        lines.line(depth + 1, "node", format_args!("</data>"))?;
        lines.line(depth, "node", format_args!("</node>"))?;
    }

    for edge in graph.group_edges(group)? {
        let record = graph.edge(edge)?;
        let source = node_path(graph, record.source())?;
        let target = node_path(graph, record.target())?;
        lines.line(
            depth,
            "edge",
            format_args!(
                r#"<edge id="{}e{}" source="{}" target="{}">"#,
                prefix, edge, source, target
            ),
        )?;
        lines.line(depth, "edge", format_args!("</edge>"))?;
    }

    Ok(())
}

/// Document id of a node: `nest<a>::nest<b>::n<id>` over its non-root ancestors.
pub fn node_path(graph: &Graph, node: NodeId) -> Result<String, EmitError> {
    let tree = graph.hierarchy();
    let mut chain = Vec::new();
    let mut cursor = graph.node_group(node)?;

    while let Some(parent) = tree.group(cursor)?.parent() {
        chain.push(cursor);
        cursor = parent;
    }

    let mut path = String::new();
    for group in chain.iter().rev() {
        path.push_str(&format!("nest{}::", group));
    }
    path.push_str(&format!("n{}", node));
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;

    fn header() -> String {
        format!(
            "{}\n{}\n  <key id=\"d0\" yfiles.type=\"nodegraphics\" for=\"node\"/>\n  <graph id=\"G\" edgedefault=\"directed\">\n",
            XML_DECL, GRAPHML_OPEN
        )
    }

    #[test]
    fn test_empty_graph() {
        let graph = Graph::default();
        let out = to_graphml_string(&graph, &EmitSpec::default(), &EmitConfig::default()).unwrap();
        assert_eq!(out, format!("{}  </graph>\n</graphml>\n", header()));
    }

    #[test]
    fn test_plain_node_with_escaped_label() {
        let mut graph = Graph::new(GraphConfig::labelled());
        let label = graph.new_node_attr().unwrap();
        let n = graph.new_node();
        graph.set_node_attr(n, &label, "a<b").unwrap();

        let spec = EmitSpec::unlabelled().node_label(&label);
        let out = to_graphml_string(&graph, &spec, &EmitConfig::default()).unwrap();
        let body = "    <node id=\"n0\">
      <data key=\"d0\">
        <y:ShapeNode>
          <y:NodeLabel>a&lt;b</y:NodeLabel>
        </y:ShapeNode>
      </data>
    </node>
";
        assert_eq!(out, format!("{}{}  </graph>\n</graphml>\n", header(), body));
    }

    #[test]
    fn test_group_folder_and_paths() {
        let mut graph = Graph::new(GraphConfig::labelled());
        let title = graph.new_group_attr().unwrap();
        let a = graph.new_group();
        let b = graph.new_group_in(a).unwrap();
        graph.set_group_attr(a, &title, "A & co").unwrap();

        let n0 = graph.new_node_in(b).unwrap();
        let n1 = graph.new_node_in(a).unwrap();
        graph.new_edge(n0, n1).unwrap();

        assert_eq!(node_path(&graph, n0).unwrap(), "nest1::nest2::n0");
        assert_eq!(node_path(&graph, n1).unwrap(), "nest1::n1");

        let spec = EmitSpec::unlabelled().group_label(&title);
        let out = to_graphml_string(&graph, &spec, &EmitConfig::default()).unwrap();

        assert!(out.contains("    <node id=\"nest1\" yfiles.foldertype=\"folder\">\n"));
        assert!(out.contains(
            "              <y:NodeLabel modelName=\"internal\" modelPosition=\"t\">A &amp; co</y:NodeLabel>\n"
        ));
        assert!(out.contains("              <y:NodeLabel>A &amp; co</y:NodeLabel>\n"));
        assert!(out.contains("      <graph id=\"nest1:\" edgedefault=\"directed\">\n"));
        assert!(out.contains("        <node id=\"nest1::nest2\" yfiles.foldertype=\"folder\">\n"));
        assert!(out.contains("          <graph id=\"nest1::nest2:\" edgedefault=\"directed\">\n"));
        assert!(out.contains("            <node id=\"nest1::nest2::n0\">\n"));
        assert!(out.contains(
            "        <edge id=\"nest1::e0\" source=\"nest1::nest2::n0\" target=\"nest1::n1\">\n        </edge>\n"
        ));
        assert!(out.ends_with("      </graph>\n    </node>\n  </graph>\n</graphml>\n"));

        // Child groups precede members inside a folder.
        let inner = out.find("nest1::nest2\"").unwrap();
        let member = out.find("<node id=\"nest1::n1\">").unwrap();
        assert!(inner < member);
    }
}
