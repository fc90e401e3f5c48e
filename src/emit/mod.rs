//! Text emitters for drawing tools.
//!
//! Two formats are supported:
//!
//! - [`dot`]: Graphviz DOT, with groups as `cluster_` subgraphs
//! - [`graphml`]: yFiles-flavoured GraphML, with groups as folder nodes
//!
//! Both walk the hierarchy with an explicit worklist, so arbitrarily deep
//! nesting does not grow the call stack. Labels come from attributes named by
//! an [`EmitSpec`]; a missing mapping or an unset value means "no label".

pub mod dot;
pub mod graphml;

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};

use crate::attr::{AttrError, GraphAttr, GroupAttr, NodeAttr};
use crate::graph::{Graph, GraphError};
use crate::types::{GroupId, NodeId};

/// Which attributes supply labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmitSpec<'a> {
    /// Graph name and title.
    pub graph_label: Option<&'a GraphAttr>,
    /// Per-node labels.
    pub node_label: Option<&'a NodeAttr>,
    /// Per-group labels.
    pub group_label: Option<&'a GroupAttr>,
}

impl<'a> EmitSpec<'a> {
    /// A spec with no labels at all.
    pub fn unlabelled() -> Self {
        Self::default()
    }

    /// Use `attr` as the graph label.
    pub fn graph_label(mut self, attr: &'a GraphAttr) -> Self {
        self.graph_label = Some(attr);
        self
    }

    /// Use `attr` as the node label.
    pub fn node_label(mut self, attr: &'a NodeAttr) -> Self {
        self.node_label = Some(attr);
        self
    }

    /// Use `attr` as the group label.
    pub fn group_label(mut self, attr: &'a GroupAttr) -> Self {
        self.group_label = Some(attr);
        self
    }
}

/// Output formatting options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitConfig {
    /// One level of indentation.
    pub indent: String,
    /// DOT graph name used when the graph has no label.
    pub untitled_name: String,
    /// DOT drawing direction.
    pub rankdir: String,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
            untitled_name: "NO NAME".to_string(),
            rankdir: "LR".to_string(),
        }
    }
}

impl EmitConfig {
    /// Parse options from JSON. Missing fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Element whose label could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    /// The graph as a whole.
    Graph,
    /// A node.
    Node(NodeId),
    /// A group.
    Group(GroupId),
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Graph => write!(f, "graph"),
            Element::Node(id) => write!(f, "node {}", id),
            Element::Group(id) => write!(f, "group {}", id),
        }
    }
}

/// Error type for emitters.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// Checking whether a label is set failed.
    #[error("Error checking whether the {element} label is set: {source}")]
    AttributeCheck {
        /// Element being labelled.
        element: Element,
        /// Underlying attribute error.
        source: AttrError,
    },

    /// Reading a label failed.
    #[error("Error retrieving the {element} label: {source}")]
    LabelRetrieval {
        /// Element being labelled.
        element: Element,
        /// Underlying attribute error.
        source: AttrError,
    },

    /// The output sink failed.
    #[error("Error writing {context}: {source}")]
    Write {
        /// What was being written.
        context: &'static str,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A graph read failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

fn resolve_label<'g>(
    element: Element,
    is_set: Result<bool, AttrError>,
    value: impl FnOnce() -> Result<&'g str, AttrError>,
) -> Result<Option<&'g str>, EmitError> {
    let set = is_set.map_err(|source| EmitError::AttributeCheck { element, source })?;
    if !set {
        return Ok(None);
    }
    value()
        .map(Some)
        .map_err(|source| EmitError::LabelRetrieval { element, source })
}

pub(crate) fn graph_label<'g>(graph: &'g Graph, spec: &EmitSpec<'_>) -> Result<Option<&'g str>, EmitError> {
    let Some(attr) = spec.graph_label else {
        return Ok(None);
    };
    resolve_label(Element::Graph, graph.is_graph_attr_set(attr), || graph.graph_attr(attr))
}

pub(crate) fn node_label<'g>(
    graph: &'g Graph,
    spec: &EmitSpec<'_>,
    node: NodeId,
) -> Result<Option<&'g str>, EmitError> {
    let Some(attr) = spec.node_label else {
        return Ok(None);
    };
    resolve_label(Element::Node(node), graph.is_node_attr_set(node, attr), || {
        graph.node_attr(node, attr)
    })
}

pub(crate) fn group_label<'g>(
    graph: &'g Graph,
    spec: &EmitSpec<'_>,
    group: GroupId,
) -> Result<Option<&'g str>, EmitError> {
    let Some(attr) = spec.group_label else {
        return Ok(None);
    };
    let tree = graph.hierarchy();
    resolve_label(Element::Group(group), tree.is_group_attr_set(group, attr), || {
        tree.group_attr(group, attr)
    })
}

/// Escape text for a double-quoted DOT string.
pub fn escape_dot(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text for XML character data or attribute values.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Line-oriented writer that prefixes each line with `depth` indent units.
pub(crate) struct Lines<'c, W> {
    out: W,
    unit: &'c str,
}

impl<'c, W: io::Write> Lines<'c, W> {
    pub(crate) fn new(out: W, unit: &'c str) -> Self {
        Self { out, unit }
    }

    pub(crate) fn line(
        &mut self,
        depth: usize,
        context: &'static str,
        text: fmt::Arguments<'_>,
    ) -> Result<(), EmitError> {
        let wrap = |source| EmitError::Write { context, source };
        for _ in 0..depth {
            self.out.write_all(self.unit.as_bytes()).map_err(wrap)?;
        }
        self.out.write_fmt(text).map_err(wrap)?;
        self.out.write_all(b"\n").map_err(wrap)
    }

    pub(crate) fn finish(mut self) -> Result<(), EmitError> {
        self.out
            .flush()
            .map_err(|source| EmitError::Write { context: "output", source })
    }
}
