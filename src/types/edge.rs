//! Edge records.

use super::id::{EdgeId, GroupId, NodeId};

/// Directed edge between two nodes of the same graph.
///
/// An edge sits in three lists at once: the source's outgoing list, the
/// target's incoming list, and the edge list of the group it is attributed
/// to. The group is always derived, never chosen by clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub(crate) id: EdgeId,
    pub(crate) source: NodeId,
    pub(crate) target: NodeId,
    pub(crate) group: Option<GroupId>,
    pub(crate) next_outgoing: Option<EdgeId>,
    pub(crate) prev_outgoing: Option<EdgeId>,
    pub(crate) next_incoming: Option<EdgeId>,
    pub(crate) prev_incoming: Option<EdgeId>,
    pub(crate) next_in_group: Option<EdgeId>,
    pub(crate) prev_in_group: Option<EdgeId>,
}

impl Edge {
    pub(crate) fn new(id: EdgeId, source: NodeId, target: NodeId) -> Self {
        Self {
            id,
            source,
            target,
            group: None,
            next_outgoing: None,
            prev_outgoing: None,
            next_incoming: None,
            prev_incoming: None,
            next_in_group: None,
            prev_in_group: None,
        }
    }

    /// Edge identity.
    pub fn id(&self) -> EdgeId {
        self.id
    }

    /// Source node.
    pub fn source(&self) -> NodeId {
        self.source
    }

    /// Target (destination) node.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Whether source and target are the same node.
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    /// Group the edge is attributed to.
    ///
    /// Only `None` transiently while the edge is being created; every edge
    /// visible through the public API has a group.
    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    /// Next edge leaving the same source node.
    pub fn next_outgoing(&self) -> Option<EdgeId> {
        self.next_outgoing
    }

    /// Previous edge leaving the same source node.
    pub fn prev_outgoing(&self) -> Option<EdgeId> {
        self.prev_outgoing
    }

    /// Next edge entering the same target node.
    pub fn next_incoming(&self) -> Option<EdgeId> {
        self.next_incoming
    }

    /// Previous edge entering the same target node.
    pub fn prev_incoming(&self) -> Option<EdgeId> {
        self.prev_incoming
    }

    /// Next edge attributed to the same group.
    pub fn next_in_group(&self) -> Option<EdgeId> {
        self.next_in_group
    }
}
