//! Node records.

use crate::attr::SlotValues;
use super::id::{EdgeId, GroupId, NodeId};

/// A graph node.
///
/// Read-only view over the node's links. All links are ids into the owning
/// [`Graph`](crate::Graph); they are rewritten only by graph operations.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) group: GroupId,
    pub(crate) first_incoming: Option<EdgeId>,
    pub(crate) first_outgoing: Option<EdgeId>,
    pub(crate) next_in_group: Option<NodeId>,
    pub(crate) prev_in_group: Option<NodeId>,
    pub(crate) attrs: SlotValues,
}

impl Node {
    pub(crate) fn new(id: NodeId, group: GroupId, attr_slots: usize) -> Self {
        Self {
            id,
            group,
            first_incoming: None,
            first_outgoing: None,
            next_in_group: None,
            prev_in_group: None,
            attrs: SlotValues::new(attr_slots),
        }
    }

    /// Node identity.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Group the node belongs to.
    pub fn group(&self) -> GroupId {
        self.group
    }

    /// Head of the incoming edge list.
    pub fn first_incoming(&self) -> Option<EdgeId> {
        self.first_incoming
    }

    /// Head of the outgoing edge list.
    pub fn first_outgoing(&self) -> Option<EdgeId> {
        self.first_outgoing
    }

    /// Next node in the same group.
    pub fn next_in_group(&self) -> Option<NodeId> {
        self.next_in_group
    }

    /// Previous node in the same group.
    pub fn prev_in_group(&self) -> Option<NodeId> {
        self.prev_in_group
    }
}
