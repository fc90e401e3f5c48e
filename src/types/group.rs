//! Group ("nest") records.

use crate::attr::SlotValues;
use super::id::{EdgeId, GroupId, NodeId};

/// Level of the root group.
pub const ROOT_LEVEL: u32 = 0;

/// A containment group in the hierarchy.
///
/// Groups with no children and no member nodes are valid and persist.
#[derive(Debug, Clone)]
pub struct Group {
    pub(crate) id: GroupId,
    pub(crate) level: u32,
    pub(crate) parent: Option<GroupId>,
    pub(crate) first_child: Option<GroupId>,
    pub(crate) last_child: Option<GroupId>,
    pub(crate) next_sibling: Option<GroupId>,
    pub(crate) prev_sibling: Option<GroupId>,
    pub(crate) first_node: Option<NodeId>,
    pub(crate) last_node: Option<NodeId>,
    // No tail: a group's edges are only iterated forward.
    pub(crate) first_edge: Option<EdgeId>,
    pub(crate) attrs: SlotValues,
}

impl Group {
    pub(crate) fn new(id: GroupId, level: u32, parent: Option<GroupId>, attr_slots: usize) -> Self {
        Self {
            id,
            level,
            parent,
            first_child: None,
            last_child: None,
            next_sibling: None,
            prev_sibling: None,
            first_node: None,
            last_node: None,
            first_edge: None,
            attrs: SlotValues::new(attr_slots),
        }
    }

    /// Group identity.
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Depth in the hierarchy; the root is at [`ROOT_LEVEL`].
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Whether this is the root group.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Parent (outer) group, absent for the root.
    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }

    /// First child (inner) group.
    pub fn first_child(&self) -> Option<GroupId> {
        self.first_child
    }

    /// Last child group.
    pub fn last_child(&self) -> Option<GroupId> {
        self.last_child
    }

    /// Next group with the same parent.
    pub fn next_sibling(&self) -> Option<GroupId> {
        self.next_sibling
    }

    /// Previous group with the same parent.
    pub fn prev_sibling(&self) -> Option<GroupId> {
        self.prev_sibling
    }

    /// First member node.
    pub fn first_node(&self) -> Option<NodeId> {
        self.first_node
    }

    /// Last member node.
    pub fn last_node(&self) -> Option<NodeId> {
        self.last_node
    }

    /// First member edge.
    pub fn first_edge(&self) -> Option<EdgeId> {
        self.first_edge
    }
}
