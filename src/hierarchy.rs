//! The group hierarchy ("nest tree") of a graph.
//!
//! Groups form a tree rooted at a single group of level 0. The tree is
//! threaded through parent, child and sibling links, so a full depth-first
//! preorder walk needs neither recursion nor an explicit stack:
//!
//! ```text
//! next_group(g) = first child of g
//!              || next sibling of g
//!              || next sibling of the nearest ancestor that has one
//! prev_group(g) = deepest last descendant of the previous sibling of g
//!              || parent of g
//! ```
//!
//! Member lists (nodes and edges per group) are intrusive lists whose links
//! live in the node and edge records. They are only rewritten by the owning
//! [`Graph`](crate::Graph), so the helpers doing that surgery are
//! crate-private.

use crate::attr::{sweep_slot, AttrError, GroupAttr, GroupKind, SlotPool};
use crate::graph::GraphError;
use crate::types::{ContainerId, Edge, EdgeId, Group, GroupId, Node, NodeId, ROOT_LEVEL};

/// Tree of groups owned by one graph.
///
/// Clients read the tree through [`Graph::hierarchy`](crate::Graph::hierarchy);
/// every mutation goes through the owning graph.
#[derive(Debug)]
pub struct Hierarchy {
    id: ContainerId,
    graph: ContainerId,
    groups: Vec<Group>,
    attrs: SlotPool<GroupKind>,
}

impl Hierarchy {
    /// Create a tree holding only the root group.
    pub(crate) fn new(graph: ContainerId, group_attrs: usize) -> Self {
        let id = ContainerId::fresh();
        let root = Group::new(GroupId::new(id, 0), ROOT_LEVEL, None, group_attrs);

        Self {
            id,
            graph,
            groups: vec![root],
            attrs: SlotPool::new(id, group_attrs),
        }
    }

    /// Container id of the tree; group ids and group attributes carry it.
    pub fn id(&self) -> ContainerId {
        self.id
    }

    /// Container id of the graph the tree belongs to.
    pub fn graph_id(&self) -> ContainerId {
        self.graph
    }

    /// The root group.
    pub fn root(&self) -> GroupId {
        self.groups[0].id
    }

    /// Number of groups, root included.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Look up a group record.
    pub fn group(&self, id: GroupId) -> Result<&Group, GraphError> {
        let index = self.resolve(id)?;
        Ok(&self.groups[index])
    }

    /// Create a group as a new first child of the root.
    ///
    /// Use [`Graph::set_group_parent`](crate::Graph::set_group_parent) to nest
    /// it elsewhere.
    pub(crate) fn new_group(&mut self) -> GroupId {
        let id = GroupId::new(self.id, self.groups.len());
        let root = self.root();
        let level = self.get(root).level + 1;

        self.groups.push(Group::new(id, level, None, self.attrs.capacity()));
        self.attach_group(id, root);

        tracing::trace!(group = %id, "group created");
        id
    }

    /// Successor of `g` in depth-first preorder.
    pub fn next_group(&self, g: GroupId) -> Result<Option<GroupId>, GraphError> {
        self.resolve(g)?;
        Ok(self.successor(g))
    }

    /// Predecessor of `g` in depth-first preorder.
    pub fn prev_group(&self, g: GroupId) -> Result<Option<GroupId>, GraphError> {
        self.resolve(g)?;
        Ok(self.predecessor(g))
    }

    /// The last group in preorder (deepest last descendant of the root).
    pub fn last_group(&self) -> GroupId {
        self.deepest_last(self.root())
    }

    /// Iterate all groups in depth-first preorder, starting at the root.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            next: Some(self.root()),
        }
    }

    /// Iterate the children of `g` in list order.
    pub fn children(&self, g: GroupId) -> Result<Children<'_>, GraphError> {
        let index = self.resolve(g)?;
        Ok(Children {
            tree: self,
            next: self.groups[index].first_child,
        })
    }

    /// Whether `g` is `ancestor` or lies inside it.
    pub fn is_within(&self, g: GroupId, ancestor: GroupId) -> Result<bool, GraphError> {
        self.resolve(g)?;
        self.resolve(ancestor)?;
        Ok(self.within(g, ancestor))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Group attributes
    // ─────────────────────────────────────────────────────────────────────

    /// Allocate a group string attribute.
    pub(crate) fn new_group_attr(&mut self) -> Result<GroupAttr, AttrError> {
        self.attrs.allocate()
    }

    /// Release a group attribute, clearing it on every group.
    pub(crate) fn release_group_attr(&mut self, attr: &mut GroupAttr) -> Result<(), AttrError> {
        let slot = self.attrs.release(attr)?;
        sweep_slot(slot, self.groups.iter_mut().map(|g| &mut g.attrs));
        Ok(())
    }

    /// Set the value of a group attribute.
    pub(crate) fn set_group_attr(
        &mut self,
        group: GroupId,
        attr: &GroupAttr,
        value: impl Into<String>,
    ) -> Result<(), AttrError> {
        let index = self.attr_target(group)?;
        self.attrs.set(&mut self.groups[index].attrs, attr, value.into())
    }

    /// Get the value of a group attribute.
    pub fn group_attr(&self, group: GroupId, attr: &GroupAttr) -> Result<&str, AttrError> {
        let index = self.attr_target(group)?;
        self.attrs.get(&self.groups[index].attrs, attr)
    }

    /// Check whether a group attribute is set.
    pub fn is_group_attr_set(&self, group: GroupId, attr: &GroupAttr) -> Result<bool, AttrError> {
        let index = self.attr_target(group)?;
        self.attrs.is_set(&self.groups[index].attrs, attr)
    }

    /// Remove a group attribute value from one group.
    pub(crate) fn remove_group_attr(&mut self, group: GroupId, attr: &GroupAttr) -> Result<(), AttrError> {
        let index = self.attr_target(group)?;
        self.attrs.remove(&mut self.groups[index].attrs, attr)
    }

    fn attr_target(&self, group: GroupId) -> Result<usize, AttrError> {
        self.resolve(group).map_err(|_| AttrError::UnknownElement {
            kind: "group",
            id: group.id(),
            owner: self.id,
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Crate-internal structure
    // ─────────────────────────────────────────────────────────────────────

    pub(crate) fn resolve(&self, id: GroupId) -> Result<usize, GraphError> {
        if id.owner() == self.id && id.index() < self.groups.len() {
            Ok(id.index())
        } else {
            Err(GraphError::UnknownGroup(id))
        }
    }

    pub(crate) fn get(&self, id: GroupId) -> &Group {
        &self.groups[id.index()]
    }

    pub(crate) fn groups(&self) -> &[Group] {
        &self.groups
    }

    #[cfg(test)]
    pub(crate) fn groups_mut(&mut self) -> &mut [Group] {
        &mut self.groups
    }

    pub(crate) fn successor(&self, g: GroupId) -> Option<GroupId> {
        if let Some(child) = self.get(g).first_child {
            return Some(child);
        }

        let mut cursor = Some(g);
        while let Some(id) = cursor {
            let group = self.get(id);
            if let Some(sibling) = group.next_sibling {
                return Some(sibling);
            }
            cursor = group.parent;
        }

        None
    }

    pub(crate) fn predecessor(&self, g: GroupId) -> Option<GroupId> {
        let group = self.get(g);
        match group.prev_sibling {
            Some(sibling) => Some(self.deepest_last(sibling)),
            None => group.parent,
        }
    }

    fn deepest_last(&self, mut g: GroupId) -> GroupId {
        while let Some(child) = self.get(g).last_child {
            g = child;
        }
        g
    }

    /// Walk up from `g`; bounded by the group count so a corrupted cycle ends.
    pub(crate) fn within(&self, g: GroupId, ancestor: GroupId) -> bool {
        let mut cursor = Some(g);
        let mut steps = 0;

        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.groups.len() {
                return false;
            }
            cursor = self.get(id).parent;
        }

        false
    }

    /// All groups of the subtree rooted at `g`, `g` first.
    pub(crate) fn subtree(&self, g: GroupId) -> Vec<GroupId> {
        let mut out = Vec::new();
        let mut stack = vec![g];

        while let Some(id) = stack.pop() {
            out.push(id);
            let mut child = self.get(id).first_child;
            while let Some(c) = child {
                stack.push(c);
                child = self.get(c).next_sibling;
            }
        }

        out
    }

    /// Unlink `g` from its parent's child list. `g` must not be the root.
    pub(crate) fn detach_group(&mut self, g: GroupId) {
        let (parent, prev, next) = {
            let group = self.get(g);
            (group.parent, group.prev_sibling, group.next_sibling)
        };
        let Some(parent) = parent else { return };

        match prev {
            Some(p) => self.groups[p.index()].next_sibling = next,
            None => self.groups[parent.index()].first_child = next,
        }
        match next {
            Some(n) => self.groups[n.index()].prev_sibling = prev,
            None => self.groups[parent.index()].last_child = prev,
        }

        let group = &mut self.groups[g.index()];
        group.parent = None;
        group.prev_sibling = None;
        group.next_sibling = None;
    }

    /// Insert a detached `g` at the head of `parent`'s child list.
    pub(crate) fn attach_group(&mut self, g: GroupId, parent: GroupId) {
        let first = self.get(parent).first_child;

        match first {
            Some(f) => self.groups[f.index()].prev_sibling = Some(g),
            None => self.groups[parent.index()].last_child = Some(g),
        }

        let group = &mut self.groups[g.index()];
        group.parent = Some(parent);
        group.prev_sibling = None;
        group.next_sibling = first;

        self.groups[parent.index()].first_child = Some(g);
    }

    /// Recompute levels of the subtree rooted at `g` from its parent's level.
    pub(crate) fn relevel(&mut self, g: GroupId) {
        for id in self.subtree(g) {
            let level = match self.get(id).parent {
                Some(p) => self.get(p).level + 1,
                None => ROOT_LEVEL,
            };
            self.groups[id.index()].level = level;
        }
    }

    /// Head-insert `node` into `group`'s member list and point its backlink there.
    pub(crate) fn link_node(&mut self, nodes: &mut [Node], group: GroupId, node: NodeId) {
        let first = self.get(group).first_node;

        match first {
            Some(f) => nodes[f.index()].prev_in_group = Some(node),
            None => self.groups[group.index()].last_node = Some(node),
        }

        let record = &mut nodes[node.index()];
        record.group = group;
        record.next_in_group = first;
        record.prev_in_group = None;

        self.groups[group.index()].first_node = Some(node);
    }

    /// Unlink `node` from the member list of the group its backlink names.
    pub(crate) fn unlink_node(&mut self, nodes: &mut [Node], node: NodeId) {
        let (group, prev, next) = {
            let record = &nodes[node.index()];
            (record.group, record.prev_in_group, record.next_in_group)
        };

        match next {
            Some(n) => nodes[n.index()].prev_in_group = prev,
            None => self.groups[group.index()].last_node = prev,
        }
        match prev {
            Some(p) => nodes[p.index()].next_in_group = next,
            None => self.groups[group.index()].first_node = next,
        }

        let record = &mut nodes[node.index()];
        record.prev_in_group = None;
        record.next_in_group = None;
    }

    /// Head-insert `edge` into `group`'s edge list and record the attribution.
    pub(crate) fn link_edge(&mut self, edges: &mut [Edge], group: GroupId, edge: EdgeId) {
        let first = self.get(group).first_edge;

        if let Some(f) = first {
            edges[f.index()].prev_in_group = Some(edge);
        }

        let record = &mut edges[edge.index()];
        record.group = Some(group);
        record.next_in_group = first;
        record.prev_in_group = None;

        self.groups[group.index()].first_edge = Some(edge);
    }

    /// Unlink `edge` from its current group's edge list, if it has one.
    pub(crate) fn unlink_edge(&mut self, edges: &mut [Edge], edge: EdgeId) {
        let (group, prev, next) = {
            let record = &edges[edge.index()];
            (record.group, record.prev_in_group, record.next_in_group)
        };
        let Some(group) = group else { return };

        if let Some(n) = next {
            edges[n.index()].prev_in_group = prev;
        }
        match prev {
            Some(p) => edges[p.index()].next_in_group = next,
            None => self.groups[group.index()].first_edge = next,
        }

        let record = &mut edges[edge.index()];
        record.group = None;
        record.prev_in_group = None;
        record.next_in_group = None;
    }
}

/// Depth-first preorder iterator over groups.
#[derive(Debug, Clone)]
pub struct Preorder<'a> {
    tree: &'a Hierarchy,
    next: Option<GroupId>,
}

impl Iterator for Preorder<'_> {
    type Item = GroupId;

    fn next(&mut self) -> Option<GroupId> {
        let current = self.next?;
        self.next = self.tree.successor(current);
        Some(current)
    }
}

/// Iterator over the children of one group.
#[derive(Debug, Clone)]
pub struct Children<'a> {
    tree: &'a Hierarchy,
    next: Option<GroupId>,
}

impl Iterator for Children<'_> {
    type Item = GroupId;

    fn next(&mut self) -> Option<GroupId> {
        let current = self.next?;
        self.next = self.tree.get(current).next_sibling;
        Some(current)
    }
}
