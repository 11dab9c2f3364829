//! Arena of goal tree nodes.
//!
//! The forest owns every [`Node`] in a map keyed by [`NodeId`]. Parent and
//! child links are ids, so there is no shared ownership and no reference
//! cycle. The structural primitives here keep `parent` and `children`
//! consistent but enforce no policy; root protection, cycle checks and stat
//! archival live in [`TreeStateManager`](crate::tree::TreeStateManager).

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::node::{Node, NodeId, NodeRecord};
use crate::types::Stats;

/// Where a node sat before it was detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Index in the children list of the given parent.
    Child { parent: NodeId, index: usize },
    /// Index in the forest root list.
    Root { index: usize },
}

/// Owning container of all nodes of one tree perspective.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forest {
    nodes: HashMap<NodeId, Node>,
    roots: Vec<NodeId>,
}

impl Forest {
    /// Creates an empty forest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a forest from persisted records.
    ///
    /// Missing, unparseable or duplicate uids are replaced with fresh ids so
    /// that every node in the arena has a unique key.
    #[must_use]
    pub fn from_records(records: &[NodeRecord]) -> Self {
        let mut forest = Self::new();
        let mut seen = HashSet::new();
        for record in records {
            let id = forest.insert_record(record, None, &mut seen);
            forest.roots.push(id);
        }
        forest
    }

    fn insert_record(
        &mut self,
        record: &NodeRecord,
        parent: Option<NodeId>,
        seen: &mut HashSet<NodeId>,
    ) -> NodeId {
        let id = match record.uid.as_deref().and_then(NodeId::parse) {
            Some(id) if seen.insert(id) => id,
            parsed => {
                if parsed.is_some() {
                    warn!(label = %record.label, "Duplicate node uid, assigning a fresh one");
                }
                let fresh = NodeId::new();
                seen.insert(fresh);
                fresh
            }
        };

        let mut node = Node::from_record(record, id);
        node.parent = parent;
        self.nodes.insert(id, node);

        let children: Vec<NodeId> = record
            .children
            .iter()
            .map(|child| self.insert_record(child, Some(id), seen))
            .collect();
        if let Some(node) = self.nodes.get_mut(&id) {
            node.children = children;
        }
        id
    }

    /// Serializes the forest back to nested records, roots in order.
    #[must_use]
    pub fn to_records(&self) -> Vec<NodeRecord> {
        self.roots
            .iter()
            .filter_map(|id| self.record_of(*id))
            .collect()
    }

    /// Serializes one subtree.
    #[must_use]
    pub fn record_of(&self, id: NodeId) -> Option<NodeRecord> {
        let node = self.nodes.get(&id)?;
        let children = node
            .children
            .iter()
            .filter_map(|child| self.record_of(*child))
            .collect();
        Some(node.to_record(children))
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Top-level nodes in order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Inserts a detached node at the end of the root list.
    pub(crate) fn push_root(&mut self, mut node: Node) -> NodeId {
        let id = node.id;
        node.parent = None;
        self.nodes.insert(id, node);
        self.roots.push(id);
        id
    }

    /// Inserts a detached node at `index` in the root list.
    pub(crate) fn insert_root(&mut self, index: usize, mut node: Node) -> NodeId {
        let id = node.id;
        node.parent = None;
        self.nodes.insert(id, node);
        let index = index.min(self.roots.len());
        self.roots.insert(index, id);
        id
    }

    /// Inserts a new node as the last child of `parent`.
    ///
    /// Returns `None` if the parent does not exist.
    pub(crate) fn push_child(&mut self, parent: NodeId, mut node: Node) -> Option<NodeId> {
        let id = node.id;
        let parent_node = self.nodes.get_mut(&parent)?;
        parent_node.children.push(id);
        node.parent = Some(parent);
        self.nodes.insert(id, node);
        Some(id)
    }

    /// Links an existing, detached node as the last child of `parent`.
    pub(crate) fn attach(&mut self, child: NodeId, parent: NodeId) {
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(child);
        }
        if let Some(child_node) = self.nodes.get_mut(&child) {
            child_node.parent = Some(parent);
        }
    }

    /// Unlinks a node from its parent or from the root list.
    ///
    /// The node and its subtree stay in the arena. Returns the slot the node
    /// occupied, or `None` if it was not linked anywhere.
    pub(crate) fn detach(&mut self, id: NodeId) -> Option<Slot> {
        let parent = self.nodes.get(&id)?.parent;
        let slot = match parent {
            Some(parent) => {
                let siblings = &mut self.nodes.get_mut(&parent)?.children;
                let index = siblings.iter().position(|c| *c == id)?;
                siblings.remove(index);
                Slot::Child { parent, index }
            }
            None => {
                let index = self.roots.iter().position(|r| *r == id)?;
                self.roots.remove(index);
                Slot::Root { index }
            }
        };
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = None;
        }
        Some(slot)
    }

    /// Drops a detached node and every descendant from the arena.
    pub(crate) fn remove_subtree(&mut self, id: NodeId) {
        for node_id in self.preorder(id) {
            self.nodes.remove(&node_id);
        }
    }

    /// Detaches `id` and splices its children into the vacated slot, in order.
    ///
    /// The node itself is dropped from the arena. Returns the slot it held.
    pub(crate) fn splice_out(&mut self, id: NodeId) -> Option<Slot> {
        let slot = self.detach(id)?;
        let node = self.nodes.remove(&id)?;

        match slot {
            Slot::Child { parent, index } => {
                for child in &node.children {
                    if let Some(child_node) = self.nodes.get_mut(child) {
                        child_node.parent = Some(parent);
                    }
                }
                if let Some(parent_node) = self.nodes.get_mut(&parent) {
                    parent_node
                        .children
                        .splice(index..index, node.children.iter().copied());
                }
            }
            Slot::Root { index } => {
                for child in &node.children {
                    if let Some(child_node) = self.nodes.get_mut(child) {
                        child_node.parent = None;
                    }
                }
                self.roots
                    .splice(index..index, node.children.iter().copied());
            }
        }
        Some(slot)
    }

    /// Returns `true` if `ancestor` is `id` or lies on the path from `id` to its root.
    #[must_use]
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.nodes.get(&current).and_then(|n| n.parent);
        }
        false
    }

    /// Pre-order ids of the subtree rooted at `id`.
    #[must_use]
    pub fn preorder(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                out.push(current);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Pre-order ids of every tree, roots in order.
    #[must_use]
    pub fn preorder_all(&self) -> Vec<NodeId> {
        self.roots.iter().flat_map(|r| self.preorder(*r)).collect()
    }

    /// Archived plus live intention stats over the whole subtree of `id`.
    #[must_use]
    pub fn subtree_mass(&self, id: NodeId) -> Stats {
        self.preorder(id)
            .into_iter()
            .filter_map(|n| self.nodes.get(&n))
            .map(Node::own_mass)
            .sum()
    }

    /// Stat mass of every tree in the forest.
    #[must_use]
    pub fn total_mass(&self) -> Stats {
        self.nodes.values().map(Node::own_mass).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds `A -> B -> [C, D]` and returns the ids in that order.
    fn chain() -> (Forest, [NodeId; 4]) {
        let mut forest = Forest::new();
        let a = forest.push_root(Node::new("A"));
        let b = forest.push_child(a, Node::new("B")).unwrap();
        let c = forest.push_child(b, Node::new("C")).unwrap();
        let d = forest.push_child(b, Node::new("D")).unwrap();
        (forest, [a, b, c, d])
    }

    #[test]
    fn push_child_links_both_directions() {
        let (forest, [a, b, ..]) = chain();

        assert_eq!(forest.get(b).unwrap().parent, Some(a));
        assert_eq!(forest.get(a).unwrap().children, vec![b]);
    }

    #[test]
    fn push_child_to_missing_parent_is_none() {
        let mut forest = Forest::new();
        assert!(forest.push_child(NodeId::new(), Node::new("orphan")).is_none());
        assert!(forest.is_empty());
    }

    #[test]
    fn preorder_visits_parents_before_children_in_order() {
        let (forest, [a, b, c, d]) = chain();
        assert_eq!(forest.preorder(a), vec![a, b, c, d]);
    }

    #[test]
    fn detach_reports_slot_and_clears_parent() {
        let (mut forest, [a, b, c, d]) = chain();

        let slot = forest.detach(d);

        assert_eq!(slot, Some(Slot::Child { parent: b, index: 1 }));
        assert!(forest.get(d).unwrap().parent.is_none());
        assert_eq!(forest.get(b).unwrap().children, vec![c]);
        assert_eq!(forest.roots(), &[a]);
    }

    #[test]
    fn remove_subtree_drops_descendants() {
        let (mut forest, [a, b, ..]) = chain();

        forest.detach(b);
        forest.remove_subtree(b);

        assert_eq!(forest.len(), 1);
        assert!(forest.get(a).unwrap().children.is_empty());
    }

    #[test]
    fn splice_out_promotes_children_at_same_index() {
        let (mut forest, [a, b, c, d]) = chain();
        let e = forest.push_child(a, Node::new("E")).unwrap();

        forest.splice_out(b);

        assert_eq!(forest.get(a).unwrap().children, vec![c, d, e]);
        assert_eq!(forest.get(c).unwrap().parent, Some(a));
        assert_eq!(forest.get(d).unwrap().parent, Some(a));
        assert!(!forest.contains(b));
    }

    #[test]
    fn splice_out_root_promotes_children_to_roots() {
        let (mut forest, [a, b, ..]) = chain();

        forest.splice_out(a);

        assert_eq!(forest.roots(), &[b]);
        assert!(forest.get(b).unwrap().parent.is_none());
    }

    #[test]
    fn ancestor_walk() {
        let (forest, [a, b, c, d]) = chain();

        assert!(forest.is_ancestor_or_self(a, d));
        assert!(forest.is_ancestor_or_self(b, c));
        assert!(forest.is_ancestor_or_self(c, c));
        assert!(!forest.is_ancestor_or_self(c, d));
        assert!(!forest.is_ancestor_or_self(d, a));
    }

    #[test]
    fn records_round_trip_preserves_structure_and_ids() {
        let (forest, [a, ..]) = chain();

        let records = forest.to_records();
        let rebuilt = Forest::from_records(&records);

        assert_eq!(rebuilt, forest);
        assert_eq!(rebuilt.roots(), &[a]);
    }

    #[test]
    fn duplicate_uids_get_fresh_ids() {
        let mut record = NodeRecord::new("root");
        let child = NodeRecord::new("child");
        record.children = vec![child.clone(), child];

        let forest = Forest::from_records(&[record]);

        assert_eq!(forest.len(), 3);
        let root = forest.roots()[0];
        let children = &forest.get(root).unwrap().children;
        assert_ne!(children[0], children[1]);
    }

    #[test]
    fn subtree_mass_includes_descendants() {
        let (mut forest, [a, b, c, _]) = chain();
        forest.get_mut(b).unwrap().archived_stats = Stats::new(10.0, 1, 2);
        forest.get_mut(c).unwrap().archived_stats = Stats::new(5.0, 3, 4);
        forest.get_mut(a).unwrap().archived_stats = Stats::new(100.0, 0, 0);

        assert_eq!(forest.subtree_mass(b), Stats::new(15.0, 4, 6));
        assert_eq!(forest.total_mass(), Stats::new(115.0, 4, 6));
    }
}
