//! Tree state manager: the single mutator of a goal tree.
//!
//! The manager owns one [`Forest`] per perspective and guarantees:
//!
//! - exactly one designated root (labelled per [`Perspective::root_label`])
//!   exists after load, and it is never renamed, deleted or reparented;
//! - reparenting never creates a cycle;
//! - deleting nodes never loses statistics: the removed stat mass is added to
//!   the parent's `archived_stats`.
//!
//! Every structural operation validates first, then pushes a full snapshot
//! onto the undo stack (clearing redo), applies the change and rewrites the
//! snapshot file. Rejected operations leave both the tree and the undo stack
//! untouched. Both stacks are capped at `undo_limit` entries; the oldest
//! entry is discarded first.
//!
//! The manager is not synchronized. Hosts that touch it from several threads
//! must wrap it in a `Mutex` so a snapshot and its mutation stay atomic.
//!
//! # Example
//!
//! ```
//! use lifetree::tree::TreeStateManager;
//! use lifetree::types::{NodeStatus, Perspective};
//!
//! let mut tree = TreeStateManager::in_memory(Perspective::Problems);
//! let health = tree.add_root("Health", 120.0, 80.0);
//! let sleep = tree.add_child(health, "Sleep by 11").unwrap();
//! tree.set_status(sleep, NodeStatus::Solved).unwrap();
//!
//! assert_eq!(tree.get_all_nodes().len(), 3);
//! tree.undo().unwrap();
//! assert_eq!(tree.node(sleep).unwrap().status, NodeStatus::Neutral);
//! ```

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::forest::Forest;
use crate::node::{Node, NodeId, NodeRecord};
use crate::persistence::{quarantine, read_json, write_json_atomic, PersistenceError};
use crate::types::{Intention, IntentionStatus, Layout, NodeStatus, Perspective, Stats};

/// Default depth of the undo and redo stacks.
pub const DEFAULT_UNDO_LIMIT: usize = 100;

/// Vertical offset of a new child relative to its parent.
const CHILD_Y_OFFSET: f64 = 50.0;

/// Reasons a tree operation is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// No node with this id exists in the tree.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// The designated root cannot be renamed, deleted or reparented.
    #[error("the root node cannot be modified")]
    RootProtected,

    /// The new label is empty after trimming whitespace.
    #[error("label cannot be empty")]
    EmptyLabel,

    /// The intention text is empty after trimming whitespace.
    #[error("intention text cannot be empty")]
    EmptyIntention,

    /// A node cannot become its own parent.
    #[error("a node cannot be its own parent")]
    SelfParent,

    /// The new parent is a descendant of the node being moved.
    #[error("reparenting would create a cycle")]
    WouldCreateCycle,

    /// None of the requested nodes can be deleted.
    #[error("nothing to delete")]
    NothingToDelete,

    /// The undo stack is empty.
    #[error("nothing to undo")]
    NothingToUndo,

    /// The redo stack is empty.
    #[error("nothing to redo")]
    NothingToRedo,

    /// The node has no intention at this index.
    #[error("intention {index} not found on node {node}")]
    IntentionNotFound { node: NodeId, index: usize },
}

/// A snapshot file holds either a list of root trees or a single tree.
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotFile {
    Forest(Vec<NodeRecord>),
    Single(Box<NodeRecord>),
}

impl SnapshotFile {
    fn into_records(self) -> Vec<NodeRecord> {
        match self {
            SnapshotFile::Forest(records) => records,
            SnapshotFile::Single(record) => vec![*record],
        }
    }
}

type Snapshot = Vec<NodeRecord>;

/// Owner of one goal tree with undo/redo and file persistence.
#[derive(Debug)]
pub struct TreeStateManager {
    perspective: Perspective,
    forest: Forest,
    undo_stack: VecDeque<Snapshot>,
    redo_stack: VecDeque<Snapshot>,
    undo_limit: usize,
    path: Option<PathBuf>,
}

impl TreeStateManager {
    /// Creates a manager holding only the designated root, without storage.
    #[must_use]
    pub fn in_memory(perspective: Perspective) -> Self {
        Self::from_records(perspective, Vec::new(), None, DEFAULT_UNDO_LIMIT)
    }

    /// Loads a tree from `path`.
    ///
    /// A missing or malformed file is not an error: the manager starts with a
    /// fresh single-root tree and logs why. Afterwards the designated root is
    /// guaranteed to exist and every other top-level tree is folded in as one
    /// of its children.
    pub fn load(perspective: Perspective, path: impl Into<PathBuf>, undo_limit: usize) -> Self {
        let path = path.into();
        let records = match read_json::<SnapshotFile>(&path) {
            Ok(Some(file)) => {
                let records = file.into_records();
                info!(
                    path = %path.display(),
                    roots = records.len(),
                    "Tree data loaded"
                );
                records
            }
            Ok(None) => {
                info!(path = %path.display(), "No tree data found, starting fresh");
                Vec::new()
            }
            Err(e @ PersistenceError::Json { .. }) => {
                match quarantine(&path) {
                    Ok(moved) => warn!(
                        error = %e,
                        moved_to = %moved.display(),
                        "Unreadable tree data moved aside, starting fresh"
                    ),
                    Err(qe) => warn!(
                        error = %e,
                        quarantine_error = %qe,
                        "Unreadable tree data could not be moved aside, starting fresh"
                    ),
                }
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Failed to load tree data, starting fresh");
                Vec::new()
            }
        };
        Self::from_records(perspective, records, Some(path), undo_limit)
    }

    /// Builds a manager from already-parsed records, normalizing the roots.
    #[must_use]
    pub fn from_records(
        perspective: Perspective,
        records: Vec<NodeRecord>,
        path: Option<PathBuf>,
        undo_limit: usize,
    ) -> Self {
        Self {
            perspective,
            forest: normalize(&records, perspective.root_label()),
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            undo_limit: undo_limit.max(1),
            path,
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn perspective(&self) -> Perspective {
        self.perspective
    }

    /// Snapshot file this manager writes to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.forest.get(id)
    }

    /// The top-level node carrying the perspective's root label.
    #[must_use]
    pub fn designated_root(&self) -> Option<NodeId> {
        let label = self.perspective.root_label();
        self.forest
            .roots()
            .iter()
            .copied()
            .find(|id| self.forest.get(*id).is_some_and(|n| n.label == label))
    }

    /// Returns `true` if `id` is the designated root.
    #[must_use]
    pub fn is_root(&self, id: NodeId) -> bool {
        self.designated_root() == Some(id)
    }

    /// First node in pre-order whose label equals `label`.
    #[must_use]
    pub fn find(&self, label: &str) -> Option<NodeId> {
        self.forest
            .preorder_all()
            .into_iter()
            .find(|id| self.forest.get(*id).is_some_and(|n| n.label == label))
    }

    /// Every node of every tree in pre-order.
    #[must_use]
    pub fn get_all_nodes(&self) -> Vec<&Node> {
        self.forest
            .preorder_all()
            .into_iter()
            .filter_map(|id| self.forest.get(id))
            .collect()
    }

    /// Stat mass of the subtree rooted at `id`.
    #[must_use]
    pub fn total_mass(&self, id: NodeId) -> Stats {
        self.forest.subtree_mass(id)
    }

    /// Stat mass of the whole forest.
    #[must_use]
    pub fn forest_mass(&self) -> Stats {
        self.forest.total_mass()
    }

    /// Deep copy of the current tree in persisted form.
    #[must_use]
    pub fn snapshot(&self) -> Vec<NodeRecord> {
        self.forest.to_records()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    // -------------------------------------------------------------------------
    // Structural operations
    // -------------------------------------------------------------------------

    /// Adds a new top-level goal at `(x, y)`.
    ///
    /// The node becomes a child of the designated root; only if no root exists
    /// is it appended to the forest's root list.
    pub fn add_root(&mut self, label: &str, x: f64, y: f64) -> NodeId {
        self.push_state();

        let mut node = Node::new(label);
        node.layout.x = x;
        node.layout.y = y;
        let id = node.id;

        match self.designated_root() {
            Some(root) => {
                self.forest.push_child(root, node);
            }
            None => {
                self.forest.push_root(node);
            }
        }

        debug!(node_id = %id, label, "Added top-level node");
        self.persist();
        id
    }

    /// Adds a new child under `parent`, placed just below it.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NodeNotFound`] if `parent` does not exist.
    pub fn add_child(&mut self, parent: NodeId, label: &str) -> Result<NodeId, TreeError> {
        let parent_layout = self.require(parent)?.layout;
        self.push_state();

        let mut node = Node::new(label);
        node.layout.x = parent_layout.x;
        node.layout.y = parent_layout.y + CHILD_Y_OFFSET;
        let id = node.id;
        self.forest.push_child(parent, node);

        debug!(node_id = %id, parent_id = %parent, label, "Added child node");
        self.persist();
        Ok(id)
    }

    /// Renames a node. The stored label is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::RootProtected`] for the designated root and
    /// [`TreeError::EmptyLabel`] if `new_label` is blank.
    pub fn rename(&mut self, id: NodeId, new_label: &str) -> Result<(), TreeError> {
        self.require(id)?;
        if self.is_root(id) {
            return Err(TreeError::RootProtected);
        }
        let trimmed = new_label.trim();
        if trimmed.is_empty() {
            return Err(TreeError::EmptyLabel);
        }

        self.push_state();
        if let Some(node) = self.forest.get_mut(id) {
            node.label = trimmed.to_string();
        }
        self.persist();
        Ok(())
    }

    /// Sets the completion status of a node.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NodeNotFound`] if the node does not exist.
    pub fn set_status(&mut self, id: NodeId, status: NodeStatus) -> Result<(), TreeError> {
        self.require(id)?;
        self.push_state();
        if let Some(node) = self.forest.get_mut(id) {
            node.status = status;
        }
        self.persist();
        Ok(())
    }

    /// Replaces the free-text description of a node.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NodeNotFound`] if the node does not exist.
    pub fn set_description(&mut self, id: NodeId, description: &str) -> Result<(), TreeError> {
        self.require(id)?;
        self.push_state();
        if let Some(node) = self.forest.get_mut(id) {
            node.description = description.to_string();
        }
        self.persist();
        Ok(())
    }

    /// Moves `child` (with its subtree) to the end of `new_parent`'s children.
    ///
    /// # Errors
    ///
    /// Rejects moving the designated root, moving a node under itself, and
    /// moving a node under one of its own descendants.
    pub fn reparent(&mut self, child: NodeId, new_parent: NodeId) -> Result<(), TreeError> {
        self.require(child)?;
        self.require(new_parent)?;
        if self.is_root(child) {
            return Err(TreeError::RootProtected);
        }
        if child == new_parent {
            return Err(TreeError::SelfParent);
        }
        if self.forest.is_ancestor_or_self(child, new_parent) {
            return Err(TreeError::WouldCreateCycle);
        }

        self.push_state();
        self.forest.detach(child);
        self.forest.attach(child, new_parent);

        debug!(node_id = %child, parent_id = %new_parent, "Reparented node");
        self.persist();
        Ok(())
    }

    /// Deletes each node together with its subtree.
    ///
    /// The full stat mass of every removed subtree is added to the parent's
    /// archived stats. The designated root and unknown ids are skipped.
    /// Returns the number of subtrees removed.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NothingToDelete`] if no requested node is deletable.
    pub fn delete_subtree(&mut self, ids: &[NodeId]) -> Result<usize, TreeError> {
        let targets = self.deletable(ids)?;
        self.push_state();

        let mut deleted = 0;
        for id in targets {
            // Already gone with an earlier subtree in this batch.
            let Some(node) = self.forest.get(id) else {
                continue;
            };
            let parent = node.parent;
            let mass = self.forest.subtree_mass(id);
            self.archive_into(parent, id, mass);

            self.forest.detach(id);
            self.forest.remove_subtree(id);
            deleted += 1;
        }

        debug!(deleted, "Deleted subtrees");
        self.persist();
        Ok(deleted)
    }

    /// Deletes each node but keeps its children, which take the node's place
    /// in its parent's child list in their original order.
    ///
    /// Only the node's own mass (archived stats plus its intentions) is
    /// archived into the parent, since the children survive with theirs.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NothingToDelete`] if no requested node is deletable.
    pub fn delete_keep_children(&mut self, ids: &[NodeId]) -> Result<usize, TreeError> {
        let targets = self.deletable(ids)?;
        self.push_state();

        let mut deleted = 0;
        for id in targets {
            let Some(node) = self.forest.get(id) else {
                continue;
            };
            let parent = node.parent;
            let mass = node.own_mass();
            self.archive_into(parent, id, mass);

            self.forest.splice_out(id);
            deleted += 1;
        }

        debug!(deleted, "Deleted nodes keeping children");
        self.persist();
        Ok(deleted)
    }

    /// Restores the state before the last tracked operation.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NothingToUndo`] if the undo stack is empty.
    pub fn undo(&mut self) -> Result<(), TreeError> {
        let previous = self.undo_stack.pop_back().ok_or(TreeError::NothingToUndo)?;
        let current = self.forest.to_records();
        push_bounded(&mut self.redo_stack, current, self.undo_limit);
        self.forest = Forest::from_records(&previous);
        self.persist();
        Ok(())
    }

    /// Re-applies the last undone operation.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NothingToRedo`] if the redo stack is empty.
    pub fn redo(&mut self) -> Result<(), TreeError> {
        let next = self.redo_stack.pop_back().ok_or(TreeError::NothingToRedo)?;
        let current = self.forest.to_records();
        push_bounded(&mut self.undo_stack, current, self.undo_limit);
        self.forest = Forest::from_records(&next);
        self.persist();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Intentions
    // -------------------------------------------------------------------------

    /// Appends an active intention to a node and returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::EmptyIntention`] if `text` is blank.
    pub fn add_intention(&mut self, id: NodeId, text: &str) -> Result<usize, TreeError> {
        self.require(id)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(TreeError::EmptyIntention);
        }

        self.push_state();
        let index = match self.forest.get_mut(id) {
            Some(node) => {
                node.intentions.push(Intention::new(text));
                node.intentions.len() - 1
            }
            None => 0,
        };
        self.persist();
        Ok(index)
    }

    /// Marks an intention completed.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::IntentionNotFound`] for a bad index.
    pub fn complete_intention(&mut self, id: NodeId, index: usize) -> Result<(), TreeError> {
        self.require_intention(id, index)?;
        self.push_state();
        if let Some(intention) = self.intention_mut(id, index) {
            intention.status = IntentionStatus::Completed;
        }
        self.persist();
        Ok(())
    }

    /// Removes an intention, archiving its stats into the node.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::IntentionNotFound`] for a bad index.
    pub fn remove_intention(&mut self, id: NodeId, index: usize) -> Result<Intention, TreeError> {
        self.require_intention(id, index)?;
        self.push_state();
        let node = self.forest.get_mut(id).ok_or(TreeError::NodeNotFound(id))?;
        let removed = node.intentions.remove(index);
        node.archived_stats += removed.stats;
        self.persist();
        Ok(removed)
    }

    /// Removes every intention of a node, archiving their stats into it.
    ///
    /// Returns how many were cleared; clearing an empty list is not tracked.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NodeNotFound`] if the node does not exist.
    pub fn clear_intentions(&mut self, id: NodeId) -> Result<usize, TreeError> {
        let count = self.require(id)?.intentions.len();
        if count == 0 {
            return Ok(0);
        }

        self.push_state();
        let node = self.forest.get_mut(id).ok_or(TreeError::NodeNotFound(id))?;
        let cleared: Stats = node.intentions.drain(..).map(|i| i.stats).sum();
        node.archived_stats += cleared;
        debug!(node_id = %id, count, "Cleared intentions");
        self.persist();
        Ok(count)
    }

    // -------------------------------------------------------------------------
    // Live accounting and layout (not undo-tracked)
    // -------------------------------------------------------------------------

    /// Adds stats to one intention. Persisted by the next save.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::IntentionNotFound`] for a bad index.
    pub fn credit_intention(
        &mut self,
        id: NodeId,
        index: usize,
        delta: Stats,
    ) -> Result<(), TreeError> {
        self.require_intention(id, index)?;
        if let Some(intention) = self.intention_mut(id, index) {
            intention.stats += delta;
        }
        Ok(())
    }

    /// Adds `seconds` to the node's productivity cycle, rolling completed
    /// cycles of `limit` seconds into `cycle_count`.
    ///
    /// Returns the number of cycles completed by this call.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NodeNotFound`] if the node does not exist.
    pub fn advance_cycle(&mut self, id: NodeId, seconds: u64, limit: u64) -> Result<u32, TreeError> {
        let node = self.forest.get_mut(id).ok_or(TreeError::NodeNotFound(id))?;
        node.cycle_time += seconds;

        let mut completed = 0;
        if limit > 0 {
            while node.cycle_time >= limit {
                node.cycle_time -= limit;
                node.cycle_count += 1;
                completed += 1;
            }
        }
        if completed > 0 {
            info!(
                node_id = %id,
                label = %node.label,
                cycle_count = node.cycle_count,
                "Productivity cycle completed"
            );
        }
        Ok(completed)
    }

    /// Replaces a node's layout hints.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NodeNotFound`] if the node does not exist.
    pub fn set_layout(&mut self, id: NodeId, layout: Layout) -> Result<(), TreeError> {
        let node = self.forest.get_mut(id).ok_or(TreeError::NodeNotFound(id))?;
        node.layout = layout;
        self.persist();
        Ok(())
    }

    /// Moves a node and all its descendants by `(dx, dy)`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NodeNotFound`] if the node does not exist.
    pub fn translate(&mut self, id: NodeId, dx: f64, dy: f64) -> Result<(), TreeError> {
        self.require(id)?;
        for node_id in self.forest.preorder(id) {
            if let Some(node) = self.forest.get_mut(node_id) {
                node.layout.x += dx;
                node.layout.y += dy;
            }
        }
        self.persist();
        Ok(())
    }

    /// Adds a window title to the node's whitelist. Returns `false` if it was
    /// already present.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NodeNotFound`] if the node does not exist.
    pub fn allow_window(&mut self, id: NodeId, title: &str) -> Result<bool, TreeError> {
        let node = self.forest.get_mut(id).ok_or(TreeError::NodeNotFound(id))?;
        if node.allowed_windows.iter().any(|w| w == title) {
            return Ok(false);
        }
        node.allowed_windows.push(title.to_string());
        self.persist();
        Ok(true)
    }

    /// Removes a window title from the node's whitelist. Returns `false` if it
    /// was not present.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NodeNotFound`] if the node does not exist.
    pub fn disallow_window(&mut self, id: NodeId, title: &str) -> Result<bool, TreeError> {
        let node = self.forest.get_mut(id).ok_or(TreeError::NodeNotFound(id))?;
        let before = node.allowed_windows.len();
        node.allowed_windows.retain(|w| w != title);
        let removed = node.allowed_windows.len() != before;
        if removed {
            self.persist();
        }
        Ok(removed)
    }

    // -------------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------------

    /// Writes the current tree to its snapshot file.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the write fails. In-memory managers
    /// succeed without writing anything.
    pub fn try_save(&self) -> Result<(), PersistenceError> {
        match &self.path {
            Some(path) => write_json_atomic(path, &self.forest.to_records()),
            None => Ok(()),
        }
    }

    /// Writes the current tree, logging and swallowing any failure.
    pub fn save(&self) {
        self.persist();
    }

    fn persist(&self) {
        if let Err(e) = self.try_save() {
            error!(
                perspective = ?self.perspective,
                error = %e,
                "Failed to save tree data, keeping in-memory state"
            );
        }
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn push_state(&mut self) {
        let snapshot = self.forest.to_records();
        push_bounded(&mut self.undo_stack, snapshot, self.undo_limit);
        self.redo_stack.clear();
    }

    fn require(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.forest.get(id).ok_or(TreeError::NodeNotFound(id))
    }

    fn require_intention(&self, id: NodeId, index: usize) -> Result<(), TreeError> {
        if index < self.require(id)?.intentions.len() {
            Ok(())
        } else {
            Err(TreeError::IntentionNotFound { node: id, index })
        }
    }

    fn intention_mut(&mut self, id: NodeId, index: usize) -> Option<&mut Intention> {
        self.forest.get_mut(id)?.intentions.get_mut(index)
    }

    /// Existing, non-root ids in request order.
    fn deletable(&self, ids: &[NodeId]) -> Result<Vec<NodeId>, TreeError> {
        let root = self.designated_root();
        let targets: Vec<NodeId> = ids
            .iter()
            .copied()
            .filter(|id| self.forest.contains(*id) && Some(*id) != root)
            .collect();
        if targets.is_empty() {
            return Err(TreeError::NothingToDelete);
        }
        Ok(targets)
    }

    fn archive_into(&mut self, parent: Option<NodeId>, id: NodeId, mass: Stats) {
        match parent.and_then(|p| self.forest.get_mut(p)) {
            Some(parent_node) => parent_node.archived_stats += mass,
            None if mass.is_zero() => {}
            None => warn!(
                node_id = %id,
                time = mass.time,
                words = mass.words,
                chars = mass.chars,
                "Deleted a top-level node; its stats have no parent to archive into"
            ),
        }
    }
}

fn push_bounded(stack: &mut VecDeque<Snapshot>, snapshot: Snapshot, limit: usize) {
    stack.push_back(snapshot);
    while stack.len() > limit {
        stack.pop_front();
    }
}

/// Builds a forest with exactly one designated root holding every other tree.
fn normalize(records: &[NodeRecord], root_label: &str) -> Forest {
    let mut forest = Forest::from_records(records);

    let existing = forest
        .roots()
        .iter()
        .copied()
        .find(|id| forest.get(*id).is_some_and(|n| n.label == root_label));
    let root = match existing {
        Some(id) => id,
        None => forest.insert_root(0, Node::new(root_label)),
    };

    let others: Vec<NodeId> = forest
        .roots()
        .iter()
        .copied()
        .filter(|id| *id != root)
        .collect();
    for other in others {
        forest.detach(other);
        forest.attach(other, root);
    }
    forest
}
