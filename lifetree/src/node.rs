//! Goal tree node entity and its persisted form.
//!
//! In memory a [`Node`] lives in a [`Forest`](crate::forest::Forest) arena and
//! refers to its parent and children by [`NodeId`]. On disk the same data is a
//! nested [`NodeRecord`] tree, one JSON object per node with its children
//! inlined.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Intention, Layout, NodeStatus, Stats};

/// Label given to records that were persisted without one.
const UNKNOWN_LABEL: &str = "Unknown";

/// Stable node identifier, generated once and never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a persisted uid string.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One goal, value or task in the tree.
///
/// Fields are public for reading; all mutation is routed through
/// [`TreeStateManager`](crate::tree::TreeStateManager) so that it is
/// undo-tracked and persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub status: NodeStatus,
    pub description: String,
    /// Non-owning back reference; `None` for forest roots.
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub intentions: Vec<Intention>,
    /// Totals inherited from deleted children and cleared intentions.
    pub archived_stats: Stats,
    /// Window titles the distraction-control collaborator allows.
    pub allowed_windows: Vec<String>,
    pub layout: Layout,
    /// Seconds accumulated toward the current productivity cycle.
    pub cycle_time: u64,
    /// Completed productivity cycles.
    pub cycle_count: u32,
}

impl Node {
    /// Creates a detached node with default fields.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            label: label.into(),
            status: NodeStatus::Neutral,
            description: String::new(),
            parent: None,
            children: Vec::new(),
            intentions: Vec::new(),
            archived_stats: Stats::ZERO,
            allowed_windows: Vec::new(),
            layout: Layout::default(),
            cycle_time: 0,
            cycle_count: 0,
        }
    }

    /// Archived stats plus the stats of every live intention, excluding children.
    #[must_use]
    pub fn own_mass(&self) -> Stats {
        self.archived_stats + self.intentions.iter().map(|i| i.stats).sum::<Stats>()
    }

    /// Returns `true` if at least one intention is not completed.
    #[must_use]
    pub fn has_incomplete_intentions(&self) -> bool {
        self.intentions.iter().any(|i| !i.is_completed())
    }

    /// Converts this node to its persisted form with the given child records.
    pub(crate) fn to_record(&self, children: Vec<NodeRecord>) -> NodeRecord {
        NodeRecord {
            label: self.label.clone(),
            uid: Some(self.id.to_string()),
            status: self.status,
            description: self.description.clone(),
            x: self.layout.x,
            y: self.layout.y,
            width: self.layout.width,
            height: self.layout.height,
            intentions: self.intentions.clone(),
            archived_stats: self.archived_stats,
            allowed_windows: self.allowed_windows.clone(),
            cycle_time: self.cycle_time,
            cycle_count: self.cycle_count,
            children,
        }
    }

    /// Builds a detached node from a record, ignoring its children.
    ///
    /// The caller supplies the id so it can replace missing or duplicate uids.
    pub(crate) fn from_record(record: &NodeRecord, id: NodeId) -> Self {
        Self {
            id,
            label: record.label.clone(),
            status: record.status,
            description: record.description.clone(),
            parent: None,
            children: Vec::new(),
            intentions: record.intentions.clone(),
            archived_stats: record.archived_stats,
            allowed_windows: record.allowed_windows.clone(),
            layout: Layout {
                x: record.x,
                y: record.y,
                width: record.width,
                height: record.height,
            },
            cycle_time: record.cycle_time,
            cycle_count: record.cycle_count,
        }
    }
}

fn default_label() -> String {
    UNKNOWN_LABEL.to_string()
}

fn default_width() -> f64 {
    Layout::default().width
}

fn default_height() -> f64 {
    Layout::default().height
}

/// Persisted form of a node and, recursively, its subtree.
///
/// Every field except `label` is optional on disk so that files written by
/// older versions keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub status: NodeStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default)]
    pub intentions: Vec<Intention>,
    #[serde(default)]
    pub archived_stats: Stats,
    #[serde(default)]
    pub allowed_windows: Vec<String>,
    #[serde(default)]
    pub cycle_time: u64,
    #[serde(default)]
    pub cycle_count: u32,
    #[serde(default)]
    pub children: Vec<NodeRecord>,
}

impl NodeRecord {
    /// Creates a record for a brand-new childless node.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Node::new(label).to_record(Vec::new())
    }
}
