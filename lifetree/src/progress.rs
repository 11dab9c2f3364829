//! Subtree completion percentages.
//!
//! Every node weighs one unit of mass regardless of depth. A solved node
//! counts its whole subtree as solved, overriding the state of its
//! descendants; an unsolved node contributes nothing solved of its own.
//!
//! # Example
//!
//! ```
//! use lifetree::forest::Forest;
//! use lifetree::node::NodeRecord;
//! use lifetree::progress::percentage;
//! use lifetree::types::NodeStatus;
//!
//! let mut parent = NodeRecord::new("Parent");
//! let mut solved = NodeRecord::new("Solved");
//! solved.status = NodeStatus::Solved;
//! parent.children = vec![solved, NodeRecord::new("Open")];
//!
//! let forest = Forest::from_records(&[parent]);
//! let root = forest.roots()[0];
//! let pct = percentage(&forest, root);
//! assert!((pct - 100.0 / 3.0).abs() < 1e-9);
//! ```

use crate::forest::Forest;
use crate::node::NodeId;

/// Solved and total node counts over a subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mass {
    pub solved: u64,
    pub total: u64,
}

/// Computes the mass of the subtree rooted at `id`.
///
/// Unknown ids have zero mass.
#[must_use]
pub fn subtree_mass(forest: &Forest, id: NodeId) -> Mass {
    let Some(node) = forest.get(id) else {
        return Mass::default();
    };

    let below = node
        .children
        .iter()
        .map(|child| subtree_mass(forest, *child))
        .fold(Mass::default(), |acc, m| Mass {
            solved: acc.solved + m.solved,
            total: acc.total + m.total,
        });

    let total = below.total + 1;
    if node.status.is_solved() {
        Mass {
            solved: total,
            total,
        }
    } else {
        Mass {
            solved: below.solved,
            total,
        }
    }
}

/// Completion percentage of the subtree rooted at `id`, in `[0, 100]`.
#[must_use]
pub fn percentage(forest: &Forest, id: NodeId) -> f64 {
    let mass = subtree_mass(forest, id);
    if mass.total == 0 {
        return 0.0;
    }
    100.0 * mass.solved as f64 / mass.total as f64
}
