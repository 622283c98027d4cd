//! Edit scripts: the output of the diff engine.
//!
//! An [`EditScript`] is an ordered list of index operations. Scripts produced
//! by the engine are always in canonical order:
//!
//! 1. `Delete`s, by descending old index
//! 2. `Move`s, by ascending target index
//! 3. `Insert`s, by ascending new index
//! 4. `Update`s, by ascending new index
//!
//! Deletes and the source side of moves address the old snapshot; inserts,
//! updates, and the target side of moves address the new snapshot. See
//! [`apply`](crate::apply) for the reference replay semantics.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single index operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditOp {
    /// Remove the item at this old index.
    Delete(usize),
    /// Insert the new snapshot's item at this new index.
    Insert(usize),
    /// The item at old index `from` ends up at new index `to`.
    Move { from: usize, to: usize },
    /// The item at this new index kept its id but changed version.
    Update(usize),
}

impl EditOp {
    /// Position of this kind of operation in canonical order.
    fn phase(&self) -> u8 {
        match self {
            EditOp::Delete(_) => 0,
            EditOp::Move { .. } => 1,
            EditOp::Insert(_) => 2,
            EditOp::Update(_) => 3,
        }
    }

    /// Short name, used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            EditOp::Delete(_) => "delete",
            EditOp::Insert(_) => "insert",
            EditOp::Move { .. } => "move",
            EditOp::Update(_) => "update",
        }
    }
}

impl fmt::Display for EditOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditOp::Delete(i) => write!(f, "delete {i}"),
            EditOp::Insert(j) => write!(f, "insert {j}"),
            EditOp::Move { from, to } => write!(f, "move {from} -> {to}"),
            EditOp::Update(j) => write!(f, "update {j}"),
        }
    }
}

/// Summary accessors shared by flat and sectioned scripts.
pub trait ChangeSet {
    /// Returns `true` if the script describes no change at all.
    fn is_empty(&self) -> bool;

    /// Total number of operations.
    fn change_count(&self) -> usize;
}

/// Ordered list of operations transforming one sequence into another.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditScript {
    ops: Vec<EditOp>,
}

impl EditScript {
    /// Create an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a hand-built list of operations. The list is taken as-is; use
    /// [`EditScript::is_canonical`] to check it.
    pub fn from_ops(ops: Vec<EditOp>) -> Self {
        Self { ops }
    }

    /// Returns `true` if there are no operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// The operations in order.
    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    /// Iterate over the operations in order.
    pub fn iter(&self) -> std::slice::Iter<'_, EditOp> {
        self.ops.iter()
    }

    /// Consume into the underlying operations.
    pub fn into_ops(self) -> Vec<EditOp> {
        self.ops
    }

    /// Number of `Delete` operations.
    pub fn deletions(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, EditOp::Delete(_)))
            .count()
    }

    /// Number of `Insert` operations.
    pub fn insertions(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, EditOp::Insert(_)))
            .count()
    }

    /// Number of `Move` operations.
    pub fn moves(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, EditOp::Move { .. }))
            .count()
    }

    /// Number of `Update` operations.
    pub fn updates(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, EditOp::Update(_)))
            .count()
    }

    /// Returns `true` if the operations are in canonical order.
    pub fn is_canonical(&self) -> bool {
        self.first_out_of_order().is_none()
    }

    /// Position of the first operation that breaks canonical order.
    pub(crate) fn first_out_of_order(&self) -> Option<usize> {
        self.ops
            .windows(2)
            .position(|pair| !in_order(&pair[0], &pair[1]))
            .map(|p| p + 1)
    }

    pub(crate) fn push(&mut self, op: EditOp) {
        self.ops.push(op);
    }
}

fn in_order(a: &EditOp, b: &EditOp) -> bool {
    match (a, b) {
        (EditOp::Delete(x), EditOp::Delete(y)) => x > y,
        (EditOp::Move { to: x, .. }, EditOp::Move { to: y, .. }) => x < y,
        (EditOp::Insert(x), EditOp::Insert(y)) => x < y,
        (EditOp::Update(x), EditOp::Update(y)) => x < y,
        _ => a.phase() < b.phase(),
    }
}

impl ChangeSet for EditScript {
    fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    fn change_count(&self) -> usize {
        self.ops.len()
    }
}

impl<'a> IntoIterator for &'a EditScript {
    type Item = &'a EditOp;
    type IntoIter = std::slice::Iter<'a, EditOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

/// Item-level changes inside one section present in both snapshots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionItems {
    /// Index of the section in the old snapshot.
    pub old_section: usize,
    /// Index of the section in the new snapshot.
    pub new_section: usize,
    /// Item script, indexed within the section.
    pub script: EditScript,
}

/// Changes between two sectioned sequences.
///
/// `sections` describes section-level deletes, moves, and inserts (never
/// updates). `items` holds one entry per surviving section whose items
/// changed, ordered by `new_section`. Inserted sections bring all of their
/// items with them and have no entry; deleted sections take theirs away.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionedEditScript {
    pub sections: EditScript,
    pub items: Vec<SectionItems>,
}

impl SectionedEditScript {
    /// Item script for the section now at `new_section`, if its items changed.
    pub fn items_for(&self, new_section: usize) -> Option<&EditScript> {
        self.items
            .binary_search_by_key(&new_section, |s| s.new_section)
            .ok()
            .map(|i| &self.items[i].script)
    }
}

impl ChangeSet for SectionedEditScript {
    fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.items.iter().all(|s| s.script.is_empty())
    }

    fn change_count(&self) -> usize {
        self.sections.len() + self.items.iter().map(|s| s.script.len()).sum::<usize>()
    }
}
