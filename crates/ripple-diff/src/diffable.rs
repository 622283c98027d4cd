//! Content types a collection can hold and diff.

use std::fmt;
use std::hash::Hash;

use ripple_types::{Entity, Sections};

use crate::edit::{ChangeSet, EditScript, SectionedEditScript};
use crate::engine::DiffEngine;
use crate::error::DiffResult;

/// Snapshot content with an associated edit-script shape.
///
/// `Default` is the empty content shown by states that carry none.
pub trait Diffable: Clone + Default {
    /// Script type describing the change between two snapshots.
    type Script: ChangeSet + Clone + fmt::Debug + Default;

    /// Diff `old` against `new` with `engine`.
    fn diff_with(engine: &DiffEngine, old: &Self, new: &Self) -> DiffResult<Self::Script>;

    /// Number of leaf items in the snapshot.
    fn item_count(&self) -> usize;
}

impl<T: Entity + Clone> Diffable for Vec<T> {
    type Script = EditScript;

    fn diff_with(engine: &DiffEngine, old: &Self, new: &Self) -> DiffResult<EditScript> {
        engine.diff(old, new)
    }

    fn item_count(&self) -> usize {
        self.len()
    }
}

impl<S, T> Diffable for Sections<S, T>
where
    S: Eq + Hash + Clone + fmt::Debug,
    T: Entity + Clone,
{
    type Script = SectionedEditScript;

    fn diff_with(engine: &DiffEngine, old: &Self, new: &Self) -> DiffResult<SectionedEditScript> {
        engine.diff_sections(old, new)
    }

    fn item_count(&self) -> usize {
        Sections::item_count(self)
    }
}
