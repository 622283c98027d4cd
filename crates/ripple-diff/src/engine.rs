//! Sequence diff: compare two identity-keyed snapshots.
//!
//! Items are matched by id. Unmatched old items are deleted, unmatched new
//! items are inserted, matched items off the longest increasing run of old
//! indices are moved, and matched items whose versions differ are updated.

use std::collections::hash_map::Entry as MapEntry;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use ripple_types::{Entity, Sections};
use tracing::{debug, warn};

use crate::config::{DiffConfig, DuplicatePolicy};
use crate::edit::{EditOp, EditScript, SectionItems, SectionedEditScript};
use crate::error::{DiffError, DiffResult, Side};
use crate::lis;

/// Computes edit scripts between snapshots.
///
/// The engine holds only configuration. Every method is pure and may be
/// called from any thread on immutable inputs.
#[derive(Clone, Debug, Default)]
pub struct DiffEngine {
    config: DiffConfig,
}

/// Id matching between two snapshots.
struct Matching {
    /// `(old_index, new_index)` pairs, in new order.
    common: Vec<(usize, usize)>,
    /// Unmatched new indices, ascending.
    inserted: Vec<usize>,
    /// Unmatched old indices, ascending.
    deleted: Vec<usize>,
}

impl DiffEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: DiffConfig) -> Self {
        Self { config }
    }

    /// The engine's configuration.
    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Compute the edit script turning `old` into `new`.
    ///
    /// Fails only under [`DuplicatePolicy::Reject`].
    pub fn diff<T: Entity>(&self, old: &[T], new: &[T]) -> DiffResult<EditScript> {
        let matching = self.match_ids(old, new, |item| item.id())?;
        let detect = self.config.detect_updates;
        let script = assemble(&matching, |o, n| detect && old[o].version() != new[n].version());

        debug!(
            old_len = old.len(),
            new_len = new.len(),
            deleted = script.deletions(),
            moved = script.moves(),
            inserted = script.insertions(),
            updated = script.updates(),
            "sequence diff computed"
        );
        Ok(script)
    }

    /// Compute the edit script between two sectioned snapshots.
    ///
    /// Sections are matched by key with the same algorithm as items; then
    /// each section present in both snapshots is diffed item by item.
    pub fn diff_sections<S, T>(
        &self,
        old: &Sections<S, T>,
        new: &Sections<S, T>,
    ) -> DiffResult<SectionedEditScript>
    where
        S: Eq + Hash + Clone + fmt::Debug,
        T: Entity,
    {
        let old_sections = old.as_slice();
        let new_sections = new.as_slice();

        let matching = self.match_ids(old_sections, new_sections, |section| &section.id)?;
        let sections = assemble(&matching, |_, _| false);

        let mut items = Vec::new();
        for &(o, n) in &matching.common {
            let script = self.diff(&old_sections[o].items, &new_sections[n].items)?;
            if !script.is_empty() {
                items.push(SectionItems {
                    old_section: o,
                    new_section: n,
                    script,
                });
            }
        }
        items.sort_by_key(|s| s.new_section);

        debug!(
            old_sections = old_sections.len(),
            new_sections = new_sections.len(),
            section_changes = sections.len(),
            changed_sections = items.len(),
            "sectioned diff computed"
        );
        Ok(SectionedEditScript { sections, items })
    }

    fn match_ids<'a, T, K, F>(&self, old: &'a [T], new: &'a [T], key: F) -> DiffResult<Matching>
    where
        K: Eq + Hash + fmt::Debug + 'a,
        F: Fn(&'a T) -> &'a K,
    {
        let mut old_index: HashMap<&K, usize> = HashMap::with_capacity(old.len());
        for (i, item) in old.iter().enumerate() {
            match old_index.entry(key(item)) {
                MapEntry::Vacant(slot) => {
                    slot.insert(i);
                }
                MapEntry::Occupied(first) => {
                    self.duplicate(Side::Old, first.key(), *first.get(), i)?;
                }
            }
        }

        let mut seen: HashMap<&K, usize> = HashMap::with_capacity(new.len());
        let mut claimed = vec![false; old.len()];
        let mut common = Vec::new();
        let mut inserted = Vec::new();

        for (j, item) in new.iter().enumerate() {
            let k = key(item);
            match seen.entry(k) {
                MapEntry::Occupied(first) => {
                    self.duplicate(Side::New, first.key(), *first.get(), j)?;
                    inserted.push(j);
                    continue;
                }
                MapEntry::Vacant(slot) => {
                    slot.insert(j);
                }
            }
            match old_index.get(k) {
                Some(&i) => {
                    claimed[i] = true;
                    common.push((i, j));
                }
                None => inserted.push(j),
            }
        }

        let deleted = claimed
            .iter()
            .enumerate()
            .filter_map(|(i, &c)| (!c).then_some(i))
            .collect();

        Ok(Matching {
            common,
            inserted,
            deleted,
        })
    }

    fn duplicate<K: fmt::Debug>(
        &self,
        side: Side,
        id: &K,
        first: usize,
        second: usize,
    ) -> DiffResult<()> {
        match self.config.duplicate_policy {
            DuplicatePolicy::Panic => {
                panic!("duplicate id {id:?} in {side} snapshot at indices {first} and {second}")
            }
            DuplicatePolicy::Degrade => {
                warn!(
                    %side,
                    id = ?id,
                    first,
                    second,
                    "duplicate id in snapshot; treating repeat as unmatched"
                );
                Ok(())
            }
            DuplicatePolicy::Reject => Err(DiffError::DuplicateId {
                side,
                id: format!("{id:?}"),
                first,
                second,
            }),
        }
    }
}

/// Lay out a matching as a canonical script.
fn assemble(matching: &Matching, changed: impl Fn(usize, usize) -> bool) -> EditScript {
    let old_order: Vec<usize> = matching.common.iter().map(|&(o, _)| o).collect();
    let stays = lis::increasing_subsequence(&old_order);

    let mut script = EditScript::new();
    for &i in matching.deleted.iter().rev() {
        script.push(EditOp::Delete(i));
    }
    for (&(from, to), &stay) in matching.common.iter().zip(&stays) {
        if !stay {
            script.push(EditOp::Move { from, to });
        }
    }
    for &j in &matching.inserted {
        script.push(EditOp::Insert(j));
    }
    for &(o, n) in &matching.common {
        if changed(o, n) {
            script.push(EditOp::Update(n));
        }
    }
    script
}

/// Diff two sequences with the default configuration.
///
/// Duplicate ids panic in debug builds and degrade in release builds.
pub fn diff<T: Entity>(old: &[T], new: &[T]) -> EditScript {
    match DiffEngine::default().diff(old, new) {
        Ok(script) => script,
        Err(err) => unreachable!("default duplicate policy never rejects: {err}"),
    }
}

/// Diff two sectioned sequences with the default configuration.
pub fn diff_sections<S, T>(old: &Sections<S, T>, new: &Sections<S, T>) -> SectionedEditScript
where
    S: Eq + Hash + Clone + fmt::Debug,
    T: Entity,
{
    match DiffEngine::default().diff_sections(old, new) {
        Ok(script) => script,
        Err(err) => unreachable!("default duplicate policy never rejects: {err}"),
    }
}
