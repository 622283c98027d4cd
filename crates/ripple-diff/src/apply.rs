//! Reference replay of edit scripts.
//!
//! View layers mirror these semantics against their own index-addressed
//! presentation:
//!
//! - `Delete(i)` removes the old item at `i`.
//! - `Move { from, to }` detaches the old item at `from` like a delete, then
//!   re-attaches it at `to` like an insert.
//! - Re-attachments and `Insert`s are applied together in ascending new index
//!   order, so every position below the one being filled is already final.
//! - `Update(j)` replaces the item at new index `j` last.

use std::collections::BTreeMap;

use ripple_types::{Section, Sections};

use crate::edit::{EditOp, EditScript, SectionedEditScript};
use crate::error::ApplyError;

/// Replay `script` against `old`, drawing inserted and updated values from
/// `new`. For a script produced by diffing `old` against `new`, the result
/// equals `new`.
pub fn apply<T: Clone>(script: &EditScript, old: &[T], new: &[T]) -> Result<Vec<T>, ApplyError> {
    replay(script, old.to_vec(), |j| new.get(j).cloned(), new.len())
}

/// Replay a sectioned script against `old`, drawing inserted sections and
/// inserted or updated items from `new`.
pub fn apply_sections<S: Clone, T: Clone>(
    script: &SectionedEditScript,
    old: &Sections<S, T>,
    new: &Sections<S, T>,
) -> Result<Sections<S, T>, ApplyError> {
    let old_sections = old.as_slice();
    let new_sections = new.as_slice();

    // Tag every section with its origin so item scripts can find their source.
    let tagged: Vec<(Option<usize>, Section<S, T>)> = old_sections
        .iter()
        .cloned()
        .enumerate()
        .map(|(i, s)| (Some(i), s))
        .collect();
    let placed = replay(
        &script.sections,
        tagged,
        |j| new_sections.get(j).cloned().map(|s| (None, s)),
        new_sections.len(),
    )?;

    let mut pending: BTreeMap<usize, usize> = BTreeMap::new();
    for (position, entry) in script.items.iter().enumerate() {
        if pending.insert(entry.new_section, position).is_some() {
            return Err(ApplyError::DuplicateTarget(entry.new_section));
        }
    }

    let mut result = Vec::with_capacity(placed.len());
    for (n, (origin, mut section)) in placed.into_iter().enumerate() {
        if let Some(position) = pending.remove(&n) {
            let entry = &script.items[position];
            if origin != Some(entry.old_section) {
                return Err(ApplyError::SectionMismatch {
                    new_section: n,
                    expected: entry.old_section,
                    found: origin,
                });
            }
            let target = new_sections.get(n).ok_or(ApplyError::IndexOutOfRange {
                op: "section",
                index: n,
                len: new_sections.len(),
            })?;
            section.items = apply(&entry.script, &section.items, &target.items)?;
        }
        result.push(section);
    }

    if let Some((&n, _)) = pending.iter().next() {
        return Err(ApplyError::IndexOutOfRange {
            op: "section",
            index: n,
            len: result.len(),
        });
    }

    Ok(result.into())
}

fn replay<U>(
    script: &EditScript,
    old: Vec<U>,
    mut fetch: impl FnMut(usize) -> Option<U>,
    new_len: usize,
) -> Result<Vec<U>, ApplyError> {
    if let Some(position) = script.first_out_of_order() {
        return Err(ApplyError::NotCanonical { position });
    }

    let old_len = old.len();
    let mut slots: Vec<Option<U>> = old.into_iter().map(Some).collect();
    let mut placements: BTreeMap<usize, U> = BTreeMap::new();

    let mut fetch_new = |op: &'static str, j: usize| {
        fetch(j).ok_or(ApplyError::IndexOutOfRange {
            op,
            index: j,
            len: new_len,
        })
    };

    for op in script {
        match *op {
            EditOp::Delete(i) => {
                vacate(&mut slots, "delete", i, old_len)?;
            }
            EditOp::Move { from, to } => {
                let item = vacate(&mut slots, "move", from, old_len)?;
                place(&mut placements, to, item)?;
            }
            EditOp::Insert(j) => {
                let item = fetch_new("insert", j)?;
                place(&mut placements, j, item)?;
            }
            EditOp::Update(_) => {}
        }
    }

    let mut result: Vec<U> = slots.into_iter().flatten().collect();
    for (j, item) in placements {
        if j > result.len() {
            return Err(ApplyError::IndexOutOfRange {
                op: "place",
                index: j,
                len: result.len(),
            });
        }
        result.insert(j, item);
    }

    for op in script {
        if let EditOp::Update(j) = *op {
            let len = result.len();
            let slot = result.get_mut(j).ok_or(ApplyError::IndexOutOfRange {
                op: "update",
                index: j,
                len,
            })?;
            *slot = fetch_new("update", j)?;
        }
    }

    Ok(result)
}

fn vacate<U>(
    slots: &mut [Option<U>],
    op: &'static str,
    index: usize,
    len: usize,
) -> Result<U, ApplyError> {
    slots
        .get_mut(index)
        .ok_or(ApplyError::IndexOutOfRange { op, index, len })?
        .take()
        .ok_or(ApplyError::AlreadyVacated(index))
}

fn place<U>(placements: &mut BTreeMap<usize, U>, index: usize, item: U) -> Result<(), ApplyError> {
    if placements.insert(index, item).is_some() {
        return Err(ApplyError::DuplicateTarget(index));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::SectionItems;

    #[test]
    fn empty_script_is_identity() {
        let old = vec!['a', 'b'];
        assert_eq!(apply(&EditScript::new(), &old, &old).unwrap(), old);
    }

    #[test]
    fn move_then_insert_lands_on_new_indices() {
        // [a b c] -> [c x a b]
        let old = vec!['a', 'b', 'c'];
        let new = vec!['c', 'x', 'a', 'b'];
        let script = EditScript::from_ops(vec![
            EditOp::Move { from: 2, to: 0 },
            EditOp::Insert(1),
        ]);
        assert_eq!(apply(&script, &old, &new).unwrap(), new);
    }

    #[test]
    fn update_replaces_value_at_new_index() {
        let old = vec![("a", 1), ("b", 1)];
        let new = vec![("b", 1), ("a", 2)];
        let script = EditScript::from_ops(vec![
            EditOp::Move { from: 1, to: 0 },
            EditOp::Update(1),
        ]);
        assert_eq!(apply(&script, &old, &new).unwrap(), new);
    }

    #[test]
    fn rejects_non_canonical_order() {
        let script = EditScript::from_ops(vec![EditOp::Insert(0), EditOp::Delete(0)]);
        assert_eq!(
            apply(&script, &['a'], &['b']),
            Err(ApplyError::NotCanonical { position: 1 })
        );
    }

    #[test]
    fn rejects_stale_delete_index() {
        let script = EditScript::from_ops(vec![EditOp::Delete(5)]);
        assert_eq!(
            apply(&script, &['a'], &[]),
            Err(ApplyError::IndexOutOfRange {
                op: "delete",
                index: 5,
                len: 1
            })
        );
    }

    #[test]
    fn rejects_moving_a_deleted_item() {
        let script = EditScript::from_ops(vec![
            EditOp::Delete(0),
            EditOp::Move { from: 0, to: 0 },
        ]);
        assert_eq!(
            apply(&script, &['a', 'b'], &['a']),
            Err(ApplyError::AlreadyVacated(0))
        );
    }

    #[test]
    fn rejects_insert_beyond_new_snapshot() {
        let script = EditScript::from_ops(vec![EditOp::Insert(3)]);
        assert!(matches!(
            apply(&script, &['a'], &['a', 'b']),
            Err(ApplyError::IndexOutOfRange { op: "insert", .. })
        ));
    }

    #[test]
    fn sectioned_item_script_must_match_origin() {
        let old: Sections<&str, char> =
            vec![Section::new("s1", vec!['a']), Section::new("s2", vec!['b'])].into();
        let new = old.clone();
        let script = SectionedEditScript {
            sections: EditScript::new(),
            items: vec![SectionItems {
                old_section: 1,
                new_section: 0,
                script: EditScript::from_ops(vec![EditOp::Update(0)]),
            }],
        };
        assert_eq!(
            apply_sections(&script, &old, &new),
            Err(ApplyError::SectionMismatch {
                new_section: 0,
                expected: 1,
                found: Some(0),
            })
        );
    }

    #[test]
    fn sectioned_insert_brings_its_items() {
        let old: Sections<&str, char> = vec![Section::new("s1", vec!['a'])].into();
        let new: Sections<&str, char> = vec![
            Section::new("s0", vec!['x', 'y']),
            Section::new("s1", vec!['a']),
        ]
        .into();
        let script = SectionedEditScript {
            sections: EditScript::from_ops(vec![EditOp::Insert(0)]),
            items: vec![],
        };
        assert_eq!(apply_sections(&script, &old, &new).unwrap(), new);
    }
}
