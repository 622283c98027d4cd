//! Error types for the diff crate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which snapshot a contract violation was found in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Old,
    New,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Old => f.write_str("old"),
            Side::New => f.write_str("new"),
        }
    }
}

/// Errors that can occur while computing a diff.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    /// Two entities in one snapshot share an id.
    #[error("duplicate id {id} in {side} snapshot at indices {first} and {second}")]
    DuplicateId {
        side: Side,
        /// Debug rendering of the offending id.
        id: String,
        first: usize,
        second: usize,
    },
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;

/// Errors that can occur while replaying an edit script.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    /// The script's operations are not in canonical order.
    #[error("script is not in canonical order at operation {position}")]
    NotCanonical { position: usize },

    /// An index referenced a position outside the snapshot it addresses.
    #[error("{op} index {index} out of range for length {len}")]
    IndexOutOfRange {
        op: &'static str,
        index: usize,
        len: usize,
    },

    /// An old index was deleted or moved twice.
    #[error("old index {0} was already vacated")]
    AlreadyVacated(usize),

    /// Two operations target the same new index.
    #[error("new index {0} targeted more than once")]
    DuplicateTarget(usize),

    /// An item-level script does not line up with the section-level result.
    #[error("item script for new section {new_section} expects old section {expected}, found {found:?}")]
    SectionMismatch {
        new_section: usize,
        expected: usize,
        found: Option<usize>,
    },
}
