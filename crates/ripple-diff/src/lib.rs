//! Diff engine for Ripple.
//!
//! Turns two identity-keyed, versioned snapshots into the minimal edit script
//! of deletes, moves, inserts, and updates, in an order an index-based view
//! can replay without touching stale indices.
//!
//! # Key Types
//!
//! - [`DiffEngine`] / [`DiffConfig`] -- Configured diffing of flat and sectioned snapshots
//! - [`EditScript`] / [`EditOp`] -- Canonically ordered index operations
//! - [`SectionedEditScript`] / [`SectionItems`] -- Section-level plus per-section item changes
//! - [`Diffable`] -- Content types a collection can hold and diff
//! - [`apply`] / [`apply_sections`] -- Reference replay of a script

pub mod apply;
pub mod config;
pub mod diffable;
pub mod edit;
pub mod engine;
pub mod error;
pub mod lis;

pub use apply::{apply, apply_sections};
pub use config::{DiffConfig, DuplicatePolicy};
pub use diffable::Diffable;
pub use edit::{ChangeSet, EditOp, EditScript, SectionItems, SectionedEditScript};
pub use engine::{diff, diff_sections, DiffEngine};
pub use error::{ApplyError, DiffError, DiffResult, Side};
