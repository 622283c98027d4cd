//! Observable collections for Ripple.
//!
//! A [`Collection`] holds the current [`CollectionState`] of some content,
//! diffs every new state against the previous one, and emits the result as
//! a [`StateChanged`] event to its observers. This is the main entry point
//! for view models.
//!
//! # Key Types
//!
//! - [`Collection`] -- State holder, differ, and observable in one
//! - [`CollectionState`] / [`Phase`] -- Load-cycle state with displayed content
//! - [`LoadTicket`] -- Guard against applying superseded fetch results
//! - [`StateChanged`] -- Event carrying the new state and its edit script

pub mod collection;
pub mod config;
pub mod error;
pub mod state;

pub use collection::{Collection, LoadTicket, StateChanged};
pub use config::CollectionConfig;
pub use error::{CollectionError, CollectionResult};
pub use state::{CollectionState, LoadError, Phase};

// Re-export the pieces consumers need alongside a collection.
pub use ripple_diff::{ChangeSet, Diffable, EditOp, EditScript, SectionedEditScript};
pub use ripple_observe::{Observable, Subscription, SubscriptionSet};
pub use ripple_types::{Entity, EntityId, Section, Sections, Version};
