//! Foundation types for Ripple.
//!
//! This crate provides the identity and versioning contract every other
//! Ripple crate builds on. Collections, diffs, and observers are generic over
//! the [`Entity`] trait defined here.
//!
//! # Key Types
//!
//! - [`Entity`] -- Stable identity plus a cheap change-detection version
//! - [`EntityId`] -- Ready-made string-or-integer identity key
//! - [`Version`] -- 64-bit change-detection value
//! - [`Section`] / [`Sections`] -- Keyed partitions of an ordered sequence
//! - [`Token`] / [`TokenGenerator`] -- Process-unique handles for subscriptions and load tickets

pub mod entity;
pub mod error;
pub mod section;
pub mod token;
pub mod version;

pub use entity::{Entity, EntityId};
pub use error::TypeError;
pub use section::{Section, Sections};
pub use token::{Token, TokenGenerator};
pub use version::Version;
