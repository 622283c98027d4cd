//! Version hashing for Ripple.
//!
//! Entity versions are usually content hashes. This crate provides a
//! streaming, domain-separated BLAKE3 hasher that mixes typed values and
//! folds the digest into a [`Version`](ripple_types::Version).
//!
//! All hashing wraps the `blake3` crate; nothing here is custom cryptography,
//! and none of it is meant for security purposes.

pub mod hasher;

pub use hasher::{version_of, version_of_json, HashError, VersionHasher};
