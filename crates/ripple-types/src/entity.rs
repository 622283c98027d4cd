use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The identity-and-versioning contract for anything held in a collection.
///
/// Two entities are the same logical item iff their ids are equal. Two
/// entities with equal ids and equal versions are unchanged for diffing
/// purposes, whatever else differs between them.
///
/// Implementations must keep `id` unique within one snapshot and change
/// `version` whenever rendered content changes. Neither rule is validated
/// beyond duplicate-id detection during diffing.
pub trait Entity {
    /// Stable identity key.
    type Id: Eq + Hash + Clone + fmt::Debug;
    /// Change-detection value, usually [`Version`](crate::Version).
    type Version: Eq + Clone + fmt::Debug;

    /// The entity's stable identity.
    fn id(&self) -> &Self::Id;

    /// The entity's current version.
    fn version(&self) -> Self::Version;
}

impl<T: Entity + ?Sized> Entity for Arc<T> {
    type Id = T::Id;
    type Version = T::Version;

    fn id(&self) -> &Self::Id {
        (**self).id()
    }

    fn version(&self) -> Self::Version {
        (**self).version()
    }
}

impl<T: Entity + ?Sized> Entity for &T {
    type Id = T::Id;
    type Version = T::Version;

    fn id(&self) -> &Self::Id {
        (**self).id()
    }

    fn version(&self) -> Self::Version {
        (**self).version()
    }
}

/// A string-or-integer identity key.
///
/// Covers the two shapes ids take in practice: server-assigned integers and
/// opaque string keys (paths, UUIDs, slugs). Serializes untagged, so JSON
/// `42` and `"abc"` both deserialize directly.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    /// Integer key.
    Int(i64),
    /// String key.
    Str(String),
}

impl EntityId {
    /// Returns the string key, if this is a string id.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            EntityId::Str(s) => Some(s),
            EntityId::Int(_) => None,
        }
    }

    /// Returns the integer key, if this is an integer id.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            EntityId::Int(n) => Some(*n),
            EntityId::Str(_) => None,
        }
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(n) => write!(f, "#{n}"),
            EntityId::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(n) => write!(f, "{n}"),
            EntityId::Str(s) => f.write_str(s),
        }
    }
}

impl FromStr for EntityId {
    type Err = TypeError;

    /// Integers parse as [`EntityId::Int`]; any other non-empty text is a
    /// string key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(TypeError::InvalidEntityId("empty id".into()));
        }
        Ok(s.parse::<i64>()
            .map(EntityId::Int)
            .unwrap_or_else(|_| EntityId::Str(s.to_string())))
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId::Str(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        EntityId::Str(s)
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        EntityId::Int(n)
    }
}
