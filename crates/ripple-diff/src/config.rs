use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What the engine does when one snapshot repeats an id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Treat the duplicate as a programmer error and panic.
    Panic,
    /// Log a warning and treat the repeated occurrence as unmatched: on the
    /// old side it is deleted, on the new side it is inserted. The script
    /// still replays correctly, but identity is best-effort for that id.
    Degrade,
    /// Return [`DiffError::DuplicateId`](crate::DiffError::DuplicateId).
    Reject,
}

impl Default for DuplicatePolicy {
    /// `Panic` in debug builds, `Degrade` in release builds.
    fn default() -> Self {
        if cfg!(debug_assertions) {
            DuplicatePolicy::Panic
        } else {
            DuplicatePolicy::Degrade
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicatePolicy::Panic => f.write_str("panic"),
            DuplicatePolicy::Degrade => f.write_str("degrade"),
            DuplicatePolicy::Reject => f.write_str("reject"),
        }
    }
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "panic" => Ok(DuplicatePolicy::Panic),
            "degrade" => Ok(DuplicatePolicy::Degrade),
            "reject" => Ok(DuplicatePolicy::Reject),
            other => Err(format!("unknown duplicate policy: {other}")),
        }
    }
}

/// Configuration for the [`DiffEngine`](crate::DiffEngine).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Handling of repeated ids within one snapshot.
    pub duplicate_policy: DuplicatePolicy,
    /// Emit `Update` operations for common items whose versions differ.
    /// When off, scripts describe structure only.
    pub detect_updates: bool,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::default(),
            detect_updates: true,
        }
    }
}

impl DiffConfig {
    /// Default configuration with the given duplicate policy.
    pub fn with_policy(duplicate_policy: DuplicatePolicy) -> Self {
        Self {
            duplicate_policy,
            ..Default::default()
        }
    }
}
