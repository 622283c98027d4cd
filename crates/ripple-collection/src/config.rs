use ripple_diff::DiffConfig;
use serde::{Deserialize, Serialize};

/// Configuration for a [`Collection`](crate::Collection).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Name attached to the collection's tracing span.
    pub label: String,
    /// Settings for the diff run on every transition.
    pub diff: DiffConfig,
    /// Enforce the load-cycle transition graph exactly. When off, any
    /// transition except back into `NotLoaded` is accepted.
    pub strict_transitions: bool,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            label: "collection".into(),
            diff: DiffConfig::default(),
            strict_transitions: false,
        }
    }
}

impl CollectionConfig {
    /// Default configuration with the given label.
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    /// Same configuration with strict transitions turned on.
    pub fn strict(mut self) -> Self {
        self.strict_transitions = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_diff::DuplicatePolicy;

    #[test]
    fn defaults() {
        let config = CollectionConfig::default();
        assert_eq!(config.label, "collection");
        assert!(!config.strict_transitions);
        assert!(CollectionConfig::labeled("inbox").strict().strict_transitions);
    }

    #[test]
    fn nested_partial_json() {
        let config: CollectionConfig =
            serde_json::from_str(r#"{"label":"feed","diff":{"duplicate_policy":"reject"}}"#)
                .unwrap();
        assert_eq!(config.label, "feed");
        assert_eq!(config.diff.duplicate_policy, DuplicatePolicy::Reject);
        assert!(config.diff.detect_updates);
    }
}
