//! Load states of a collection.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Variant of a [`CollectionState`] without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NotLoaded,
    Loading,
    Loaded,
    Error,
}

impl Phase {
    /// Whether a collection may go from `self` to `to`.
    ///
    /// Nothing ever re-enters `NotLoaded`. Under `strict` only the load
    /// cycle is allowed: `NotLoaded`, `Loaded`, `Error` and `Loading` may go
    /// to `Loading`, and `Loading` may settle into `Loaded` or `Error`.
    pub fn allows(self, to: Phase, strict: bool) -> bool {
        match (self, to) {
            (_, Phase::NotLoaded) => false,
            (_, Phase::Loading) => true,
            (Phase::Loading, Phase::Loaded | Phase::Error) => true,
            _ => !strict,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::NotLoaded => f.write_str("not_loaded"),
            Phase::Loading => f.write_str("loading"),
            Phase::Loaded => f.write_str("loaded"),
            Phase::Error => f.write_str("error"),
        }
    }
}

/// Why a load failed.
///
/// Carries a display message and, optionally, the underlying error shared
/// behind an `Arc` so the state stays cheap to clone. Only the message is
/// serialized and compared.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoadError {
    message: String,
    #[serde(skip)]
    source: Option<Arc<dyn StdError + Send + Sync>>,
}

impl LoadError {
    /// An error with a message and no underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// An error with a message and an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    /// Wrap an error, using its display text as the message.
    pub fn from_error(source: impl StdError + Send + Sync + 'static) -> Self {
        Self::with_source(source.to_string(), source)
    }

    /// The display message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for LoadError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn StdError + 'static))
    }
}

impl PartialEq for LoadError {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
    }
}

impl Eq for LoadError {}

/// Where a collection is in its load cycle, with the content it shows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionState<C> {
    /// Nothing requested yet. Only ever the initial state.
    NotLoaded,
    /// A fetch is in flight, optionally still showing the previous content.
    Loading(Option<C>),
    /// Content is available.
    Loaded(C),
    /// The last fetch failed.
    Error(LoadError),
}

impl<C> CollectionState<C> {
    /// The variant without its payload.
    pub fn phase(&self) -> Phase {
        match self {
            CollectionState::NotLoaded => Phase::NotLoaded,
            CollectionState::Loading(_) => Phase::Loading,
            CollectionState::Loaded(_) => Phase::Loaded,
            CollectionState::Error(_) => Phase::Error,
        }
    }

    /// Content the state displays: `Loaded(c)` and `Loading(Some(c))` show
    /// `c`, every other state shows nothing.
    pub fn content(&self) -> Option<&C> {
        match self {
            CollectionState::Loaded(content) | CollectionState::Loading(Some(content)) => {
                Some(content)
            }
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, CollectionState::Loading(_))
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, CollectionState::Loaded(_))
    }

    /// The failure, in the `Error` state.
    pub fn error(&self) -> Option<&LoadError> {
        match self {
            CollectionState::Error(err) => Some(err),
            _ => None,
        }
    }
}

impl<C> Default for CollectionState<C> {
    fn default() -> Self {
        CollectionState::NotLoaded
    }
}
