use thiserror::Error;

use crate::state::Phase;

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: Phase, to: Phase },

    #[error("diff error: {0}")]
    Diff(#[from] ripple_diff::DiffError),
}

pub type CollectionResult<T> = Result<T, CollectionError>;
