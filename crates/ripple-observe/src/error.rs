use std::thread::ThreadId;

/// Violations of the observer threading contract.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ObserveError {
    /// `notify` was called from a thread other than the designated one.
    #[error("notify from thread {actual:?}, but the list is bound to {expected:?}")]
    WrongThread { expected: ThreadId, actual: ThreadId },

    /// `notify` was called again while a notification pass was running.
    #[error("reentrant notify on the same observer list")]
    Reentrant,

    /// The list is already bound to a different thread.
    #[error("observer list already bound to thread {bound:?}")]
    AlreadyBound { bound: ThreadId },
}

/// Convenience alias for observer results.
pub type ObserveResult<T> = Result<T, ObserveError>;
