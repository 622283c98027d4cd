//! Thread-disciplined observer registry.
//!
//! Callbacks are registered under a mutex and invoked from a snapshot taken
//! at the start of each [`ObserverList::notify`] pass, so they may subscribe
//! or unsubscribe freely while being called:
//!
//! - an observer revoked mid-pass is not invoked for the in-flight event;
//! - an observer added mid-pass first sees the next event.
//!
//! Each list is bound to one designated thread, on the first `notify` or
//! explicitly. Calling `notify` from another thread, or from inside a
//! callback of the same list, violates the contract: debug builds panic and
//! release builds log an error and carry on.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};
use std::thread::{self, ThreadId};

use ripple_types::{Token, TokenGenerator};
use tracing::{debug, error};

use crate::error::{ObserveError, ObserveResult};
use crate::subscription::Subscription;

/// Something that emits events to registered callbacks.
pub trait Observable {
    /// The event type delivered to callbacks.
    type Event;

    /// Register `callback`. It stays registered until the returned
    /// [`Subscription`] is unsubscribed or dropped.
    fn observe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Self::Event) + Send + Sync + 'static;
}

struct Observer<E> {
    token: Token,
    active: AtomicBool,
    callback: Box<dyn Fn(&E) + Send + Sync>,
}

struct Registry<E> {
    observers: Mutex<Vec<Arc<Observer<E>>>>,
}

impl<E> Registry<E> {
    fn remove(&self, token: Token) {
        // Reached from `Subscription::drop`, so recover from poisoning.
        let mut observers = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(pos) = observers.iter().position(|o| o.token == token) {
            let observer = observers.remove(pos);
            observer.active.store(false, Ordering::Release);
            debug!(%token, remaining = observers.len(), "observer removed");
        }
    }
}

/// Registry of callbacks for events of type `E`.
pub struct ObserverList<E> {
    registry: Arc<Registry<E>>,
    tokens: Arc<TokenGenerator>,
    thread: OnceLock<ThreadId>,
    notifying: AtomicBool,
}

impl<E: 'static> ObserverList<E> {
    /// Create an empty list drawing tokens from the process-wide generator.
    pub fn new() -> Self {
        Self::with_generator(TokenGenerator::global())
    }

    /// Create an empty list drawing tokens from `tokens`.
    pub fn with_generator(tokens: Arc<TokenGenerator>) -> Self {
        Self {
            registry: Arc::new(Registry {
                observers: Mutex::new(Vec::new()),
            }),
            tokens,
            thread: OnceLock::new(),
            notifying: AtomicBool::new(false),
        }
    }

    /// Register `callback` for future events.
    ///
    /// May be called from any thread. The returned subscription holds only
    /// a weak reference to the registry.
    pub fn observe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let token = self.tokens.next_token();
        let observer = Arc::new(Observer {
            token,
            active: AtomicBool::new(true),
            callback: Box::new(callback),
        });
        let count = {
            let mut observers = self
                .registry
                .observers
                .lock()
                .expect("observer registry lock poisoned");
            observers.push(observer);
            observers.len()
        };
        debug!(%token, count, "observer registered");

        let registry: Weak<Registry<E>> = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.remove(token);
            }
        })
    }

    /// Deliver `event` to every observer registered when the pass starts,
    /// in registration order.
    ///
    /// Panics raised by a callback propagate to the caller; the list stays
    /// usable afterwards.
    pub fn notify(&self, event: &E) {
        self.check_thread();
        let _pass = NotifyPass::enter(&self.notifying).unwrap_or_else(|| {
            violation(ObserveError::Reentrant);
            NotifyPass::nested(&self.notifying)
        });

        let snapshot: Vec<Arc<Observer<E>>> = self
            .registry
            .observers
            .lock()
            .expect("observer registry lock poisoned")
            .clone();

        for observer in &snapshot {
            if observer.active.load(Ordering::Acquire) {
                (observer.callback)(event);
            }
        }
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.registry
            .observers
            .lock()
            .expect("observer registry lock poisoned")
            .len()
    }

    /// Returns `true` if no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Designate the calling thread as the only one allowed to `notify`.
    ///
    /// Succeeds again on the same thread; fails if another thread is bound.
    pub fn bind_to_current_thread(&self) -> ObserveResult<()> {
        let current = thread::current().id();
        let bound = *self.thread.get_or_init(|| current);
        if bound == current {
            Ok(())
        } else {
            Err(ObserveError::AlreadyBound { bound })
        }
    }

    /// The designated thread, once bound.
    pub fn bound_thread(&self) -> Option<ThreadId> {
        self.thread.get().copied()
    }

    fn check_thread(&self) {
        let current = thread::current().id();
        let expected = *self.thread.get_or_init(|| current);
        if expected != current {
            violation(ObserveError::WrongThread {
                expected,
                actual: current,
            });
        }
    }
}

impl<E: 'static> Default for ObserverList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> Observable for ObserverList<E> {
    type Event = E;

    fn observe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        ObserverList::observe(self, callback)
    }
}

impl<E: 'static> fmt::Debug for ObserverList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverList")
            .field("observers", &self.len())
            .field("thread", &self.thread.get())
            .finish()
    }
}

fn violation(err: ObserveError) {
    if cfg!(debug_assertions) {
        panic!("observer contract violated: {err}");
    }
    error!(error = %err, "observer contract violated");
}

/// Marks a notification pass in progress. Clears the mark on drop, including
/// during unwinding, but only if this pass set it.
struct NotifyPass<'a> {
    flag: &'a AtomicBool,
    owner: bool,
}

impl<'a> NotifyPass<'a> {
    fn enter(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag, owner: true })
    }

    fn nested(flag: &'a AtomicBool) -> Self {
        Self { flag, owner: false }
    }
}

impl Drop for NotifyPass<'_> {
    fn drop(&mut self) {
        if self.owner {
            self.flag.store(false, Ordering::Release);
        }
    }
}
