//! RAII revocation handles.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

type Revocation = Box<dyn FnOnce() + Send>;

/// Handle for one observation.
///
/// Holds a single revocation action that runs at most once: on the first
/// call to [`unsubscribe`](Subscription::unsubscribe), or on drop if that
/// never happened. After that the handle is inert.
pub struct Subscription {
    fired: AtomicBool,
    action: Mutex<Option<Revocation>>,
}

impl Subscription {
    /// Wrap a revocation action.
    pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            fired: AtomicBool::new(false),
            action: Mutex::new(Some(Box::new(action))),
        }
    }

    /// A handle with nothing to revoke. Already inactive.
    pub fn empty() -> Self {
        Self {
            fired: AtomicBool::new(true),
            action: Mutex::new(None),
        }
    }

    /// Run the revocation action if it has not run yet.
    ///
    /// Safe to call from any thread and any number of times, including from
    /// inside the observer callback being revoked.
    pub fn unsubscribe(&self) {
        if self
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        // Released before running so the action may touch this handle.
        if let Some(action) = self.take_action() {
            action();
        }
    }

    /// Returns `true` until the revocation has run or been disarmed.
    pub fn is_active(&self) -> bool {
        !self.fired.load(Ordering::Acquire)
    }

    /// Disarm without revoking. The observation then lasts as long as the
    /// observed object does.
    pub fn detach(self) {
        self.fired.store(true, Ordering::Release);
        drop(self.take_action());
    }

    fn take_action(&self) -> Option<Revocation> {
        self.action
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Owns a group of subscriptions and revokes them together.
///
/// Dropping the set unsubscribes every member.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a subscription. Inactive handles are discarded.
    pub fn insert(&mut self, subscription: Subscription) {
        if subscription.is_active() {
            self.subscriptions.push(subscription);
        }
    }

    /// Number of subscriptions held.
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Returns `true` if the set holds nothing.
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Unsubscribe and release every member.
    pub fn clear(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
    }
}

impl Extend<Subscription> for SubscriptionSet {
    fn extend<I: IntoIterator<Item = Subscription>>(&mut self, iter: I) {
        for subscription in iter {
            self.insert(subscription);
        }
    }
}

impl FromIterator<Subscription> for SubscriptionSet {
    fn from_iter<I: IntoIterator<Item = Subscription>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}
