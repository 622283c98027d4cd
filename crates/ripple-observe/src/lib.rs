//! Observation primitives for Ripple.
//!
//! An [`ObserverList`] fans events out to registered callbacks on one
//! designated thread. Registering returns a [`Subscription`], an RAII handle
//! whose revocation runs exactly once, explicitly or on drop.
//!
//! # Key Types
//!
//! - [`Observable`] -- Anything that can be observed for events
//! - [`ObserverList`] -- Snapshot-safe registry of callbacks
//! - [`Subscription`] / [`SubscriptionSet`] -- One-shot revocation handles
//! - [`Token`] / [`TokenGenerator`] -- Process-unique observer handles (re-exported)

pub mod error;
pub mod observer;
pub mod subscription;

pub use error::{ObserveError, ObserveResult};
pub use observer::{Observable, ObserverList};
pub use ripple_types::{Token, TokenGenerator};
pub use subscription::{Subscription, SubscriptionSet};
