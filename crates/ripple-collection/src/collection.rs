//! The observable collection façade and its load tickets.

use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use ripple_diff::{ChangeSet, DiffEngine, Diffable};
use ripple_observe::{Observable, ObserverList, Subscription};
use ripple_types::{Token, TokenGenerator};
use tracing::{debug, info, info_span, Span};

use crate::config::CollectionConfig;
use crate::error::{CollectionError, CollectionResult};
use crate::state::{CollectionState, LoadError, Phase};

/// Emitted after every accepted transition.
#[derive(Clone, Debug)]
pub struct StateChanged<C: Diffable> {
    /// Phase before the transition.
    pub previous: Phase,
    /// The state now stored.
    pub state: Arc<CollectionState<C>>,
    /// Changes from the previously displayed content to the new one.
    pub script: C::Script,
}

/// Handle for one fetch started with [`Collection::begin_load`].
///
/// Only the most recently issued ticket can complete a load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    token: Token,
}

impl LoadTicket {
    pub fn token(&self) -> Token {
        self.token
    }
}

/// Observable holder of a collection's load state.
///
/// Every accepted transition diffs the content displayed before against the
/// content displayed after and notifies observers with the script. State is
/// read from any thread; transitions and notifications belong on the
/// thread that first notifies.
pub struct Collection<C: Diffable> {
    state: RwLock<Arc<CollectionState<C>>>,
    pending: Mutex<Option<Token>>,
    observers: ObserverList<StateChanged<C>>,
    engine: DiffEngine,
    tokens: Arc<TokenGenerator>,
    config: CollectionConfig,
    span: Span,
}

impl<C: Diffable + 'static> Collection<C> {
    /// Create a collection in `NotLoaded`, logging under a span named after
    /// the configured label.
    pub fn new(config: CollectionConfig) -> Self {
        let span = info_span!("collection", label = %config.label);
        Self::with_span(config, span)
    }

    /// Create a collection that logs under `span`.
    pub fn with_span(config: CollectionConfig, span: Span) -> Self {
        Self::with_tokens(config, span, TokenGenerator::global())
    }

    /// Create a collection drawing observer and load tokens from `tokens`.
    pub fn with_tokens(config: CollectionConfig, span: Span, tokens: Arc<TokenGenerator>) -> Self {
        Self {
            state: RwLock::new(Arc::new(CollectionState::NotLoaded)),
            pending: Mutex::new(None),
            observers: ObserverList::with_generator(Arc::clone(&tokens)),
            engine: DiffEngine::new(config.diff.clone()),
            tokens,
            config,
            span,
        }
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    /// The current state.
    pub fn state(&self) -> Arc<CollectionState<C>> {
        Arc::clone(&*self.state.read().expect("collection state lock poisoned"))
    }

    pub fn phase(&self) -> Phase {
        self.state
            .read()
            .expect("collection state lock poisoned")
            .phase()
    }

    /// A copy of the displayed content; empty unless loaded or loading with
    /// previous content.
    pub fn snapshot(&self) -> C {
        self.state().content().cloned().unwrap_or_default()
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Register `callback` for state changes.
    pub fn observe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&StateChanged<C>) + Send + Sync + 'static,
    {
        self.observers.observe(callback)
    }

    /// Replace the state, diff the displayed content, and notify observers.
    ///
    /// On error the stored state is unchanged and nothing is emitted.
    pub fn set_state(&self, next: CollectionState<C>) -> CollectionResult<StateChanged<C>> {
        // Diff outside the write lock: a duplicate-id panic must not poison
        // the stored state.
        let event = loop {
            let current = self.state();
            let from = current.phase();
            let to = next.phase();
            if !from.allows(to, self.config.strict_transitions) {
                debug!(parent: &self.span, %from, %to, "transition rejected");
                return Err(CollectionError::InvalidTransition { from, to });
            }

            let empty = C::default();
            let script = C::diff_with(
                &self.engine,
                current.content().unwrap_or(&empty),
                next.content().unwrap_or(&empty),
            )?;

            let mut stored = self.state.write().expect("collection state lock poisoned");
            if !Arc::ptr_eq(&*stored, &current) {
                // Replaced while diffing; diff against the newer state.
                continue;
            }
            let state = Arc::new(next);
            *stored = Arc::clone(&state);
            break StateChanged {
                previous: from,
                state,
                script,
            };
        };

        info!(
            parent: &self.span,
            from = %event.previous,
            to = %event.state.phase(),
            items = event.state.content().map_or(0, Diffable::item_count),
            changes = event.script.change_count(),
            "collection state changed"
        );
        self.observers.notify(&event);
        Ok(event)
    }

    /// Enter `Loading` and issue a ticket for the fetch. Any earlier ticket
    /// becomes stale.
    ///
    /// With `carry_previous` the displayed content stays visible while
    /// loading; otherwise the collection shows nothing until the fetch
    /// completes.
    pub fn begin_load(&self, carry_previous: bool) -> CollectionResult<LoadTicket> {
        let carried = if carry_previous {
            self.state().content().cloned()
        } else {
            None
        };
        self.set_state(CollectionState::Loading(carried))?;

        let ticket = LoadTicket {
            token: self.tokens.next_token(),
        };
        *self.pending.lock().expect("collection ticket lock poisoned") = Some(ticket.token);
        debug!(parent: &self.span, token = %ticket.token, carry_previous, "load started");
        Ok(ticket)
    }

    /// Returns `true` if `ticket` is the one the collection is waiting on.
    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        *self.pending.lock().expect("collection ticket lock poisoned") == Some(ticket.token)
    }

    /// Settle the load `ticket` was issued for, into `Loaded` or `Error`.
    ///
    /// A superseded ticket is ignored and yields `Ok(None)`.
    pub fn complete_load(
        &self,
        ticket: LoadTicket,
        result: Result<C, LoadError>,
    ) -> CollectionResult<Option<StateChanged<C>>> {
        {
            let mut pending = self.pending.lock().expect("collection ticket lock poisoned");
            if *pending != Some(ticket.token) {
                debug!(parent: &self.span, token = %ticket.token, "stale load result discarded");
                return Ok(None);
            }
            *pending = None;
        }

        let next = match result {
            Ok(content) => CollectionState::Loaded(content),
            Err(err) => CollectionState::Error(err),
        };
        self.set_state(next).map(Some).inspect_err(|_| {
            // The load did not settle; the ticket stays valid for a retry
            // unless a newer load has started meanwhile.
            let mut pending = self.pending.lock().expect("collection ticket lock poisoned");
            if pending.is_none() {
                *pending = Some(ticket.token);
            }
        })
    }

    /// Shorthand for a successful [`complete_load`](Collection::complete_load).
    pub fn finish_load(
        &self,
        ticket: LoadTicket,
        content: C,
    ) -> CollectionResult<Option<StateChanged<C>>> {
        self.complete_load(ticket, Ok(content))
    }

    /// Shorthand for a failed [`complete_load`](Collection::complete_load).
    pub fn fail_load(
        &self,
        ticket: LoadTicket,
        error: LoadError,
    ) -> CollectionResult<Option<StateChanged<C>>> {
        self.complete_load(ticket, Err(error))
    }
}

impl<C: Diffable + 'static> Observable for Collection<C> {
    type Event = StateChanged<C>;

    fn observe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&StateChanged<C>) + Send + Sync + 'static,
    {
        Collection::observe(self, callback)
    }
}

impl<C: Diffable + 'static> fmt::Debug for Collection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("label", &self.config.label)
            .field("phase", &self.phase())
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_diff::{apply, apply_sections, DiffConfig, DuplicatePolicy, EditOp, EditScript};
    use ripple_types::{Entity, Section, Sections};

    #[derive(Clone, Debug, PartialEq)]
    struct Row {
        id: &'static str,
        version: u32,
    }

    impl Entity for Row {
        type Id = &'static str;
        type Version = u32;

        fn id(&self) -> &&'static str {
            &self.id
        }

        fn version(&self) -> u32 {
            self.version
        }
    }

    fn rows(entries: &[(&'static str, u32)]) -> Vec<Row> {
        entries
            .iter()
            .map(|&(id, version)| Row { id, version })
            .collect()
    }

    fn collection() -> Collection<Vec<Row>> {
        Collection::new(CollectionConfig::labeled("test"))
    }

    type Events = Arc<Mutex<Vec<(Phase, Phase, EditScript)>>>;

    fn record(collection: &Collection<Vec<Row>>) -> (Events, Subscription) {
        let events: Events = Arc::default();
        let sink = Arc::clone(&events);
        let sub = collection.observe(move |event: &StateChanged<Vec<Row>>| {
            sink.lock().unwrap().push((
                event.previous,
                event.state.phase(),
                event.script.clone(),
            ));
        });
        (events, sub)
    }

    #[test]
    fn starts_not_loaded_and_empty() {
        let c = collection();
        assert_eq!(c.phase(), Phase::NotLoaded);
        assert!(c.snapshot().is_empty());
    }

    #[test]
    fn load_cycle_emits_scripts() {
        let c = collection();
        let (events, _sub) = record(&c);

        let ticket = c.begin_load(true).unwrap();
        c.finish_load(ticket, rows(&[("a", 1), ("b", 1)])).unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].0, Phase::NotLoaded);
        assert_eq!(events[0].1, Phase::Loading);
        assert!(events[0].2.is_empty());
        assert_eq!(events[1].1, Phase::Loaded);
        assert_eq!(events[1].2.ops(), &[EditOp::Insert(0), EditOp::Insert(1)]);
    }

    #[test]
    fn reload_carrying_content_diffs_against_it() {
        let c = collection();
        let t = c.begin_load(false).unwrap();
        c.finish_load(t, rows(&[("a", 1), ("b", 1), ("c", 1)])).unwrap();

        let t = c.begin_load(true).unwrap();
        assert_eq!(c.snapshot().len(), 3);
        let event = c
            .finish_load(t, rows(&[("a", 1), ("c", 1), ("b", 2)]))
            .unwrap()
            .unwrap();
        assert_eq!(
            event.script.ops(),
            &[EditOp::Move { from: 1, to: 2 }, EditOp::Update(2)]
        );
    }

    #[test]
    fn reload_without_carry_clears_display() {
        let c = collection();
        let t = c.begin_load(false).unwrap();
        c.finish_load(t, rows(&[("a", 1), ("b", 1)])).unwrap();

        let (events, _sub) = record(&c);
        c.begin_load(false).unwrap();
        assert_eq!(
            events.lock().unwrap()[0].2.ops(),
            &[EditOp::Delete(1), EditOp::Delete(0)]
        );
        assert!(c.snapshot().is_empty());
    }

    #[test]
    fn failure_shows_nothing() {
        let c = collection();
        let t = c.begin_load(false).unwrap();
        c.finish_load(t, rows(&[("a", 1)])).unwrap();
        let t = c.begin_load(true).unwrap();

        let event = c.fail_load(t, LoadError::new("offline")).unwrap().unwrap();
        assert_eq!(event.script.ops(), &[EditOp::Delete(0)]);
        assert_eq!(c.state().error().map(LoadError::message), Some("offline"));
    }

    #[test]
    fn stale_ticket_is_ignored() {
        let c = collection();
        let first = c.begin_load(false).unwrap();
        let second = c.begin_load(false).unwrap();
        assert!(!c.is_current(&first));
        assert!(c.is_current(&second));

        assert!(c
            .finish_load(first, rows(&[("old", 1)]))
            .unwrap()
            .is_none());
        assert_eq!(c.phase(), Phase::Loading);

        assert!(c
            .finish_load(second, rows(&[("new", 1)]))
            .unwrap()
            .is_some());
        assert_eq!(c.snapshot(), rows(&[("new", 1)]));

        // A settled ticket cannot complete twice.
        assert!(c.finish_load(second, vec![]).unwrap().is_none());
    }

    #[test]
    fn reentering_not_loaded_is_rejected() {
        let c = collection();
        let (events, _sub) = record(&c);
        c.set_state(CollectionState::Loaded(rows(&[("a", 1)]))).unwrap();

        let err = c.set_state(CollectionState::NotLoaded).unwrap_err();
        assert!(matches!(
            err,
            CollectionError::InvalidTransition {
                from: Phase::Loaded,
                to: Phase::NotLoaded
            }
        ));
        assert_eq!(c.phase(), Phase::Loaded);
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    fn strict_transitions_reject_push_updates() {
        let lenient = collection();
        lenient.set_state(CollectionState::Loaded(vec![])).unwrap();
        lenient.set_state(CollectionState::Loaded(rows(&[("a", 1)]))).unwrap();

        let strict: Collection<Vec<Row>> = Collection::new(CollectionConfig::labeled("s").strict());
        assert!(strict.set_state(CollectionState::Loaded(vec![])).is_err());
        let t = strict.begin_load(false).unwrap();
        strict.finish_load(t, vec![]).unwrap();
        assert!(matches!(
            strict.set_state(CollectionState::Loaded(vec![])),
            Err(CollectionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn rejected_diff_leaves_state_unchanged() {
        let config = CollectionConfig {
            diff: DiffConfig::with_policy(DuplicatePolicy::Reject),
            ..CollectionConfig::labeled("dupes")
        };
        let c: Collection<Vec<Row>> = Collection::new(config);
        let err = c
            .set_state(CollectionState::Loaded(rows(&[("x", 1), ("x", 2)])))
            .unwrap_err();
        assert!(matches!(err, CollectionError::Diff(_)));
        assert_eq!(c.phase(), Phase::NotLoaded);
    }

    #[test]
    fn failed_completion_keeps_ticket_for_retry() {
        let config = CollectionConfig {
            diff: DiffConfig::with_policy(DuplicatePolicy::Reject),
            ..CollectionConfig::labeled("retry")
        };
        let c: Collection<Vec<Row>> = Collection::new(config);
        let t = c.begin_load(false).unwrap();

        let err = c.finish_load(t, rows(&[("x", 1), ("x", 1)])).unwrap_err();
        assert!(matches!(err, CollectionError::Diff(_)));
        assert_eq!(c.phase(), Phase::Loading);
        assert!(c.is_current(&t));

        let event = c.finish_load(t, rows(&[("x", 1)])).unwrap();
        assert!(event.is_some());
        assert_eq!(c.phase(), Phase::Loaded);
        assert!(!c.is_current(&t));
    }

    #[test]
    fn rejected_transition_keeps_ticket_in_strict_mode() {
        let c: Collection<Vec<Row>> = Collection::new(CollectionConfig::labeled("s").strict());
        let t = c.begin_load(false).unwrap();
        c.set_state(CollectionState::Error(LoadError::new("pushed"))).unwrap();

        assert!(matches!(
            c.fail_load(t, LoadError::new("again")),
            Err(CollectionError::InvalidTransition {
                from: Phase::Error,
                to: Phase::Error
            })
        ));
        assert!(c.is_current(&t));
    }

    #[test]
    fn panicking_diff_leaves_state_readable() {
        let config = CollectionConfig {
            diff: DiffConfig::with_policy(DuplicatePolicy::Panic),
            ..CollectionConfig::labeled("panics")
        };
        let c: Collection<Vec<Row>> = Collection::new(config);
        c.set_state(CollectionState::Loaded(rows(&[("a", 1)]))).unwrap();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            c.set_state(CollectionState::Loaded(rows(&[("x", 1), ("x", 2)])))
        }));
        assert!(outcome.is_err());
        assert_eq!(c.phase(), Phase::Loaded);
        assert_eq!(c.snapshot(), rows(&[("a", 1)]));
        assert!(format!("{c:?}").contains("Loaded"));
    }

    #[test]
    fn observer_can_mirror_content_with_apply() {
        let c = collection();
        let view: Arc<Mutex<Vec<Row>>> = Arc::default();
        let mirror = Arc::clone(&view);
        let _sub = c.observe(move |event: &StateChanged<Vec<Row>>| {
            let mut view = mirror.lock().unwrap();
            let target = event.state.content().cloned().unwrap_or_default();
            *view = apply(&event.script, view.as_slice(), &target).unwrap();
        });

        let steps = [
            rows(&[("a", 1), ("b", 1), ("c", 1)]),
            rows(&[("c", 1), ("a", 2), ("d", 1)]),
            rows(&[("d", 1), ("e", 1)]),
        ];
        for step in steps {
            let t = c.begin_load(true).unwrap();
            c.finish_load(t, step.clone()).unwrap();
            assert_eq!(*view.lock().unwrap(), step);
        }
    }

    #[test]
    fn dropped_subscription_stops_events() {
        let c = collection();
        let (events, sub) = record(&c);
        assert_eq!(c.observer_count(), 1);
        drop(sub);
        c.begin_load(false).unwrap();
        assert!(events.lock().unwrap().is_empty());
        assert_eq!(c.observer_count(), 0);
    }

    #[test]
    fn sectioned_content() {
        let c: Collection<Sections<&'static str, Row>> =
            Collection::new(CollectionConfig::labeled("sections"));
        let first: Sections<_, _> = vec![
            Section::new("today", rows(&[("a", 1)])),
            Section::new("earlier", rows(&[("b", 1)])),
        ]
        .into();
        let second: Sections<_, _> = vec![
            Section::new("earlier", rows(&[("b", 1), ("a", 1)])),
            Section::new("today", vec![]),
        ]
        .into();

        c.set_state(CollectionState::Loaded(first.clone())).unwrap();
        let event = c.set_state(CollectionState::Loaded(second.clone())).unwrap();
        assert_eq!(event.script.sections.moves(), 1);
        assert_eq!(apply_sections(&event.script, &first, &second).unwrap(), second);
    }

    #[test]
    fn tokens_come_from_the_given_generator() {
        let tokens = Arc::new(TokenGenerator::new());
        let c: Collection<Vec<Row>> =
            Collection::with_tokens(CollectionConfig::default(), Span::none(), Arc::clone(&tokens));
        let _sub = c.observe(|_| {});
        let ticket = c.begin_load(false).unwrap();
        assert_eq!(tokens.issued(), 2);
        assert_eq!(ticket.token().get(), 2);
    }
}
