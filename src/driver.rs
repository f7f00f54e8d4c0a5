//! The driver-facing façade.
//!
//! A [`Corral`] owns the region registry, the evaluator with its injected
//! predicate, and the configuration. Everything runs synchronously on the
//! caller's thread; callbacks borrow nothing from the corral, so they cannot
//! mutate it mid-dispatch.

use tracing::debug;

use crate::boundary::{Boundary, EventKey, EventSpec, Namespace};
use crate::callbacks::{Binding, Callback, Detach, SubscriptionId};
use crate::config::CorralConfig;
use crate::error::CorralResult;
use crate::evaluator::Evaluator;
use crate::query::BoundaryPredicate;
use crate::region::{Bounds, Region, RegionDef, RegionId};
use crate::registry::{BoundarySnapshot, RegionRegistry};
use crate::stream::EventStream;
use crate::trigger::{self, TriggerOutcome};

use indexmap::IndexMap;

/// Named regions watched against one boundary predicate.
///
/// ```
/// use corral::{Boundary, BoundaryQuery, Corral, RegionDef};
///
/// // Pretend the viewport is 250 wide.
/// let mut corral = Corral::new(|q: &BoundaryQuery| match q.boundary {
///     Boundary::Lower => 250.0 >= q.value,
///     _ => 250.0 <= q.value,
/// });
/// corral.create(RegionDef::new("mobile", "width").upper(320.0), Vec::new()).unwrap();
/// assert!(corral.get("mobile").unwrap().is_active(Boundary::Conjunction));
/// ```
#[derive(Debug)]
pub struct Corral<P> {
    registry: RegionRegistry,
    evaluator: Evaluator<P>,
    config: CorralConfig,
}

impl<P: BoundaryPredicate> Corral<P> {
    /// Creates an empty corral with the default configuration.
    pub fn new(predicate: P) -> Self {
        Self::with_config(predicate, CorralConfig::default())
    }

    /// Creates an empty corral with an explicit configuration.
    pub fn with_config(predicate: P, config: CorralConfig) -> Self {
        Self {
            registry: RegionRegistry::new(),
            evaluator: Evaluator::new(predicate),
            config,
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &CorralConfig {
        &self.config
    }

    /// Read-only view of the registered regions and their callbacks.
    #[must_use]
    pub fn registry(&self) -> &RegionRegistry {
        &self.registry
    }

    /// Returns the injected predicate.
    #[must_use]
    pub fn predicate(&self) -> &P {
        self.evaluator.predicate()
    }

    /// Mutable access to the predicate, e.g. to record a new measurement.
    /// Call [`recheck_all`](Self::recheck_all) afterwards.
    pub fn predicate_mut(&mut self) -> &mut P {
        self.evaluator.predicate_mut()
    }

    /// Registers a region, replacing any region with the same id, then
    /// evaluates it once so its flags reflect the current measurement.
    ///
    /// Initial `bindings` are registered before that evaluation and observe it.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank id or axis, `Callback` if a binding fails
    /// during the initial evaluation (the region stays registered).
    pub fn create(&mut self, def: RegionDef, bindings: Vec<Binding>) -> CorralResult<&Region> {
        let slot = self.registry.create(def, bindings)?;
        if self.config.evaluate_on_create {
            self.evaluator.recheck(slot)?;
        }
        Ok(slot.region())
    }

    /// Removes a region and its callbacks without firing exit events.
    ///
    /// Returns false if nothing was registered under `id`.
    pub fn remove(&mut self, id: &str) -> bool {
        self.registry.remove(id)
    }

    /// Removes every region without firing exit events.
    pub fn clear(&mut self) {
        debug!(regions = self.registry.len(), "clearing corral");
        self.registry.clear();
    }

    /// Looks a region up by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Region> {
        self.registry.get(id)
    }

    /// Replaces a region's bounds and rechecks it. Returns the dispatch count.
    pub fn set_bounds(&mut self, id: &str, bounds: Bounds) -> CorralResult<usize> {
        let slot = self.registry.slot_mut(id)?;
        slot.region.set_bounds(bounds);
        debug!(region = id, lower = ?bounds.lower, upper = ?bounds.upper, "bounds changed");
        Ok(self.evaluator.recheck(slot)?)
    }

    /// Appends a callback for `key` on region `id`.
    ///
    /// If the region already satisfies `key` the callback runs once right away.
    /// When that replay fails the subscription is rolled back before the error
    /// is returned.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown region, `Callback` if the replay fails.
    pub fn subscribe(
        &mut self,
        id: &str,
        key: EventKey,
        callback: Callback,
        namespace: Option<Namespace>,
    ) -> CorralResult<SubscriptionId> {
        let slot = self.registry.slot_mut(id)?;
        let sub = slot.subscribe(key, callback.clone(), namespace);
        debug!(region = id, event = %key, subscription = %sub, "subscribed");
        if self.config.replay_late_subscribers {
            if let Err(err) = trigger::replay(slot, key, &callback) {
                slot.callbacks.detach(&Detach::Subscription(sub));
                debug!(
                    region = id,
                    event = %key,
                    subscription = %sub,
                    "replay failed, unsubscribed"
                );
                return Err(err.into());
            }
        }
        Ok(sub)
    }

    /// [`subscribe`](Self::subscribe) keyed by a dashed event name such as `"enter-min.menu"`.
    pub fn on(&mut self, id: &str, event: &str, callback: Callback) -> CorralResult<SubscriptionId> {
        let spec: EventSpec = event.parse()?;
        self.subscribe(id, spec.key, callback, spec.namespace)
    }

    /// Removes the selected callbacks from region `id`. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown region, or a namespace or subscription
    /// selector that matched nothing.
    pub fn unsubscribe(&mut self, id: &str, selector: &Detach) -> CorralResult<usize> {
        Ok(self.registry.detach(id, selector)?)
    }

    /// Dashed-name removal: `"exit-both"` drops every exit-conjunction callback,
    /// `"enter-min.menu"` drops every lower-bound callback tagged `menu`.
    pub fn off(&mut self, id: &str, event: &str) -> CorralResult<usize> {
        let spec: EventSpec = event.parse()?;
        let selector = match spec.namespace {
            Some(namespace) => Detach::Namespace(spec.key.boundary, namespace),
            None => Detach::All(spec.key),
        };
        self.unsubscribe(id, &selector)
    }

    /// Subscribes a bounded channel to `key` on region `id`.
    pub fn stream(&mut self, id: &str, key: EventKey) -> CorralResult<EventStream> {
        let (forward, pending) = EventStream::channel(self.config.stream_capacity);
        let sub = self.subscribe(id, key, forward, None)?;
        Ok(pending.attach(sub))
    }

    /// Fires `key` on region `id`; see the trigger module for the rules.
    pub fn trigger(&mut self, id: &str, key: EventKey, force: bool) -> CorralResult<TriggerOutcome> {
        let slot = self.registry.slot_mut(id)?;
        Ok(trigger::trigger(slot, key, force)?)
    }

    /// Rechecks one region against the predicate. Returns the dispatch count.
    pub fn recheck_one(&mut self, id: &str) -> CorralResult<usize> {
        self.evaluator.recheck_one(&mut self.registry, id)
    }

    /// Rechecks every region against the predicate. Returns the dispatch count.
    ///
    /// # Errors
    ///
    /// `Callback` from the first failing callback; later regions are skipped
    /// until the next call.
    pub fn recheck_all(&mut self) -> CorralResult<usize> {
        self.evaluator.recheck_all(&mut self.registry)
    }

    /// Axis and bounds of every region, in creation order.
    #[must_use]
    pub fn list_boundaries(&self) -> IndexMap<RegionId, BoundarySnapshot> {
        self.registry.list_boundaries()
    }

    /// Ids of regions whose `boundary` is currently active.
    #[must_use]
    pub fn active_regions(&self, boundary: Boundary) -> Vec<RegionId> {
        self.registry.active(boundary)
    }

    /// Number of registered regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether no region is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;
    use crate::error::{CallbackError, StreamError};
    use crate::query::{BoundaryQuery, Threshold};

    fn width(value: f64) -> Corral<Threshold> {
        let mut threshold = Threshold::default();
        threshold.set("width", value);
        Corral::new(threshold)
    }

    fn counter() -> (Callback, Arc<Mutex<usize>>) {
        let hits = Arc::new(Mutex::new(0));
        let inner = Arc::clone(&hits);
        (
            Callback::infallible(move |_| *inner.lock().unwrap() += 1),
            hits,
        )
    }

    #[test]
    fn create_evaluates_immediately() {
        let mut corral = width(500.0);
        let region = corral
            .create(RegionDef::new("tablet", "width").lower(321.0).upper(768.0), Vec::new())
            .unwrap();
        assert!(region.state().conjunction);
    }

    #[test]
    fn create_can_skip_evaluation() {
        let mut threshold = Threshold::default();
        threshold.set("width", 500.0);
        let config = CorralConfig {
            evaluate_on_create: false,
            ..CorralConfig::default()
        };
        let mut corral = Corral::with_config(threshold, config);
        let region = corral
            .create(RegionDef::new("tablet", "width").lower(321.0), Vec::new())
            .unwrap();
        assert!(!region.state().lower);
        assert_eq!(corral.recheck_all().unwrap(), 3);
    }

    #[test]
    fn set_bounds_rechecks_region() {
        let mut corral = width(500.0);
        corral
            .create(RegionDef::new("mobile", "width").upper(320.0), Vec::new())
            .unwrap();
        assert!(!corral.get("mobile").unwrap().is_active(Boundary::Upper));

        let dispatches = corral
            .set_bounds("mobile", Bounds::new(None, Some(600.0)))
            .unwrap();
        assert_eq!(dispatches, 2);
        let region = corral.get("mobile").unwrap();
        assert_eq!(region.upper(), Some(600.0));
        assert!(region.state().conjunction);
    }

    #[test]
    fn subscribe_replay_can_be_disabled() {
        let mut threshold = Threshold::default();
        threshold.set("width", 100.0);
        let config = CorralConfig {
            replay_late_subscribers: false,
            ..CorralConfig::default()
        };
        let mut corral = Corral::with_config(threshold, config);
        corral
            .create(RegionDef::new("mobile", "width").upper(320.0), Vec::new())
            .unwrap();

        let (cb, hits) = counter();
        corral
            .subscribe("mobile", EventKey::enter(Boundary::Upper), cb, None)
            .unwrap();
        assert_eq!(*hits.lock().unwrap(), 0);
    }

    #[test]
    fn on_and_off_use_dashed_names() {
        let mut corral = width(100.0);
        corral
            .create(RegionDef::new("mobile", "width").upper(320.0), Vec::new())
            .unwrap();

        let (cb, hits) = counter();
        corral.on("mobile", "enter-max.nav", cb.clone()).unwrap();
        corral.on("mobile", "exit-max.nav", cb).unwrap();
        assert_eq!(*hits.lock().unwrap(), 1);

        assert_eq!(corral.off("mobile", "enter-upper.nav").unwrap(), 2);
        let err = corral.off("mobile", "enter-upper.nav").unwrap_err();
        assert!(err.is_not_found());

        let err = corral.on("mobile", "sideways-max", counter().0).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn operations_on_unknown_region_are_not_found() {
        let mut corral = Corral::new(|_: &BoundaryQuery| true);
        let key = EventKey::enter(Boundary::Lower);
        assert!(corral.subscribe("ghost", key, counter().0, None).unwrap_err().is_not_found());
        assert!(corral.unsubscribe("ghost", &Detach::All(key)).unwrap_err().is_not_found());
        assert!(corral.trigger("ghost", key, false).unwrap_err().is_not_found());
        assert!(corral.set_bounds("ghost", Bounds::default()).unwrap_err().is_not_found());
        assert!(corral.stream("ghost", key).unwrap_err().is_not_found());
    }

    #[test]
    fn stream_collects_events_and_counts_overflow() {
        let mut threshold = Threshold::default();
        threshold.set("width", 100.0);
        let config = CorralConfig {
            stream_capacity: 1,
            ..CorralConfig::default()
        };
        let mut corral = Corral::with_config(threshold, config);
        corral
            .create(RegionDef::new("mobile", "width").upper(320.0), Vec::new())
            .unwrap();

        let key = EventKey::enter(Boundary::Upper);
        let stream = corral.stream("mobile", key).unwrap();
        corral.trigger("mobile", key, true).unwrap();

        let events = stream.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].cause, crate::callbacks::EventCause::Replay);
        assert_eq!(stream.dropped(), 1);

        assert_eq!(
            corral
                .unsubscribe("mobile", &Detach::Subscription(stream.subscription_id()))
                .unwrap(),
            1
        );
    }

    #[test]
    fn clear_removes_everything() {
        let mut corral = width(100.0);
        corral.create(RegionDef::new("a", "width"), Vec::new()).unwrap();
        corral.create(RegionDef::new("b", "width"), Vec::new()).unwrap();
        assert_eq!(corral.len(), 2);
        corral.clear();
        assert!(corral.is_empty());
        assert_eq!(corral.recheck_all().unwrap(), 0);
    }

    #[test]
    fn failed_replay_rolls_back_subscription() {
        let mut corral = width(100.0);
        corral
            .create(RegionDef::new("mobile", "width").upper(320.0), Vec::new())
            .unwrap();

        let failing = Callback::new(|_| Err(CallbackError::new("replay refused")));
        let err = corral
            .subscribe("mobile", EventKey::enter(Boundary::Upper), failing, None)
            .unwrap_err();
        assert!(err.is_callback());
        assert!(corral.registry().slot("mobile").unwrap().callbacks().is_empty());

        // Nothing left to fire on a forced re-entry.
        let outcome = corral
            .trigger("mobile", EventKey::enter(Boundary::Upper), true)
            .unwrap();
        assert!(outcome.fired);
    }

    #[test]
    fn stream_recv_timeout_reports_duration() {
        let mut corral = width(500.0);
        corral
            .create(RegionDef::new("mobile", "width").upper(320.0), Vec::new())
            .unwrap();

        let stream = corral.stream("mobile", EventKey::enter(Boundary::Upper)).unwrap();
        assert!(stream.try_recv().is_none());
        assert_eq!(
            stream.recv_timeout(Duration::from_millis(10)).unwrap_err(),
            StreamError::Timeout { duration_ms: 10 }
        );

        corral.predicate_mut().set("width", 300.0);
        corral.recheck_all().unwrap();
        let event = stream.try_recv().unwrap();
        assert_eq!(event.key, EventKey::enter(Boundary::Upper));
        assert!(stream.try_recv().is_none());
    }

    #[test]
    fn stream_disconnects_when_unsubscribed() {
        let mut corral = width(500.0);
        corral
            .create(RegionDef::new("mobile", "width").upper(320.0), Vec::new())
            .unwrap();
        let stream = corral.stream("mobile", EventKey::enter(Boundary::Upper)).unwrap();

        corral
            .unsubscribe("mobile", &Detach::Subscription(stream.subscription_id()))
            .unwrap();
        assert_eq!(
            stream.recv_timeout(Duration::from_millis(10)).unwrap_err(),
            StreamError::Disconnected
        );
    }

    #[test]
    fn stream_disconnects_when_region_removed() {
        let mut corral = width(100.0);
        corral
            .create(RegionDef::new("mobile", "width").upper(320.0), Vec::new())
            .unwrap();
        let stream = corral.stream("mobile", EventKey::enter(Boundary::Upper)).unwrap();

        assert!(corral.remove("mobile"));
        // The replayed event is still buffered; the channel closes after it.
        assert_eq!(stream.drain().len(), 1);
        assert_eq!(
            stream.recv_timeout(Duration::from_millis(10)).unwrap_err(),
            StreamError::Disconnected
        );
    }

    #[test]
    fn namespaced_bindings_detach_together() {
        let mut corral = width(100.0);
        let nav = Namespace::new("nav").unwrap();
        let (cb, hits) = counter();
        corral
            .create(
                RegionDef::new("mobile", "width").upper(320.0),
                vec![
                    Binding::new(EventKey::enter(Boundary::Upper), cb.clone())
                        .in_namespace(nav.clone()),
                    Binding::new(EventKey::exit(Boundary::Upper), cb.clone())
                        .in_namespace(nav.clone()),
                    Binding::new(EventKey::enter(Boundary::Upper), cb),
                ],
            )
            .unwrap();
        assert_eq!(*hits.lock().unwrap(), 2);

        let entries = corral
            .registry()
            .slot("mobile")
            .unwrap()
            .callbacks()
            .entries(EventKey::enter(Boundary::Upper));
        assert_eq!(entries[0].namespace.as_ref(), Some(&nav));
        assert_eq!(entries[1].namespace, None);

        let removed = corral
            .unsubscribe("mobile", &Detach::Namespace(Boundary::Upper, nav))
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(corral.registry().slot("mobile").unwrap().callbacks().len(), 1);
    }
}
