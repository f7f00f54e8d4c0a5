//! Boundary-crossing state machine.
//!
//! A trigger is idempotent: a direction cannot fire twice for the same boundary
//! without an opposite-direction trigger in between, unless forced. Callbacks
//! run before the activity flag is updated, so a failing callback leaves the
//! boundary in its previous state.
//!
//! Crossing an elementary bound while its complement is already active derives
//! the conjunction event in the same direction. Derivation is exactly one step
//! deep: the derived conjunction transition never derives anything itself.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::boundary::{Boundary, Direction, EventKey};
use crate::callbacks::{Callback, EventCause, RegionEvent};
use crate::error::CallbackError;
use crate::registry::RegionSlot;

/// What a trigger call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerOutcome {
    /// The requested event dispatched.
    pub fired: bool,
    /// A conjunction event was derived from it.
    pub derived: bool,
}

impl TriggerOutcome {
    const SKIPPED: Self = Self {
        fired: false,
        derived: false,
    };

    /// Number of event dispatches the call produced.
    #[must_use]
    pub const fn dispatches(&self) -> usize {
        self.fired as usize + self.derived as usize
    }
}

/// Fires `key` on the slot's region.
///
/// A direct conjunction trigger also forces both constituents to its direction,
/// without dispatching their callbacks.
pub(crate) fn trigger(
    slot: &mut RegionSlot,
    key: EventKey,
    force: bool,
) -> Result<TriggerOutcome, CallbackError> {
    if !transition(slot, key, force)? {
        return Ok(TriggerOutcome::SKIPPED);
    }

    let derived = match key.boundary.complement() {
        Some(complement) => derive_conjunction(slot, complement, key)?,
        None => {
            let active = key.direction.target_state();
            slot.region.set_active(Boundary::Lower, active);
            slot.region.set_active(Boundary::Upper, active);
            false
        }
    };

    Ok(TriggerOutcome {
        fired: true,
        derived,
    })
}

fn derive_conjunction(
    slot: &mut RegionSlot,
    complement: Boundary,
    key: EventKey,
) -> Result<bool, CallbackError> {
    if !slot.region.is_active(complement) {
        return Ok(false);
    }
    transition(
        slot,
        EventKey::new(Boundary::Conjunction, key.direction),
        false,
    )
}

/// Brings the conjunction flag back in line with its constituents.
///
/// Needed after a conjunction callback failed mid-derivation, which leaves
/// the constituents updated but the conjunction flag untouched.
pub(crate) fn reconcile_conjunction(slot: &mut RegionSlot) -> Result<bool, CallbackError> {
    let state = slot.region.state();
    if state.is_consistent() {
        return Ok(false);
    }
    let key = EventKey::new(
        Boundary::Conjunction,
        Direction::toward(state.lower && state.upper),
    );
    debug!(region = %slot.region.id(), event = %key, "reconciling conjunction");
    transition(slot, key, false)
}

/// Dispatches `key` and records the new flag, unless it already holds and `force` is off.
fn transition(slot: &mut RegionSlot, key: EventKey, force: bool) -> Result<bool, CallbackError> {
    let target = key.direction.target_state();
    if !force && slot.region.is_active(key.boundary) == target {
        trace!(region = %slot.region.id(), event = %key, "already in state, skipping");
        return Ok(false);
    }

    let cause = if force {
        EventCause::Forced
    } else {
        EventCause::Transition
    };
    dispatch(slot, key, cause)?;
    slot.region.set_active(key.boundary, target);
    Ok(true)
}

fn dispatch(slot: &RegionSlot, key: EventKey, cause: EventCause) -> Result<(), CallbackError> {
    let entries = slot.callbacks.entries(key);
    debug!(
        region = %slot.region.id(),
        event = %key,
        forced = matches!(cause, EventCause::Forced),
        callbacks = entries.len(),
        "dispatching"
    );
    if entries.is_empty() {
        return Ok(());
    }

    let event = RegionEvent::new(&slot.region, key, cause);
    for entry in entries {
        invoke(&entry.callback, &event)?;
    }
    Ok(())
}

/// Invokes a late subscriber once if the region already satisfies `key`.
///
/// Returns whether it was invoked.
pub(crate) fn replay(
    slot: &RegionSlot,
    key: EventKey,
    callback: &Callback,
) -> Result<bool, CallbackError> {
    if slot.region.is_active(key.boundary) != key.direction.target_state() {
        return Ok(false);
    }
    trace!(region = %slot.region.id(), event = %key, "replaying to late subscriber");
    let event = RegionEvent::new(&slot.region, key, EventCause::Replay);
    invoke(callback, &event)?;
    Ok(true)
}

fn invoke(callback: &Callback, event: &RegionEvent) -> Result<(), CallbackError> {
    callback.call(event).map_err(|err| {
        warn!(region = %event.region, event = %event.key, error = %err, "callback failed");
        err
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::callbacks::Binding;
    use crate::region::RegionDef;
    use crate::registry::RegionRegistry;

    type Log = Arc<Mutex<Vec<EventKey>>>;

    fn recording_slot<'a>(registry: &'a mut RegionRegistry, log: &Log) -> &'a mut RegionSlot {
        let mut bindings = Vec::new();
        for boundary in Boundary::ALL {
            for direction in [Direction::Enter, Direction::Exit] {
                let key = EventKey::new(boundary, direction);
                let log = Arc::clone(log);
                bindings.push(Binding::new(
                    key,
                    Callback::infallible(move |ev| log.lock().unwrap().push(ev.key)),
                ));
            }
        }
        registry
            .create(RegionDef::new("r", "width").lower(10.0).upper(20.0), bindings)
            .unwrap()
    }

    fn take(log: &Log) -> Vec<EventKey> {
        std::mem::take(&mut *log.lock().unwrap())
    }

    #[test]
    fn enter_is_idempotent_without_force() {
        let mut registry = RegionRegistry::new();
        let log = Log::default();
        let slot = recording_slot(&mut registry, &log);
        let key = EventKey::enter(Boundary::Lower);

        assert!(trigger(slot, key, false).unwrap().fired);
        assert!(!trigger(slot, key, false).unwrap().fired);
        assert_eq!(take(&log), vec![key]);
    }

    #[test]
    fn force_refires_active_boundary() {
        let mut registry = RegionRegistry::new();
        let log = Log::default();
        let slot = recording_slot(&mut registry, &log);
        let key = EventKey::enter(Boundary::Lower);

        trigger(slot, key, false).unwrap();
        let outcome = trigger(slot, key, true).unwrap();
        assert!(outcome.fired);
        assert!(!outcome.derived);
        assert_eq!(take(&log), vec![key, key]);
    }

    #[test]
    fn second_constituent_derives_conjunction() {
        let mut registry = RegionRegistry::new();
        let log = Log::default();
        let slot = recording_slot(&mut registry, &log);

        let first = trigger(slot, EventKey::enter(Boundary::Lower), false).unwrap();
        assert_eq!(first.dispatches(), 1);
        assert!(!slot.region.is_active(Boundary::Conjunction));

        let second = trigger(slot, EventKey::enter(Boundary::Upper), false).unwrap();
        assert_eq!(second.dispatches(), 2);
        assert_eq!(
            take(&log),
            vec![
                EventKey::enter(Boundary::Lower),
                EventKey::enter(Boundary::Upper),
                EventKey::enter(Boundary::Conjunction),
            ]
        );
        assert!(slot.region.state().is_consistent());
    }

    #[test]
    fn exit_of_one_constituent_exits_conjunction_only() {
        let mut registry = RegionRegistry::new();
        let log = Log::default();
        let slot = recording_slot(&mut registry, &log);
        trigger(slot, EventKey::enter(Boundary::Lower), false).unwrap();
        trigger(slot, EventKey::enter(Boundary::Upper), false).unwrap();
        take(&log);

        trigger(slot, EventKey::exit(Boundary::Lower), false).unwrap();
        assert_eq!(
            take(&log),
            vec![
                EventKey::exit(Boundary::Lower),
                EventKey::exit(Boundary::Conjunction),
            ]
        );
        let state = slot.region.state();
        assert!(!state.lower);
        assert!(state.upper);
        assert!(!state.conjunction);
    }

    #[test]
    fn direct_conjunction_overrides_constituents_silently() {
        let mut registry = RegionRegistry::new();
        let log = Log::default();
        let slot = recording_slot(&mut registry, &log);

        trigger(slot, EventKey::enter(Boundary::Conjunction), false).unwrap();
        assert_eq!(take(&log), vec![EventKey::enter(Boundary::Conjunction)]);
        let state = slot.region.state();
        assert!(state.lower && state.upper && state.conjunction);

        trigger(slot, EventKey::exit(Boundary::Conjunction), false).unwrap();
        assert_eq!(take(&log), vec![EventKey::exit(Boundary::Conjunction)]);
        assert_eq!(slot.region.state(), crate::region::RegionState::default());
    }

    #[test]
    fn failing_callback_aborts_dispatch_and_keeps_state() {
        let mut registry = RegionRegistry::new();
        let log = Log::default();
        let key = EventKey::enter(Boundary::Upper);
        let after = Arc::clone(&log);
        let slot = registry
            .create(
                RegionDef::new("r", "width"),
                vec![
                    Binding::new(key, Callback::new(|_| Err(CallbackError::new("boom")))),
                    Binding::new(
                        key,
                        Callback::infallible(move |ev| after.lock().unwrap().push(ev.key)),
                    ),
                ],
            )
            .unwrap();

        let err = trigger(slot, key, false).unwrap_err();
        assert_eq!(err.message(), "boom");
        assert!(take(&log).is_empty());
        assert!(!slot.region.is_active(Boundary::Upper));
    }

    #[test]
    fn replay_only_when_state_already_holds() {
        let mut registry = RegionRegistry::new();
        let log = Log::default();
        let slot = recording_slot(&mut registry, &log);
        let hits = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&hits);
        let cb = Callback::infallible(move |ev| {
            assert_eq!(ev.cause, EventCause::Replay);
            *counter.lock().unwrap() += 1;
        });

        assert!(!replay(slot, EventKey::enter(Boundary::Lower), &cb).unwrap());
        assert!(replay(slot, EventKey::exit(Boundary::Lower), &cb).unwrap());
        assert_eq!(*hits.lock().unwrap(), 1);
    }
}
