//! Re-evaluation of regions against the injected predicate.
//!
//! For each elementary boundary the evaluator asks the predicate whether it is
//! satisfied and triggers only when the answer disagrees with the current flag.
//! Unchanged boundaries dispatch nothing.

use tracing::trace;

use crate::boundary::{Boundary, Direction, EventKey};
use crate::error::{CallbackError, CorralResult};
use crate::query::{BoundaryPredicate, BoundaryQuery};
use crate::registry::{RegionRegistry, RegionSlot};
use crate::trigger;

/// Drives rechecks with a host-supplied [`BoundaryPredicate`].
#[derive(Debug, Clone, Default)]
pub struct Evaluator<P> {
    predicate: P,
}

impl<P: BoundaryPredicate> Evaluator<P> {
    /// Creates an evaluator around `predicate`.
    pub fn new(predicate: P) -> Self {
        Self { predicate }
    }

    /// Returns the injected predicate.
    #[must_use]
    pub fn predicate(&self) -> &P {
        &self.predicate
    }

    /// Returns the predicate mutably, e.g. to feed it a new measurement.
    pub fn predicate_mut(&mut self) -> &mut P {
        &mut self.predicate
    }

    /// Rechecks a single region. Returns the number of dispatched events.
    pub fn recheck_one(&self, registry: &mut RegionRegistry, id: &str) -> CorralResult<usize> {
        let slot = registry.slot_mut(id)?;
        Ok(self.recheck(slot)?)
    }

    /// Rechecks every region in creation order. Returns the number of dispatched events.
    ///
    /// A failing callback stops the sweep; regions after it are not rechecked.
    pub fn recheck_all(&self, registry: &mut RegionRegistry) -> CorralResult<usize> {
        let mut dispatches = 0;
        for slot in registry.slots_mut() {
            dispatches += self.recheck(slot)?;
        }
        Ok(dispatches)
    }

    pub(crate) fn recheck(&self, slot: &mut RegionSlot) -> Result<usize, CallbackError> {
        let mut dispatches = 0;
        for boundary in Boundary::ELEMENTARY {
            let query = BoundaryQuery::for_region(&slot.region, boundary);
            let matched = self.predicate.matches(&query);
            if matched == slot.region.is_active(boundary) {
                continue;
            }
            let key = EventKey::new(boundary, Direction::toward(matched));
            dispatches += trigger::trigger(slot, key, false)?.dispatches();
        }
        if trigger::reconcile_conjunction(slot)? {
            dispatches += 1;
        }
        trace!(region = %slot.region.id(), dispatches, "rechecked region");
        Ok(dispatches)
    }
}
