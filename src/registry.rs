//! Region registry.
//!
//! Owns every [`Region`] together with its [`CallbackTable`]. Regions are
//! created here, mutated only by the trigger state machine, and destroyed only
//! by an explicit [`RegionRegistry::remove`]. Iteration follows creation order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::boundary::{Boundary, EventKey, Namespace};
use crate::callbacks::{Binding, Callback, CallbackTable, Detach, SubscriptionId};
use crate::error::{NotFoundError, ValidationError};
use crate::region::{Axis, Region, RegionDef, RegionId};

/// A region and the callbacks subscribed to it.
#[derive(Debug, Clone)]
pub struct RegionSlot {
    pub(crate) region: Region,
    pub(crate) callbacks: CallbackTable,
}

impl RegionSlot {
    fn new(region: Region) -> Self {
        Self {
            region,
            callbacks: CallbackTable::default(),
        }
    }

    /// The region.
    #[must_use]
    pub const fn region(&self) -> &Region {
        &self.region
    }

    /// Its callback lists.
    #[must_use]
    pub const fn callbacks(&self) -> &CallbackTable {
        &self.callbacks
    }

    pub(crate) fn subscribe(
        &mut self,
        key: EventKey,
        callback: Callback,
        namespace: Option<Namespace>,
    ) -> SubscriptionId {
        self.callbacks.push(key, callback, namespace)
    }
}

/// Introspection snapshot of one region's definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundarySnapshot {
    /// Measured axis.
    pub axis: Axis,
    /// Lower bound, if set.
    pub lower: Option<f64>,
    /// Upper bound, if set.
    pub upper: Option<f64>,
}

/// Named regions, in creation order.
#[derive(Debug, Clone, Default)]
pub struct RegionRegistry {
    slots: IndexMap<RegionId, RegionSlot>,
}

impl RegionRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a region with its initial callbacks.
    ///
    /// An existing region with the same id is replaced in place: its callbacks
    /// are discarded and no exit events fire. The new region starts with every
    /// boundary inactive; evaluating it is the caller's job.
    pub fn create(
        &mut self,
        def: RegionDef,
        bindings: Vec<Binding>,
    ) -> Result<&mut RegionSlot, ValidationError> {
        def.validate()?;

        let id = def.id.clone();
        let mut slot = RegionSlot::new(def.into_region());
        for binding in bindings {
            slot.subscribe(binding.key, binding.callback, binding.namespace);
        }

        let (index, previous) = self.slots.insert_full(id.clone(), slot);
        if previous.is_some() {
            debug!(region = %id, "replaced existing region");
        } else {
            debug!(region = %id, "created region");
        }

        Ok(&mut self.slots[index])
    }

    /// Removes a region and its callbacks. No exit events fire.
    ///
    /// Returns false if no region was registered under `id`.
    pub fn remove(&mut self, id: &str) -> bool {
        let removed = self.slots.shift_remove(id).is_some();
        if removed {
            debug!(region = id, "removed region");
        }
        removed
    }

    /// Removes every region without firing events.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Looks a region up by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Region> {
        self.slots.get(id).map(|slot| &slot.region)
    }

    /// Looks a region and its callbacks up by id.
    #[must_use]
    pub fn slot(&self, id: &str) -> Option<&RegionSlot> {
        self.slots.get(id)
    }

    pub(crate) fn slot_mut(&mut self, id: &str) -> Result<&mut RegionSlot, NotFoundError> {
        self.slots.get_mut(id).ok_or_else(|| NotFoundError::Region {
            id: RegionId::from(id),
        })
    }

    pub(crate) fn slots_mut(&mut self) -> impl Iterator<Item = &mut RegionSlot> {
        self.slots.values_mut()
    }

    /// Regions in creation order.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.slots.values().map(|slot| &slot.region)
    }

    /// Ids of regions whose `boundary` is currently active.
    #[must_use]
    pub fn active(&self, boundary: Boundary) -> Vec<RegionId> {
        self.regions()
            .filter(|region| region.is_active(boundary))
            .map(|region| region.id().clone())
            .collect()
    }

    /// Snapshot of every region's axis and bounds.
    #[must_use]
    pub fn list_boundaries(&self) -> IndexMap<RegionId, BoundarySnapshot> {
        self.regions()
            .map(|region| {
                (
                    region.id().clone(),
                    BoundarySnapshot {
                        axis: region.axis().clone(),
                        lower: region.lower(),
                        upper: region.upper(),
                    },
                )
            })
            .collect()
    }

    /// Removes callbacks from a region.
    ///
    /// Selecting by namespace or subscription id fails with [`NotFoundError`]
    /// when nothing matched; the other selectors report zero removals as `Ok(0)`.
    pub fn detach(&mut self, id: &str, selector: &Detach) -> Result<usize, NotFoundError> {
        let slot = self.slot_mut(id)?;
        let removed = slot.callbacks.detach(selector);
        if removed == 0 {
            match selector {
                Detach::Namespace(_, namespace) => {
                    return Err(NotFoundError::Namespace {
                        region: slot.region.id().clone(),
                        namespace: namespace.clone(),
                    });
                }
                Detach::Subscription(sub) => {
                    return Err(NotFoundError::Subscription {
                        region: slot.region.id().clone(),
                        id: *sub,
                    });
                }
                Detach::All(_) | Detach::Callback(..) => {}
            }
        }
        debug!(region = id, removed, "detached callbacks");
        Ok(removed)
    }

    /// Number of regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no region is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
