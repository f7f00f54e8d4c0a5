//! Callback registry.
//!
//! Each region owns a [`CallbackTable`]: one ordered list of entries per
//! `(boundary, direction)` pair. Insertion order is invocation order, duplicate
//! callbacks are allowed, and every entry gets its own [`SubscriptionId`] so
//! duplicates can be removed independently.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::boundary::{Boundary, EventKey, Namespace};
use crate::error::CallbackError;
use crate::region::{Axis, Bounds, Region, RegionId};

/// Unique identifier for a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Create a new random subscription id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a callback is being invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCause {
    /// The boundary changed state.
    Transition,
    /// An explicit forced trigger, regardless of current state.
    Forced,
    /// Immediate invocation of a late subscriber whose event already holds.
    Replay,
}

/// Payload handed to every callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionEvent {
    /// Region the event fired on.
    pub region: RegionId,
    /// Axis the region is defined on.
    pub axis: Axis,
    /// The event that fired.
    pub key: EventKey,
    /// Bounds at dispatch time.
    pub bounds: Bounds,
    /// Why the callback is running.
    pub cause: EventCause,
    /// When the event was created.
    pub at: DateTime<Utc>,
}

impl RegionEvent {
    /// Snapshots `region` into an event payload.
    #[must_use]
    pub fn new(region: &Region, key: EventKey, cause: EventCause) -> Self {
        Self {
            region: region.id().clone(),
            axis: region.axis().clone(),
            key,
            bounds: region.bounds(),
            cause,
            at: Utc::now(),
        }
    }
}

type CallbackFn = dyn Fn(&RegionEvent) -> Result<(), CallbackError> + Send + Sync;

/// Shared handle to a user callback.
///
/// Two handles are the same callback when they were cloned from one another;
/// that identity is what [`Detach::Callback`] matches on.
#[derive(Clone)]
pub struct Callback(Arc<CallbackFn>);

impl Callback {
    /// Wraps a fallible callback. An `Err` aborts the rest of the dispatch.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&RegionEvent) -> Result<(), CallbackError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Wraps a callback that cannot fail.
    pub fn infallible<F>(f: F) -> Self
    where
        F: Fn(&RegionEvent) + Send + Sync + 'static,
    {
        Self::new(move |event| {
            f(event);
            Ok(())
        })
    }

    /// True if both handles point at the same closure.
    #[must_use]
    pub fn same(&self, other: &Callback) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.0).cast::<()>(),
            Arc::as_ptr(&other.0).cast::<()>(),
        )
    }

    pub(crate) fn call(&self, event: &RegionEvent) -> Result<(), CallbackError> {
        (self.0)(event)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// One registered callback.
#[derive(Debug, Clone)]
pub struct CallbackEntry {
    /// Handle for removing exactly this entry.
    pub id: SubscriptionId,
    /// The callback itself.
    pub callback: Callback,
    /// Optional tag for bulk removal.
    pub namespace: Option<Namespace>,
}

/// A callback to register at region creation time.
#[derive(Debug, Clone)]
pub struct Binding {
    /// Event to subscribe to.
    pub key: EventKey,
    /// Callback to register.
    pub callback: Callback,
    /// Optional tag for bulk removal.
    pub namespace: Option<Namespace>,
}

impl Binding {
    /// Binds `callback` to `key` without a namespace.
    #[must_use]
    pub fn new(key: EventKey, callback: Callback) -> Self {
        Self {
            key,
            callback,
            namespace: None,
        }
    }

    /// Tags the binding with `namespace`.
    #[must_use]
    pub fn in_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = Some(namespace);
        self
    }
}

/// Selects which entries `unsubscribe` removes.
#[derive(Debug, Clone)]
pub enum Detach {
    /// Every entry for the event.
    All(EventKey),
    /// Entries for the event holding this callback.
    Callback(EventKey, Callback),
    /// Entries tagged with the namespace, across both directions of the boundary.
    Namespace(Boundary, Namespace),
    /// The single entry created by one `subscribe` call.
    Subscription(SubscriptionId),
}

/// Ordered callback lists of a single region.
#[derive(Debug, Clone, Default)]
pub struct CallbackTable {
    lists: HashMap<EventKey, Vec<CallbackEntry>>,
}

impl CallbackTable {
    /// Appends a callback to the list for `key`.
    pub fn push(
        &mut self,
        key: EventKey,
        callback: Callback,
        namespace: Option<Namespace>,
    ) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.lists.entry(key).or_default().push(CallbackEntry {
            id,
            callback,
            namespace,
        });
        id
    }

    /// Entries for `key` in invocation order.
    #[must_use]
    pub fn entries(&self, key: EventKey) -> &[CallbackEntry] {
        self.lists.get(&key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Removes the selected entries and returns how many were removed.
    pub fn detach(&mut self, selector: &Detach) -> usize {
        let before = self.len();
        match selector {
            Detach::All(key) => {
                self.lists.remove(key);
            }
            Detach::Callback(key, callback) => {
                if let Some(list) = self.lists.get_mut(key) {
                    list.retain(|e| !e.callback.same(callback));
                }
            }
            Detach::Namespace(boundary, namespace) => {
                for (key, list) in &mut self.lists {
                    if key.boundary == *boundary {
                        list.retain(|e| e.namespace.as_ref() != Some(namespace));
                    }
                }
            }
            Detach::Subscription(id) => {
                for list in self.lists.values_mut() {
                    list.retain(|e| e.id != *id);
                }
            }
        }
        self.lists.retain(|_, list| !list.is_empty());
        before - self.len()
    }

    /// Total number of entries across all events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lists.values().map(Vec::len).sum()
    }

    /// Whether no callback is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}
