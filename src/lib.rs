//! # Corral - boundary-crossing notifications for named regions
//!
//! Corral models a set of named intervals ("regions") on a measurable axis and
//! emits directional events when a host-supplied measurement crosses a region's
//! lower bound, its upper bound, or both at once.
//!
//! ## Core Concepts
//!
//! - **Region**: a named interval on one axis with independently tracked lower
//!   and upper boundary state
//! - **Boundary**: `Lower`, `Upper`, or the derived `Conjunction` ("inside both")
//! - **Trigger**: idempotent state transition; re-firing needs an opposite
//!   transition or an explicit force
//! - **Cascade**: the single derived conjunction event fired right after the
//!   second constituent bound is entered, or the first one is exited
//! - **Namespace**: optional tag on a subscription for bulk removal
//!
//! Whether a measurement satisfies a bound is never decided here. The host
//! injects a [`BoundaryPredicate`] (a media-query matcher, a feature test, the
//! bundled [`Threshold`] comparator) and calls [`Corral::recheck_all`] whenever
//! the measurement may have changed. Debouncing those calls is the host's job.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use corral::{Boundary, Callback, Corral, EventKey, RegionDef, Threshold};
//!
//! let mut viewport = Threshold::default();
//! viewport.set("width", 1024.0);
//! let mut corral = Corral::new(viewport);
//!
//! corral.create(RegionDef::new("mobile", "width").upper(320.0), Vec::new())?;
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let log = Arc::clone(&seen);
//! corral.subscribe(
//!     "mobile",
//!     EventKey::enter(Boundary::Conjunction),
//!     Callback::infallible(move |ev| log.lock().unwrap().push(ev.region.clone())),
//!     None,
//! )?;
//!
//! corral.predicate_mut().set("width", 300.0);
//! corral.recheck_all()?;
//! assert_eq!(seen.lock().unwrap().len(), 1);
//! # Ok::<(), corral::CorralError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod boundary;
pub mod callbacks;
pub mod config;
pub mod driver;
pub mod error;
pub mod evaluator;
pub mod query;
pub mod region;
pub mod registry;
pub mod stream;
pub mod trigger;

// Re-export primary types at crate root for convenience
pub use boundary::{Boundary, Direction, EventKey, EventSpec, Namespace};
pub use callbacks::{
    Binding, Callback, CallbackEntry, CallbackTable, Detach, EventCause, RegionEvent,
    SubscriptionId,
};
pub use config::CorralConfig;
pub use driver::Corral;
pub use error::{
    CallbackError, CorralError, CorralResult, NotFoundError, StreamError, ValidationError,
};
pub use evaluator::Evaluator;
pub use query::{BoundaryPredicate, BoundaryQuery, Threshold, UNBOUNDED_LOWER, UNBOUNDED_UPPER};
pub use region::{Axis, Bounds, Region, RegionDef, RegionId, RegionState};
pub use registry::{BoundarySnapshot, RegionRegistry, RegionSlot};
pub use stream::EventStream;
pub use trigger::TriggerOutcome;
