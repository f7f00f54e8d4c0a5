//! Boundary queries and the injected predicate seam.
//!
//! Deciding whether a measurement satisfies a bound is entirely up to the host.
//! The core only builds a [`BoundaryQuery`] per elementary boundary and asks a
//! [`BoundaryPredicate`] for a yes/no answer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::boundary::Boundary;
use crate::region::{Axis, Region};

/// Stand-in value for an unset lower bound. Always satisfied.
pub const UNBOUNDED_LOWER: f64 = f64::NEG_INFINITY;

/// Stand-in value for an unset upper bound. Always satisfied.
pub const UNBOUNDED_UPPER: f64 = f64::INFINITY;

/// Question put to the predicate: does the current measurement on `axis`
/// satisfy `boundary` at `value`?
///
/// An unset bound carries a sentinel `value` and `bounded == false`. An
/// explicitly configured infinite bound keeps `bounded == true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryQuery {
    /// Measured axis.
    pub axis: Axis,
    /// Bound being tested, `Lower` or `Upper`.
    pub boundary: Boundary,
    /// Bound value, or the sentinel for an unset bound.
    pub value: f64,
    /// False when the region leaves this bound unset.
    pub bounded: bool,
}

impl BoundaryQuery {
    /// Query against an explicitly set bound.
    #[must_use]
    pub fn new(axis: impl Into<Axis>, boundary: Boundary, value: f64) -> Self {
        Self {
            axis: axis.into(),
            boundary,
            value,
            bounded: true,
        }
    }

    /// Builds the query for one elementary boundary of `region`, substituting
    /// the sentinel when that bound is unset.
    ///
    /// `boundary` must be `Lower` or `Upper`; the conjunction is never queried.
    #[must_use]
    pub fn for_region(region: &Region, boundary: Boundary) -> Self {
        debug_assert!(boundary.is_elementary(), "conjunction is derived, not queried");
        let configured = region.bounds().get(boundary);
        let value = configured.unwrap_or(match boundary {
            Boundary::Upper => UNBOUNDED_UPPER,
            Boundary::Lower | Boundary::Conjunction => UNBOUNDED_LOWER,
        });
        Self {
            axis: region.axis().clone(),
            boundary,
            value,
            bounded: configured.is_some(),
        }
    }

    /// True when the bound is unset and therefore always satisfied.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        !self.bounded
    }
}

/// Host-supplied decision for a [`BoundaryQuery`].
///
/// Implemented for any `Fn(&BoundaryQuery) -> bool`, so a media-query matcher
/// or class-name check can be passed as a closure.
pub trait BoundaryPredicate {
    /// Returns true if the current measurement satisfies the queried bound.
    fn matches(&self, query: &BoundaryQuery) -> bool;
}

impl<F> BoundaryPredicate for F
where
    F: Fn(&BoundaryQuery) -> bool,
{
    fn matches(&self, query: &BoundaryQuery) -> bool {
        self(query)
    }
}

/// Inclusive numeric comparison against measurements supplied by the host.
///
/// A lower bound is satisfied when `measurement >= value`, an upper bound when
/// `measurement <= value`. Axes with no recorded measurement only satisfy the
/// unbounded sentinels.
///
/// ```
/// use corral::{Boundary, BoundaryPredicate, BoundaryQuery, Threshold};
///
/// let mut width = Threshold::default();
/// width.set("width", 400.0);
/// assert!(!width.matches(&BoundaryQuery::new("width", Boundary::Upper, 320.0)));
/// assert!(width.matches(&BoundaryQuery::new("width", Boundary::Lower, 320.0)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    measurements: HashMap<Axis, f64>,
}

impl Threshold {
    /// Records the current measurement for `axis`, returning the previous one.
    pub fn set(&mut self, axis: impl Into<String>, value: f64) -> Option<f64> {
        self.measurements.insert(Axis::new(axis), value)
    }

    /// Forgets the measurement for `axis`.
    pub fn clear(&mut self, axis: &str) -> Option<f64> {
        self.measurements.remove(axis)
    }

    /// The recorded measurement for `axis`.
    #[must_use]
    pub fn get(&self, axis: &str) -> Option<f64> {
        self.measurements.get(axis).copied()
    }
}

impl BoundaryPredicate for Threshold {
    fn matches(&self, query: &BoundaryQuery) -> bool {
        if query.is_unbounded() {
            return true;
        }
        let Some(measured) = self.get(query.axis.as_str()) else {
            return false;
        };
        match query.boundary {
            Boundary::Lower => measured >= query.value,
            Boundary::Upper => measured <= query.value,
            Boundary::Conjunction => false,
        }
    }
}
