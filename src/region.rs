//! Region types.
//!
//! A region is a named interval on one axis. Its lower and upper bounds are
//! tracked independently; the conjunction flag records "inside both bounds".

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::boundary::Boundary;
use crate::error::ValidationError;

/// Unique region name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(String);

impl RegionId {
    /// The id text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RegionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for RegionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Opaque identifier of the measured axis (e.g. `"width"`, `"height"`).
///
/// The core never interprets it; it is handed to the boundary predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Axis(String);

impl Axis {
    /// Wraps an axis name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The axis name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Axis {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Borrow<str> for Axis {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Optional lower and upper bound values.
///
/// `lower <= upper` is the caller's responsibility and is not checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Lower bound; `None` is unbounded below.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    /// Upper bound; `None` is unbounded above.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
}

impl Bounds {
    /// Builds bounds from optional values.
    #[must_use]
    pub const fn new(lower: Option<f64>, upper: Option<f64>) -> Self {
        Self { lower, upper }
    }

    /// Bound value for an elementary boundary. `None` for an unset bound or the conjunction.
    #[must_use]
    pub const fn get(&self, boundary: Boundary) -> Option<f64> {
        match boundary {
            Boundary::Lower => self.lower,
            Boundary::Upper => self.upper,
            Boundary::Conjunction => None,
        }
    }
}

/// Activity flags of a region.
///
/// At rest `conjunction == lower && upper`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionState {
    /// Lower bound satisfied.
    pub lower: bool,
    /// Upper bound satisfied.
    pub upper: bool,
    /// Inside both bounds.
    pub conjunction: bool,
}

impl RegionState {
    /// Flag of one boundary.
    #[must_use]
    pub const fn get(&self, boundary: Boundary) -> bool {
        match boundary {
            Boundary::Lower => self.lower,
            Boundary::Upper => self.upper,
            Boundary::Conjunction => self.conjunction,
        }
    }

    pub(crate) fn set(&mut self, boundary: Boundary, active: bool) {
        match boundary {
            Boundary::Lower => self.lower = active,
            Boundary::Upper => self.upper = active,
            Boundary::Conjunction => self.conjunction = active,
        }
    }

    /// Whether the conjunction flag agrees with its two constituents.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.conjunction == (self.lower && self.upper)
    }
}

/// A named interval on one axis with its current activity flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    id: RegionId,
    axis: Axis,
    bounds: Bounds,
    state: RegionState,
}

impl Region {
    pub(crate) fn new(id: RegionId, axis: Axis, bounds: Bounds) -> Self {
        Self {
            id,
            axis,
            bounds,
            state: RegionState::default(),
        }
    }

    /// Region id.
    #[must_use]
    pub const fn id(&self) -> &RegionId {
        &self.id
    }

    /// Axis the bounds are measured on.
    #[must_use]
    pub const fn axis(&self) -> &Axis {
        &self.axis
    }

    /// Lower bound, if set.
    #[must_use]
    pub const fn lower(&self) -> Option<f64> {
        self.bounds.lower
    }

    /// Upper bound, if set.
    #[must_use]
    pub const fn upper(&self) -> Option<f64> {
        self.bounds.upper
    }

    /// Both bounds.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Snapshot of the activity flags.
    #[must_use]
    pub const fn state(&self) -> RegionState {
        self.state
    }

    /// Current activity flag of `boundary`.
    #[must_use]
    pub const fn is_active(&self, boundary: Boundary) -> bool {
        self.state.get(boundary)
    }

    pub(crate) fn set_active(&mut self, boundary: Boundary, active: bool) {
        self.state.set(boundary, active);
    }

    /// Replaces the bounds; activity flags are left for the next recheck to reconcile.
    pub(crate) fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }
}

/// Declarative region definition, as accepted by `Corral::create`.
///
/// ```
/// use corral::RegionDef;
///
/// let def: RegionDef = serde_json::from_str(
///     r#"{ "id": "tablet", "axis": "width", "lower": 321, "upper": 768 }"#,
/// ).unwrap();
/// assert_eq!(def.bounds.upper, Some(768.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDef {
    /// Region id; must not be empty.
    pub id: RegionId,
    /// Measured axis; must not be empty.
    pub axis: Axis,
    /// Optional bounds, flattened into the definition.
    #[serde(flatten)]
    pub bounds: Bounds,
}

impl RegionDef {
    /// Unbounded definition on `axis`.
    #[must_use]
    pub fn new(id: impl Into<RegionId>, axis: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            axis: Axis::new(axis),
            bounds: Bounds::default(),
        }
    }

    /// Sets the lower bound.
    #[must_use]
    pub fn lower(mut self, value: f64) -> Self {
        self.bounds.lower = Some(value);
        self
    }

    /// Sets the upper bound.
    #[must_use]
    pub fn upper(mut self, value: f64) -> Self {
        self.bounds.upper = Some(value);
        self
    }

    /// Checks the identifiers are non-empty.
    ///
    /// # Errors
    ///
    /// `EmptyRegionId` or `EmptyAxis` for blank identifiers.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(ValidationError::EmptyRegionId);
        }
        if self.axis.as_str().trim().is_empty() {
            return Err(ValidationError::EmptyAxis);
        }
        Ok(())
    }

    pub(crate) fn into_region(self) -> Region {
        Region::new(self.id, self.axis, self.bounds)
    }
}
