//! Boundary and direction identifiers.
//!
//! An event is the tagged pair `(Boundary, Direction)`; a subscription may add
//! an optional [`Namespace`] tag. The legacy dashed form (`"enter-min"`,
//! `"exit-both.menu"`) is accepted through [`EventSpec`]'s `FromStr` so hosts
//! can keep string-keyed bindings without the core ever parsing at dispatch time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// One of the three tracked boundaries of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// The lower bound.
    Lower,
    /// The upper bound.
    Upper,
    /// Both bounds satisfied at once (derived).
    Conjunction,
}

impl Boundary {
    /// The two bounds that are evaluated directly against the predicate.
    pub const ELEMENTARY: [Boundary; 2] = [Boundary::Lower, Boundary::Upper];

    /// All three boundaries.
    pub const ALL: [Boundary; 3] = [Boundary::Lower, Boundary::Upper, Boundary::Conjunction];

    /// Returns true for `Lower` and `Upper`.
    #[must_use]
    pub const fn is_elementary(self) -> bool {
        !matches!(self, Self::Conjunction)
    }

    /// The other elementary bound (`Lower` <-> `Upper`); `None` for the conjunction.
    #[must_use]
    pub const fn complement(self) -> Option<Boundary> {
        match self {
            Self::Lower => Some(Self::Upper),
            Self::Upper => Some(Self::Lower),
            Self::Conjunction => None,
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lower => "lower",
            Self::Upper => "upper",
            Self::Conjunction => "both",
        }
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Boundary {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if value.eq_ignore_ascii_case("lower") || value.eq_ignore_ascii_case("min") {
            Ok(Self::Lower)
        } else if value.eq_ignore_ascii_case("upper") || value.eq_ignore_ascii_case("max") {
            Ok(Self::Upper)
        } else if value.eq_ignore_ascii_case("both") || value.eq_ignore_ascii_case("conjunction") {
            Ok(Self::Conjunction)
        } else {
            Err(ValidationError::UnknownBoundary {
                input: s.to_string(),
            })
        }
    }
}

/// Crossing direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// The boundary became satisfied.
    Enter,
    /// The boundary stopped being satisfied.
    Exit,
}

impl Direction {
    /// The activity flag a boundary holds after a crossing in this direction.
    #[must_use]
    pub const fn target_state(self) -> bool {
        matches!(self, Self::Enter)
    }

    /// Direction that moves a boundary into `active`.
    #[must_use]
    pub const fn toward(active: bool) -> Self {
        if active {
            Self::Enter
        } else {
            Self::Exit
        }
    }

    /// The reverse crossing.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Enter => Self::Exit,
            Self::Exit => Self::Enter,
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::Exit => "exit",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if value.eq_ignore_ascii_case("enter") {
            Ok(Self::Enter)
        } else if value.eq_ignore_ascii_case("exit") {
            Ok(Self::Exit)
        } else {
            Err(ValidationError::UnknownDirection {
                input: s.to_string(),
            })
        }
    }
}

/// A `(boundary, direction)` pair identifying one callback list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKey {
    /// Which boundary is crossed.
    pub boundary: Boundary,
    /// Which way it is crossed.
    pub direction: Direction,
}

impl EventKey {
    /// Pairs a boundary with a direction.
    #[must_use]
    pub const fn new(boundary: Boundary, direction: Direction) -> Self {
        Self { boundary, direction }
    }

    /// Entering `boundary`.
    #[must_use]
    pub const fn enter(boundary: Boundary) -> Self {
        Self::new(boundary, Direction::Enter)
    }

    /// Exiting `boundary`.
    #[must_use]
    pub const fn exit(boundary: Boundary) -> Self {
        Self::new(boundary, Direction::Exit)
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.direction, self.boundary)
    }
}

/// Tag attached to a subscription for bulk removal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    /// Creates a namespace tag, rejecting empty or whitespace-only input.
    pub fn new(tag: impl Into<String>) -> Result<Self, ValidationError> {
        let tag = tag.into();
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyNamespace);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The tag text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Namespace {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Namespace {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self {
        ns.0
    }
}

/// An event key plus optional namespace, parsed from `"<direction>-<boundary>[.<namespace>]"`.
///
/// ```
/// use corral::{Boundary, Direction, EventSpec};
///
/// let spec: EventSpec = "enter-min.menu".parse().unwrap();
/// assert_eq!(spec.key.boundary, Boundary::Lower);
/// assert_eq!(spec.key.direction, Direction::Enter);
/// assert_eq!(spec.namespace.unwrap().as_str(), "menu");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventSpec {
    /// The event the name refers to.
    pub key: EventKey,
    /// Tag after the dot, if any.
    pub namespace: Option<Namespace>,
}

impl FromStr for EventSpec {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ValidationError::MalformedEvent {
            input: s.to_string(),
        };

        let (event, namespace) = match s.trim().split_once('.') {
            Some((event, ns)) => (event, Some(Namespace::new(ns)?)),
            None => (s.trim(), None),
        };
        let (direction, boundary) = event.split_once('-').ok_or_else(malformed)?;
        if direction.is_empty() || boundary.is_empty() {
            return Err(malformed());
        }

        Ok(Self {
            key: EventKey::new(boundary.parse()?, direction.parse()?),
            namespace,
        })
    }
}

impl fmt::Display for EventSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}.{ns}", self.key),
            None => write!(f, "{}", self.key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_synonyms_parse() {
        assert_eq!("min".parse::<Boundary>().unwrap(), Boundary::Lower);
        assert_eq!("LOWER".parse::<Boundary>().unwrap(), Boundary::Lower);
        assert_eq!("max".parse::<Boundary>().unwrap(), Boundary::Upper);
        assert_eq!("both".parse::<Boundary>().unwrap(), Boundary::Conjunction);
        assert_eq!("conjunction".parse::<Boundary>().unwrap(), Boundary::Conjunction);
    }

    #[test]
    fn unknown_boundary_is_validation_error() {
        let err = "middle".parse::<Boundary>().unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownBoundary {
                input: "middle".to_string()
            }
        );
    }

    #[test]
    fn complement_swaps_elementary_bounds() {
        assert_eq!(Boundary::Lower.complement(), Some(Boundary::Upper));
        assert_eq!(Boundary::Upper.complement(), Some(Boundary::Lower));
        assert_eq!(Boundary::Conjunction.complement(), None);
    }

    #[test]
    fn direction_target_state() {
        assert!(Direction::Enter.target_state());
        assert!(!Direction::Exit.target_state());
        assert_eq!(Direction::toward(true), Direction::Enter);
        assert_eq!(Direction::Enter.opposite(), Direction::Exit);
    }

    #[test]
    fn event_spec_without_namespace() {
        let spec: EventSpec = "exit-both".parse().unwrap();
        assert_eq!(spec.key, EventKey::exit(Boundary::Conjunction));
        assert!(spec.namespace.is_none());
        assert_eq!(spec.to_string(), "exit-both");
    }

    #[test]
    fn event_spec_with_namespace_round_trips_display() {
        let spec: EventSpec = "enter-max.nav".parse().unwrap();
        assert_eq!(spec.to_string(), "enter-upper.nav");
    }

    #[test]
    fn event_spec_rejects_malformed_input() {
        assert!(matches!(
            "enter".parse::<EventSpec>(),
            Err(ValidationError::MalformedEvent { .. })
        ));
        assert!(matches!(
            "-min".parse::<EventSpec>(),
            Err(ValidationError::MalformedEvent { .. })
        ));
        assert!(matches!(
            "leave-min".parse::<EventSpec>(),
            Err(ValidationError::UnknownDirection { .. })
        ));
        assert!(matches!(
            "enter-min.".parse::<EventSpec>(),
            Err(ValidationError::EmptyNamespace)
        ));
    }

    #[test]
    fn namespace_serde_rejects_empty() {
        let ok: Namespace = serde_json::from_str("\"menu\"").unwrap();
        assert_eq!(ok.as_str(), "menu");
        assert!(serde_json::from_str::<Namespace>("\"  \"").is_err());
    }
}
