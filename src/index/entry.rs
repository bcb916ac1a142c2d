use std::fmt;

use smallvec::SmallVec;

use crate::types::{GeoPoint, Locator};

/// Duplicate-free collection of locators, kept in first-seen order.
///
/// Most features map to a single record, so the first two locators live inline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocatorSet {
    items: SmallVec<[Locator; 2]>,
}

impl LocatorSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set holding one locator.
    pub fn single(locator: Locator) -> Self {
        let mut items = SmallVec::new();
        items.push(locator);
        Self { items }
    }

    /// Adds `locator`, returning `false` when it was already present.
    pub fn insert(&mut self, locator: Locator) -> bool {
        if self.items.contains(&locator) {
            return false;
        }
        self.items.push(locator);
        true
    }

    /// Folds every locator of `other` into `self`; returns how many were new.
    pub fn merge(&mut self, other: &LocatorSet) -> usize {
        other.iter().filter(|loc| self.insert(*loc)).count()
    }

    /// Returns `true` if `locator` is present.
    pub fn contains(&self, locator: Locator) -> bool {
        self.items.contains(&locator)
    }

    /// Number of locators.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` for an empty set.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Earliest locator added.
    pub fn first(&self) -> Option<Locator> {
        self.items.first().copied()
    }

    /// Locators in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = Locator> + '_ {
        self.items.iter().copied()
    }

    /// Locators as a slice, in insertion order.
    pub fn as_slice(&self) -> &[Locator] {
        &self.items
    }
}

impl FromIterator<Locator> for LocatorSet {
    fn from_iter<I: IntoIterator<Item = Locator>>(iter: I) -> Self {
        let mut set = LocatorSet::new();
        for locator in iter {
            set.insert(locator);
        }
        set
    }
}

impl fmt::Display for LocatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (idx, locator) in self.items.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{locator}")?;
        }
        f.write_str("]")
    }
}

/// Hash index element: a `name:state` key and every record filed under it.
#[derive(Clone, Debug)]
pub struct NameEntry {
    key: String,
    locators: LocatorSet,
}

impl NameEntry {
    /// Creates an entry for `key` holding one locator.
    pub fn new(key: impl Into<String>, locator: Locator) -> Self {
        Self {
            key: key.into(),
            locators: LocatorSet::single(locator),
        }
    }

    /// The `name:state` key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Records filed under the key.
    pub fn locators(&self) -> &LocatorSet {
        &self.locators
    }

    pub(crate) fn absorb(&mut self, other: &NameEntry) -> usize {
        self.locators.merge(&other.locators)
    }
}

/// Identity is the key alone; locator sets never take part in equality.
impl PartialEq for NameEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for NameEntry {}

impl fmt::Display for NameEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.key, self.locators)
    }
}

/// Quadtree element: one coordinate and every record located there.
#[derive(Clone, Debug)]
pub struct SpatialEntry {
    point: GeoPoint,
    locators: LocatorSet,
}

impl SpatialEntry {
    /// Creates an entry at `point` holding one locator.
    pub fn new(point: GeoPoint, locator: Locator) -> Self {
        Self {
            point,
            locators: LocatorSet::single(locator),
        }
    }

    /// Stored coordinate.
    pub fn point(&self) -> GeoPoint {
        self.point
    }

    /// Longitude in seconds.
    pub fn x(&self) -> i64 {
        self.point.x
    }

    /// Latitude in seconds.
    pub fn y(&self) -> i64 {
        self.point.y
    }

    /// Records located at the coordinate.
    pub fn locators(&self) -> &LocatorSet {
        &self.locators
    }

    pub(crate) fn add_locator(&mut self, locator: Locator) -> bool {
        self.locators.insert(locator)
    }
}

impl PartialEq for SpatialEntry {
    fn eq(&self, other: &Self) -> bool {
        self.point == other.point
    }
}

impl Eq for SpatialEntry {}

impl fmt::Display for SpatialEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.point, self.locators)
    }
}
