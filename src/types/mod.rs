#![forbid(unsafe_code)]

//! Value types and the shared error type used across the index engine.

use std::fmt;

use crate::coord::CoordError;

/// Byte offset of one record line inside the record store.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Locator(pub u64);

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Locator {
    fn from(value: u64) -> Self {
        Locator(value)
    }
}

impl From<Locator> for u64 {
    fn from(value: Locator) -> Self {
        value.0
    }
}

/// A coordinate in signed arc-seconds: `x` is longitude, `y` is latitude.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct GeoPoint {
    /// Longitude in seconds, west negative.
    pub x: i64,
    /// Latitude in seconds, south negative.
    pub y: i64,
}

impl GeoPoint {
    /// Creates a point from `x` (longitude) and `y` (latitude).
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned rectangle with inclusive bounds on all four sides.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Rect {
    /// West edge.
    pub x_min: i64,
    /// East edge.
    pub x_max: i64,
    /// South edge.
    pub y_min: i64,
    /// North edge.
    pub y_max: i64,
}

impl Rect {
    /// Creates a rectangle; bounds are not checked.
    pub const fn new(x_min: i64, x_max: i64, y_min: i64, y_max: i64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Builds the rectangle centred on `center` extending `half_width` and
    /// `half_height` seconds in each direction.
    pub fn around(center: GeoPoint, half_width: i64, half_height: i64) -> Self {
        Self {
            x_min: center.x.saturating_sub(half_width),
            x_max: center.x.saturating_add(half_width),
            y_min: center.y.saturating_sub(half_height),
            y_max: center.y.saturating_add(half_height),
        }
    }

    /// Returns `true` when `x_min <= x_max` and `y_min <= y_max`.
    pub fn is_well_formed(&self) -> bool {
        self.x_min <= self.x_max && self.y_min <= self.y_max
    }

    /// Inclusive point containment.
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.x >= self.x_min
            && point.x <= self.x_max
            && point.y >= self.y_min
            && point.y <= self.y_max
    }

    /// Returns `true` when the rectangles overlap or touch.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x_min <= other.x_max
            && other.x_min <= self.x_max
            && self.y_min <= other.y_max
            && other.y_min <= self.y_max
    }

    /// Midpoint used to partition the rectangle into quadrants.
    pub fn center(&self) -> GeoPoint {
        GeoPoint {
            x: self.x_min + (self.x_max.abs_diff(self.x_min) / 2) as i64,
            y: self.y_min + (self.y_max.abs_diff(self.y_min) / 2) as i64,
        }
    }

    /// A rectangle whose extents are both at most one second cannot be split
    /// into strictly smaller quadrants.
    pub fn is_atomic(&self) -> bool {
        self.x_max.abs_diff(self.x_min) <= 1 && self.y_max.abs_diff(self.y_min) <= 1
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}] x [{}, {}]",
            self.x_min, self.x_max, self.y_min, self.y_max
        )
    }
}

/// Errors raised by the indexes, the store and the coordinator.
#[derive(thiserror::Error, Debug)]
pub enum GisError {
    /// Record store IO failure.
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    /// Bad construction or query parameters.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A record line that cannot be indexed.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    /// Malformed DMS coordinate.
    #[error("coordinate: {0}")]
    Coord(#[from] CoordError),
    /// A spatial operation ran before the world was set.
    #[error("world boundaries have not been set")]
    WorldNotSet,
}

/// Result alias for [`GisError`].
pub type Result<T> = std::result::Result<T, GisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_is_inclusive() {
        let rect = Rect::new(0, 100, 0, 100);
        assert!(rect.contains(GeoPoint::new(0, 0)));
        assert!(rect.contains(GeoPoint::new(100, 100)));
        assert!(!rect.contains(GeoPoint::new(101, 50)));
        assert!(!rect.contains(GeoPoint::new(50, -1)));
    }

    #[test]
    fn rect_intersection_touching_edges() {
        let a = Rect::new(0, 50, 0, 50);
        assert!(a.intersects(&Rect::new(50, 100, 50, 100)));
        assert!(!a.intersects(&Rect::new(51, 100, 0, 50)));
    }

    #[test]
    fn center_of_negative_region_stays_inside() {
        let rect = Rect::new(-300_000, -280_000, 130_000, 140_001);
        let center = rect.center();
        assert_eq!(center, GeoPoint::new(-290_000, 135_000));
        assert!(rect.contains(center));
        assert!(Rect::new(-1, 0, 5, 6).is_atomic());
        assert!(!Rect::new(-2, 0, 5, 6).is_atomic());
    }

    #[test]
    fn full_range_rect_has_center_and_extent() {
        let rect = Rect::new(i64::MIN, i64::MAX, i64::MIN, i64::MAX);
        assert_eq!(rect.center(), GeoPoint::new(-1, -1));
        assert!(!rect.is_atomic());
        let upper = Rect::new(-1, i64::MAX, 0, i64::MAX);
        assert!(upper.contains(upper.center()));
        assert!(Rect::new(i64::MAX - 1, i64::MAX, i64::MIN, i64::MIN + 1).is_atomic());
    }
}
