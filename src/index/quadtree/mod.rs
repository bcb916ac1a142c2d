//! Point-region quadtree over [`SpatialEntry`] values.
//!
//! The tree covers a fixed universe rectangle. Each leaf holds up to
//! `bucket_capacity` entries; inserting into a full leaf replaces it with an
//! internal node whose four children partition the leaf's region around its
//! center. Regions are not stored in the nodes, they are recomputed from the
//! universe on the way down.

use std::fmt;

use serde::Serialize;
use tracing::{debug, trace};

use crate::types::{GeoPoint, GisError, Locator, Rect, Result};

use super::entry::{LocatorSet, SpatialEntry};


/// Default leaf capacity.
pub const DEFAULT_BUCKET_CAPACITY: usize = 1;

/// One of the four children of an internal node.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Quadrant {
    /// North-east, including the center.
    NE,
    /// North-west.
    NW,
    /// South-east.
    SE,
    /// South-west.
    SW,
}

impl Quadrant {
    /// Child order used by internal nodes and the dump.
    pub const ALL: [Quadrant; 4] = [Quadrant::NE, Quadrant::NW, Quadrant::SE, Quadrant::SW];

    #[inline]
    fn index(self) -> usize {
        match self {
            Quadrant::NE => 0,
            Quadrant::NW => 1,
            Quadrant::SE => 2,
            Quadrant::SW => 3,
        }
    }

    /// Classifies `point` relative to `center`.
    ///
    /// The center itself and the positive x half-axis go NE, the negative x
    /// half-axis SW, the positive y half-axis NW and the negative y half-axis SE.
    pub fn classify(point: GeoPoint, center: GeoPoint) -> Quadrant {
        use std::cmp::Ordering::{Equal, Greater, Less};
        match (point.x.cmp(&center.x), point.y.cmp(&center.y)) {
            (Equal, Equal) | (Greater, Equal) | (Greater, Greater) => Quadrant::NE,
            (Less, Equal) | (Less, Less) => Quadrant::SW,
            (Equal, Greater) | (Less, Greater) => Quadrant::NW,
            (Equal, Less) | (Greater, Less) => Quadrant::SE,
        }
    }

    /// Sub-rectangle of `parent` governed by this quadrant.
    pub fn region(self, parent: &Rect, center: GeoPoint) -> Rect {
        match self {
            Quadrant::NE => Rect::new(center.x, parent.x_max, center.y, parent.y_max),
            Quadrant::NW => Rect::new(parent.x_min, center.x, center.y, parent.y_max),
            Quadrant::SE => Rect::new(center.x, parent.x_max, parent.y_min, center.y),
            Quadrant::SW => Rect::new(parent.x_min, center.x, parent.y_min, center.y),
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Quadrant::NE => "NE",
            Quadrant::NW => "NW",
            Quadrant::SE => "SE",
            Quadrant::SW => "SW",
        };
        f.write_str(label)
    }
}

type Children = [Option<Box<Node>>; 4];

#[derive(Debug)]
enum Node {
    Leaf(Vec<SpatialEntry>),
    Internal(Children),
}

/// Shape of the root slot, exposed for diagnostics and tests.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// No entries.
    Empty,
    /// A single leaf.
    Leaf,
    /// An internal node.
    Internal,
}

/// Result of a successful (in-universe) insertion.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InsertOutcome {
    /// A new coordinate was stored.
    Added,
    /// The coordinate already existed; the locator joined its set.
    Merged,
    /// The coordinate already held this locator; nothing changed.
    Duplicate,
}

/// Shape counters for a [`QuadTree`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct QuadTreeStats {
    /// Distinct coordinates.
    pub points: usize,
    /// Locators across all coordinates.
    pub locators: usize,
    /// Leaf nodes.
    pub leaves: usize,
    /// Internal nodes.
    pub internal_nodes: usize,
    /// Levels from the root to the deepest leaf.
    pub height: usize,
    /// Configured leaf capacity.
    pub bucket_capacity: usize,
}

/// PR quadtree keyed by integer coordinates.
#[derive(Debug)]
pub struct QuadTree {
    universe: Rect,
    root: Option<Box<Node>>,
    bucket_capacity: usize,
    len: usize,
    locators: usize,
}

impl QuadTree {
    /// Creates an empty tree over `universe`.
    pub fn new(universe: Rect, bucket_capacity: usize) -> Result<Self> {
        if bucket_capacity == 0 {
            return Err(GisError::InvalidArgument(
                "quadtree bucket capacity must be at least 1".into(),
            ));
        }
        if !universe.is_well_formed() {
            return Err(GisError::InvalidArgument(format!(
                "universe {universe} has inverted bounds"
            )));
        }
        Ok(Self {
            universe,
            root: None,
            bucket_capacity,
            len: 0,
            locators: 0,
        })
    }

    /// Rectangle the tree covers.
    pub fn universe(&self) -> Rect {
        self.universe
    }

    /// Leaf capacity.
    pub fn bucket_capacity(&self) -> usize {
        self.bucket_capacity
    }

    /// Number of distinct coordinates stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Total locators across all entries.
    pub fn locator_count(&self) -> usize {
        self.locators
    }

    /// Shape of the root slot.
    pub fn root_kind(&self) -> NodeKind {
        match self.root.as_deref() {
            None => NodeKind::Empty,
            Some(Node::Leaf(_)) => NodeKind::Leaf,
            Some(Node::Internal(_)) => NodeKind::Internal,
        }
    }

    /// Files `locator` under `point`.
    ///
    /// Returns `false` without touching the tree when `point` is outside the
    /// universe. A point equal to an existing entry merges into it.
    pub fn insert(&mut self, point: GeoPoint, locator: Locator) -> bool {
        self.insert_entry(SpatialEntry::new(point, locator)).is_some()
    }

    /// Like [`QuadTree::insert`] but reports whether a new coordinate was added.
    pub fn insert_entry(&mut self, entry: SpatialEntry) -> Option<InsertOutcome> {
        if !self.universe.contains(entry.point()) {
            trace!(point = %entry.point(), "index.quadtree.out_of_world");
            return None;
        }
        let mut outcome = InsertOutcome::Added;
        let root = self.root.take();
        self.root = Some(insert_into(
            root,
            entry,
            self.universe,
            self.bucket_capacity,
            &mut outcome,
        ));
        match outcome {
            InsertOutcome::Added => {
                self.len += 1;
                self.locators += 1;
            }
            InsertOutcome::Merged => self.locators += 1,
            InsertOutcome::Duplicate => {}
        }
        Some(outcome)
    }

    /// Exact-match lookup of the locators stored at `point`.
    pub fn find(&self, point: GeoPoint) -> Option<&LocatorSet> {
        if !self.universe.contains(point) {
            return None;
        }
        let mut region = self.universe;
        let mut node = self.root.as_deref()?;
        loop {
            match node {
                Node::Leaf(entries) => {
                    return entries
                        .iter()
                        .find(|e| e.point() == point)
                        .map(SpatialEntry::locators);
                }
                Node::Internal(children) => {
                    let center = region.center();
                    let quadrant = Quadrant::classify(point, center);
                    region = quadrant.region(&region, center);
                    node = children[quadrant.index()].as_deref()?;
                }
            }
        }
    }

    /// Collects every entry whose coordinate lies inside the inclusive
    /// rectangle `[x_lo, x_hi] x [y_lo, y_hi]`.
    pub fn range_query(&self, x_lo: i64, x_hi: i64, y_lo: i64, y_hi: i64) -> Vec<&SpatialEntry> {
        self.query_rect(&Rect::new(x_lo, x_hi, y_lo, y_hi))
    }

    /// Like [`QuadTree::range_query`] but takes a [`Rect`].
    pub fn query_rect(&self, query: &Rect) -> Vec<&SpatialEntry> {
        let mut out = Vec::new();
        if let Some(root) = self.root.as_deref() {
            collect_in(root, self.universe, query, &mut out);
        }
        out
    }

    /// Every stored entry, in depth-first order.
    pub fn entries(&self) -> Vec<&SpatialEntry> {
        self.query_rect(&self.universe)
    }

    /// Levels in the tree; 0 when empty.
    pub fn height(&self) -> usize {
        self.root.as_deref().map_or(0, node_height)
    }

    /// Snapshot of the tree shape.
    pub fn stats(&self) -> QuadTreeStats {
        let mut stats = QuadTreeStats {
            points: self.len,
            locators: self.locators,
            height: self.height(),
            bucket_capacity: self.bucket_capacity,
            ..QuadTreeStats::default()
        };
        if let Some(root) = self.root.as_deref() {
            count_nodes(root, &mut stats);
        }
        stats
    }
}

fn insert_into(
    slot: Option<Box<Node>>,
    entry: SpatialEntry,
    region: Rect,
    capacity: usize,
    outcome: &mut InsertOutcome,
) -> Box<Node> {
    let Some(mut node) = slot else {
        *outcome = InsertOutcome::Added;
        return Box::new(Node::Leaf(vec![entry]));
    };

    let overflow = match node.as_mut() {
        Node::Internal(children) => {
            insert_into_child(children, entry, region, capacity, outcome);
            None
        }
        Node::Leaf(entries) => {
            if let Some(idx) = entries.iter().position(|e| e.point() == entry.point()) {
                let fresh = entry
                    .locators()
                    .iter()
                    .filter(|loc| entries[idx].add_locator(*loc))
                    .count();
                *outcome = if fresh > 0 {
                    InsertOutcome::Merged
                } else {
                    InsertOutcome::Duplicate
                };
                None
            } else if entries.len() < capacity || region.is_atomic() {
                entries.push(entry);
                *outcome = InsertOutcome::Added;
                None
            } else {
                Some((std::mem::take(entries), entry))
            }
        }
    };

    if let Some((existing, entry)) = overflow {
        debug!(region = %region, entries = existing.len(), "index.quadtree.split");
        let mut children: Children = Default::default();
        let mut ignored = InsertOutcome::Added;
        for old in existing {
            insert_into_child(&mut children, old, region, capacity, &mut ignored);
        }
        insert_into_child(&mut children, entry, region, capacity, outcome);
        *node = Node::Internal(children);
    }
    node
}

fn insert_into_child(
    children: &mut Children,
    entry: SpatialEntry,
    region: Rect,
    capacity: usize,
    outcome: &mut InsertOutcome,
) {
    let center = region.center();
    let quadrant = Quadrant::classify(entry.point(), center);
    let sub_region = quadrant.region(&region, center);
    let slot = children[quadrant.index()].take();
    children[quadrant.index()] = Some(insert_into(slot, entry, sub_region, capacity, outcome));
}

fn collect_in<'a>(node: &'a Node, region: Rect, query: &Rect, out: &mut Vec<&'a SpatialEntry>) {
    match node {
        Node::Leaf(entries) => {
            out.extend(entries.iter().filter(|e| query.contains(e.point())));
        }
        Node::Internal(children) => {
            let center = region.center();
            for quadrant in Quadrant::ALL {
                let Some(child) = children[quadrant.index()].as_deref() else {
                    continue;
                };
                let sub_region = quadrant.region(&region, center);
                if sub_region.intersects(query) {
                    collect_in(child, sub_region, query, out);
                }
            }
        }
    }
}

fn node_height(node: &Node) -> usize {
    match node {
        Node::Leaf(_) => 1,
        Node::Internal(children) => {
            1 + children
                .iter()
                .filter_map(|c| c.as_deref())
                .map(node_height)
                .max()
                .unwrap_or(0)
        }
    }
}

fn count_nodes(node: &Node, stats: &mut QuadTreeStats) {
    match node {
        Node::Leaf(_) => stats.leaves += 1,
        Node::Internal(children) => {
            stats.internal_nodes += 1;
            for child in children.iter().filter_map(|c| c.as_deref()) {
                count_nodes(child, stats);
            }
        }
    }
}

/// Depth-first structural dump, one line per node.
///
/// Leaves list their entries, internal nodes print `@` followed by their
/// children in NE, NW, SE, SW order, and empty child slots print `*`.
impl fmt::Display for QuadTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root.as_deref() {
            None => writeln!(f, "*"),
            Some(root) => write_node(f, root, 0),
        }
    }
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &Node, depth: usize) -> fmt::Result {
    let pad = depth * 2;
    match node {
        Node::Leaf(entries) => {
            write!(f, "{:pad$}", "")?;
            for (idx, entry) in entries.iter().enumerate() {
                if idx > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{entry}")?;
            }
            writeln!(f)
        }
        Node::Internal(children) => {
            writeln!(f, "{:pad$}@", "")?;
            for slot in children {
                match slot.as_deref() {
                    Some(child) => write_node(f, child, depth + 1)?,
                    None => writeln!(f, "{:width$}*", "", width = pad + 2)?,
                }
            }
            Ok(())
        }
    }
}
