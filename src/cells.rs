use ahash::AHashSet as HashSet;
use std::ops::{Add, Sub};

/// Integer coordinate on the unbounded grid.
///
/// `x` grows to the east and `y` grows to the south, so the north-west
/// corner of a square region has the smallest coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntOffset {
    pub x: i64,
    pub y: i64,
}

impl IntOffset {
    pub const ZERO: IntOffset = IntOffset { x: 0, y: 0 };

    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl Add for IntOffset {
    type Output = IntOffset;

    fn add(self, rhs: IntOffset) -> IntOffset {
        IntOffset::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for IntOffset {
    type Output = IntOffset;

    fn sub(self, rhs: IntOffset) -> IntOffset {
        IntOffset::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl From<(i64, i64)> for IntOffset {
    fn from((x, y): (i64, i64)) -> Self {
        Self::new(x, y)
    }
}

/// Inclusive axis-aligned rectangle covering every live cell of a set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub min: IntOffset,
    pub max: IntOffset,
}

impl BoundingBox {
    pub fn width(&self) -> u64 {
        self.max.x.abs_diff(self.min.x).saturating_add(1)
    }

    pub fn height(&self) -> u64 {
        self.max.y.abs_diff(self.min.y).saturating_add(1)
    }
}

/// Set of live cells on the unbounded grid.
///
/// This is the representation engines exchange with the outside world:
/// an arbitrary sparse layout of integer coordinates, no bounds and no
/// particular order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SparseCellSet {
    cells: HashSet<IntOffset>,
}

impl SparseCellSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: HashSet::with_capacity(capacity),
        }
    }

    /// Marks the cell as alive. Returns `false` if it already was.
    pub fn insert(&mut self, cell: IntOffset) -> bool {
        self.cells.insert(cell)
    }

    pub fn remove(&mut self, cell: IntOffset) -> bool {
        self.cells.remove(&cell)
    }

    pub fn contains(&self, cell: IntOffset) -> bool {
        self.cells.contains(&cell)
    }

    pub fn population(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = IntOffset> + '_ {
        self.cells.iter().copied()
    }

    /// Returns `None` for an empty set.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut iter = self.iter();
        let first = iter.next()?;
        let (mut min, mut max) = (first, first);
        for c in iter {
            min.x = min.x.min(c.x);
            min.y = min.y.min(c.y);
            max.x = max.x.max(c.x);
            max.y = max.y.max(c.y);
        }
        Some(BoundingBox { min, max })
    }

    pub fn translated(&self, delta: IntOffset) -> Self {
        self.iter().map(|c| c + delta).collect()
    }

    /// Translates the set so that its bounding box starts at the origin.
    ///
    /// Two sets are equal up to translation iff their normalized forms are equal.
    pub fn normalized(&self) -> Self {
        let Some(bbox) = self.bounding_box() else {
            return Self::new();
        };
        // exact for spans below 2^63, whatever the position of the box
        self.iter()
            .map(|c| IntOffset::new(c.x.wrapping_sub(bbox.min.x), c.y.wrapping_sub(bbox.min.y)))
            .collect()
    }

    /// Cells sorted row by row, handy for stable output.
    pub fn sorted(&self) -> Vec<IntOffset> {
        let mut cells: Vec<_> = self.iter().collect();
        cells.sort_unstable_by_key(|c| (c.y, c.x));
        cells
    }
}

impl FromIterator<IntOffset> for SparseCellSet {
    fn from_iter<T: IntoIterator<Item = IntOffset>>(iter: T) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<(i64, i64)> for SparseCellSet {
    fn from_iter<T: IntoIterator<Item = (i64, i64)>>(iter: T) -> Self {
        iter.into_iter().map(IntOffset::from).collect()
    }
}

impl Extend<IntOffset> for SparseCellSet {
    fn extend<T: IntoIterator<Item = IntOffset>>(&mut self, iter: T) {
        self.cells.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box() {
        let cells: SparseCellSet = [(3, -1), (-2, 4), (0, 0)].into_iter().collect();
        let bbox = cells.bounding_box().unwrap();
        assert_eq!(bbox.min, IntOffset::new(-2, -1));
        assert_eq!(bbox.max, IntOffset::new(3, 4));
        assert_eq!((bbox.width(), bbox.height()), (6, 6));
        assert!(SparseCellSet::new().bounding_box().is_none());
    }

    #[test]
    fn test_normalized() {
        let glider: SparseCellSet = [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)]
            .into_iter()
            .collect();
        let moved = glider.translated(IntOffset::new(-17, 40));
        assert_ne!(glider, moved);
        assert_eq!(glider.normalized(), moved.normalized());
        assert_eq!(glider.normalized(), glider);
        let far = glider.translated(IntOffset::new(i64::MIN, i64::MIN));
        assert_eq!(far.normalized(), glider);
    }
}
