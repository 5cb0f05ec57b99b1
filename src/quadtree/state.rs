use super::{HashLifeEngine, MemoryManager, NodeIdx};
use crate::{IntOffset, SparseCellSet};

/// Largest root built from a cell set; relative coordinates fit in `u64`.
const MAX_LEVEL: u32 = 62;

/// Quadtree form of an unbounded sparse bitmap: a canonical root node of side
/// `2^level` whose north-west corner lies at `offset`.
///
/// The offset is kept in `i128`: the blank frame added around a pattern may
/// reach past the `i64` range even when every alive cell lies inside it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashLifeCellState {
    pub(super) offset: (i128, i128),
    pub(super) root: NodeIdx,
}

impl HashLifeCellState {
    /// Grid coordinate `(x, y)` of the root's north-west corner.
    pub fn offset(&self) -> (i128, i128) {
        self.offset
    }

    pub fn root(&self) -> NodeIdx {
        self.root
    }
}

/// Position on the Z-order curve, see https://en.wikipedia.org/wiki/Z-order_curve.
/// Sorting by it makes every quadrant of every level a contiguous range.
fn morton(x: u64, y: u64) -> u128 {
    let mut key = 0u128;
    for i in (0..64).rev() {
        key = (key << 2) | ((((y >> i) & 1) << 1) | ((x >> i) & 1)) as u128;
    }
    key
}

impl HashLifeEngine {
    /// Converts `cells` into a quadtree: the bounding box is padded to a
    /// centered power-of-two square.
    ///
    /// # Panics
    ///
    /// Panics if the bounding box is wider than `2^62`.
    pub(super) fn build_state(&mut self, cells: &SparseCellSet) -> HashLifeCellState {
        let Some(bbox) = cells.bounding_box() else {
            return HashLifeCellState {
                offset: (0, 0),
                root: self.blank(self.config.root_level()),
            };
        };

        let side = bbox.width().max(bbox.height());
        let level = side.next_power_of_two().trailing_zeros().max(1);
        assert!(
            level <= MAX_LEVEL,
            "pattern spans {side} cells, at most 2^{MAX_LEVEL} are supported"
        );
        let size = 1u64 << level;
        let offset = (
            bbox.min.x as i128 - ((size - bbox.width()) / 2) as i128,
            bbox.min.y as i128 - ((size - bbox.height()) / 2) as i128,
        );

        let mut points: Vec<(u64, u64)> = cells
            .iter()
            .map(|c| {
                (
                    (c.x as i128 - offset.0) as u64,
                    (c.y as i128 - offset.1) as u64,
                )
            })
            .collect();
        points.sort_unstable_by_key(|&(x, y)| morton(x, y));
        let root = self.build_node(&points, level);
        HashLifeCellState { offset, root }
    }

    /// `points` are sorted in Z-order and lie inside the node.
    fn build_node(&mut self, points: &[(u64, u64)], level: u32) -> NodeIdx {
        if points.is_empty() {
            return self.blank(level);
        }
        if level == 0 {
            return NodeIdx::ALIVE;
        }

        let bit = level - 1;
        let quadrant = |&(x, y): &(u64, u64)| (((y >> bit) & 1) << 1) | ((x >> bit) & 1);
        let mut parts = [NodeIdx::DEAD; 4];
        let mut rest = points;
        for (q, part) in parts.iter_mut().enumerate() {
            let split = rest.partition_point(|p| quadrant(p) == q as u64);
            let (head, tail) = rest.split_at(split);
            *part = self.build_node(head, level - 1);
            rest = tail;
        }
        debug_assert!(rest.is_empty());
        let [nw, ne, sw, se] = parts;
        self.find_or_create_node(nw, ne, sw, se)
    }

    /// Lists the alive cells of `state`, skipping empty subtrees.
    ///
    /// # Panics
    ///
    /// Panics if an alive cell has left the `i64` coordinate range.
    pub(super) fn collect_cells(&self, state: &HashLifeCellState) -> SparseCellSet {
        fn inner(mem: &MemoryManager, idx: NodeIdx, origin: (i128, i128), out: &mut SparseCellSet) {
            let n = mem.get(idx);
            if n.population == 0 {
                return;
            }
            if n.is_leaf() {
                let (Ok(x), Ok(y)) = (i64::try_from(origin.0), i64::try_from(origin.1)) else {
                    panic!(
                        "alive cell at ({}, {}) is outside the i64 coordinate range",
                        origin.0, origin.1
                    );
                };
                out.insert(IntOffset::new(x, y));
                return;
            }
            let half = 1i128 << (n.level - 1);
            let corners = [(0, 0), (half, 0), (0, half), (half, half)];
            for (part, (dx, dy)) in n.parts().into_iter().zip(corners) {
                inner(mem, part, (origin.0 + dx, origin.1 + dy), out);
            }
        }

        let mut out = SparseCellSet::with_capacity(self.mem.get(state.root).population as usize);
        inner(&self.mem, state.root, state.offset, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LifeAlgorithm;

    #[test]
    fn test_morton_groups_quadrants() {
        let mut points = vec![(3, 3), (0, 0), (2, 1), (1, 2), (3, 0), (0, 3)];
        points.sort_unstable_by_key(|&(x, y)| morton(x, y));
        assert_eq!(points, vec![(0, 0), (3, 0), (2, 1), (1, 2), (0, 3), (3, 3)]);
    }

    #[test]
    fn test_state_is_centered_square() {
        let mut engine = HashLifeEngine::new();
        let cells: SparseCellSet = [(10, 10), (12, 10), (10, 14)].into_iter().collect();
        let state = engine.build_state(&cells);
        // bounding box is 3x5, padded to 8x8
        assert_eq!(engine.node_level(state.root()), 3);
        assert_eq!(state.offset(), (8, 9));
        assert_eq!(engine.collect_cells(&state), cells);
    }

    #[test]
    fn test_state_at_coordinate_limits() {
        let mut engine = HashLifeEngine::new();
        let corners: SparseCellSet = [(i64::MIN, i64::MIN), (i64::MIN + 1, i64::MIN)]
            .into_iter()
            .collect();
        let state = engine.build_state(&corners);
        assert_eq!(state.offset(), (i64::MIN as i128, i64::MIN as i128));
        assert_eq!(engine.collect_cells(&state), corners);
    }

    #[test]
    fn test_single_cell_state() {
        let mut engine = HashLifeEngine::new();
        let cells: SparseCellSet = [(-7, 3)].into_iter().collect();
        engine.load_cells(&cells);
        assert_eq!(engine.node_level(engine.state().root()), 1);
        assert_eq!(engine.current_cells(), cells);
    }
}
