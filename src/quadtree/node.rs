/// Handle of a canonical node in the engine's arena.
///
/// Every handle is produced by the canonicalization table, so two handles
/// are equal iff they denote the same canonical node.
///
/// A handle also carries the generation of its slot, which is bumped every
/// time the slot is freed: using a handle whose node was reclaimed panics
/// instead of reading whatever occupies the slot now.
/// The default handle is the dead leaf.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdx {
    pub(super) index: u32,
    pub(super) generation: u32,
}

impl NodeIdx {
    /// Canonical dead leaf, always stored in the first slot.
    pub(super) const DEAD: NodeIdx = NodeIdx::new(0, 0);
    /// Canonical alive leaf, always stored in the second slot.
    pub(super) const ALIVE: NodeIdx = NodeIdx::new(1, 0);

    pub(super) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub(super) fn index(self) -> usize {
        self.index as usize
    }
}

/// State of a single cell: the only two leaves that ever exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    Dead,
    Alive,
}

impl Cell {
    pub fn is_alive(self) -> bool {
        self == Cell::Alive
    }
}

impl From<bool> for Cell {
    fn from(alive: bool) -> Self {
        if alive {
            Cell::Alive
        } else {
            Cell::Dead
        }
    }
}

/// A slot of the arena.
///
/// Leaves have `level == 0` and their parts point to themselves.
#[derive(Clone, Debug, Default)]
pub(super) struct QuadTreeNode {
    pub(super) nw: NodeIdx,
    pub(super) ne: NodeIdx,
    pub(super) sw: NodeIdx,
    pub(super) se: NodeIdx,
    /// side of the node is `2^level`
    pub(super) level: u32,
    /// number of alive leaves below the node
    pub(super) population: u64,
    /// incremented whenever the slot is freed
    pub(super) generation: u32,
    pub(super) is_used: bool,
    pub(super) gc_marked: bool,
}

impl QuadTreeNode {
    pub(super) fn leaf(cell: Cell) -> Self {
        let idx = match cell {
            Cell::Dead => NodeIdx::DEAD,
            Cell::Alive => NodeIdx::ALIVE,
        };
        Self {
            nw: idx,
            ne: idx,
            sw: idx,
            se: idx,
            level: 0,
            population: cell.is_alive() as u64,
            generation: 0,
            is_used: true,
            gc_marked: false,
        }
    }

    pub(super) fn parts(&self) -> [NodeIdx; 4] {
        [self.nw, self.ne, self.sw, self.se]
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.level == 0
    }
}

/// Key of the canonicalization table.
///
/// Children are compared by handle, never by content: they are canonical
/// already, so identity is structural equality one level down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(super) struct NodeKey {
    pub(super) level: u32,
    pub(super) nw: NodeIdx,
    pub(super) ne: NodeIdx,
    pub(super) sw: NodeIdx,
    pub(super) se: NodeIdx,
}

/// Owned quadtree that has not been canonicalized yet.
///
/// Useful for building regions by hand; it becomes a [`NodeIdx`] through
/// [`HashLifeEngine::canonicalize`](super::HashLifeEngine::canonicalize).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MacroCell {
    Cell(Cell),
    Node(Box<CellNode>),
}

/// Internal node of a [`MacroCell`] tree: four children of equal level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellNode {
    level: u32,
    size: u64,
    nw: MacroCell,
    ne: MacroCell,
    sw: MacroCell,
    se: MacroCell,
}

impl MacroCell {
    pub const ALIVE: MacroCell = MacroCell::Cell(Cell::Alive);
    pub const DEAD: MacroCell = MacroCell::Cell(Cell::Dead);

    /// # Panics
    ///
    /// Panics if the children have different levels.
    pub fn node(nw: MacroCell, ne: MacroCell, sw: MacroCell, se: MacroCell) -> Self {
        MacroCell::Node(Box::new(CellNode::new(nw, ne, sw, se)))
    }

    /// Builds a square of side `2^level` whose alive cells are given
    /// relative to its north-west corner. Cells outside the square are ignored.
    pub fn from_cells(level: u32, alive: &[(u64, u64)]) -> Self {
        if level == 0 {
            return MacroCell::Cell(Cell::from(alive.contains(&(0, 0))));
        }
        let half = 1u64 << (level - 1);
        let quadrant = |dx: u64, dy: u64| -> Vec<(u64, u64)> {
            alive
                .iter()
                .filter(|&&(x, y)| {
                    (dx..dx + half).contains(&x) && (dy..dy + half).contains(&y)
                })
                .map(|&(x, y)| (x - dx, y - dy))
                .collect()
        };
        Self::node(
            Self::from_cells(level - 1, &quadrant(0, 0)),
            Self::from_cells(level - 1, &quadrant(half, 0)),
            Self::from_cells(level - 1, &quadrant(0, half)),
            Self::from_cells(level - 1, &quadrant(half, half)),
        )
    }

    pub fn level(&self) -> u32 {
        match self {
            MacroCell::Cell(_) => 0,
            MacroCell::Node(n) => n.level,
        }
    }

    /// Number of alive cells in the region.
    pub fn size(&self) -> u64 {
        match self {
            MacroCell::Cell(c) => c.is_alive() as u64,
            MacroCell::Node(n) => n.size,
        }
    }
}

impl CellNode {
    /// # Panics
    ///
    /// Panics if the children have different levels.
    pub fn new(nw: MacroCell, ne: MacroCell, sw: MacroCell, se: MacroCell) -> Self {
        let level = nw.level();
        assert!(
            ne.level() == level && sw.level() == level && se.level() == level,
            "children of a node must have equal levels"
        );
        let size = [&nw, &ne, &sw, &se]
            .iter()
            .fold(0u64, |acc, c| acc.saturating_add(c.size()));
        Self {
            level: level + 1,
            size,
            nw,
            ne,
            sw,
            se,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn parts(&self) -> [&MacroCell; 4] {
        [&self.nw, &self.ne, &self.sw, &self.se]
    }
}
