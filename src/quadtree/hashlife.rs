use super::{BlankNodes, GenerationCache, HashLifeCellState, MacroCell, MemoryManager, NodeIdx};
use super::node::Cell;
use crate::{EngineConfig, LifeAlgorithm, SparseCellSet};
use std::fmt;
use tracing::{debug, trace};

/// Implementation of [HashLife algorithm](https://conwaylife.com/wiki/HashLife)
/// advancing the pattern one generation per recursion.
///
/// Nodes are hash-consed: every region is stored once and identified by a
/// [`NodeIdx`]. The next generation of every node is memoized, so regions that
/// repeat in space or in time are computed once.
///
/// Both tables record the generation counter at each access and forget
/// entries that stay unused for [`EngineConfig::eviction_window`] generations.
///
/// The engine is a single-producer object: every operation takes `&mut self`.
pub struct HashLifeEngine {
    pub(super) mem: MemoryManager,
    /// memoized next generation of canonical nodes of level >= 2
    results: GenerationCache<NodeIdx, NodeIdx>,
    pub(super) blank_nodes: BlankNodes,
    pub(super) state: HashLifeCellState,
    pub(super) computed_generations: u64,
    pub(super) config: EngineConfig,
}

/// Snapshot of the engine's cache counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStatistics {
    /// entries of the canonicalization table
    pub canonical_nodes: usize,
    /// entries of the next-generation table
    pub cached_results: usize,
    /// occupied arena slots, including nodes evicted from the table but still referenced
    pub arena_nodes: usize,
    pub canonical_hits: u64,
    pub canonical_misses: u64,
    pub result_hits: u64,
    pub result_misses: u64,
    pub computed_generations: u64,
}

impl fmt::Display for EngineStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Computed generations: {}", self.computed_generations)?;
        writeln!(f, "Arena nodes: {}", self.arena_nodes)?;
        writeln!(
            f,
            "Canonical nodes: {} (hits {}, misses {})",
            self.canonical_nodes, self.canonical_hits, self.canonical_misses
        )?;
        writeln!(
            f,
            "Cached results: {} (hits {}, misses {})",
            self.cached_results, self.result_hits, self.result_misses
        )
    }
}

impl Default for HashLifeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HashLifeEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let mut mem = MemoryManager::new();
        let mut blank_nodes = BlankNodes::new();
        let root = blank_nodes.get(config.root_level(), &mut mem, 0);
        Self {
            mem,
            results: GenerationCache::new(),
            blank_nodes,
            state: HashLifeCellState {
                offset: (0, 0),
                root,
            },
            computed_generations: 0,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current genealogy in quadtree form.
    pub fn state(&self) -> &HashLifeCellState {
        &self.state
    }

    /// Number of alive cells of the current state.
    pub fn population(&self) -> u64 {
        self.mem.get(self.state.root).population
    }

    /// Generations advanced by this engine since its creation, over all genealogies.
    pub fn computed_generations(&self) -> u64 {
        self.computed_generations
    }

    pub fn node_level(&self, idx: NodeIdx) -> u32 {
        self.mem.get(idx).level
    }

    pub fn node_population(&self, idx: NodeIdx) -> u64 {
        self.mem.get(idx).population
    }

    pub fn statistics(&self) -> EngineStatistics {
        EngineStatistics {
            canonical_nodes: self.mem.canonical_len(),
            cached_results: self.results.len(),
            arena_nodes: self.mem.len(),
            canonical_hits: self.mem.canonical_hits(),
            canonical_misses: self.mem.canonical_misses(),
            result_hits: self.results.hits(),
            result_misses: self.results.misses(),
            computed_generations: self.computed_generations,
        }
    }

    pub(super) fn blank(&mut self, level: u32) -> NodeIdx {
        self.blank_nodes
            .get(level, &mut self.mem, self.computed_generations)
    }

    pub(super) fn find_or_create_node(
        &mut self,
        nw: NodeIdx,
        ne: NodeIdx,
        sw: NodeIdx,
        se: NodeIdx,
    ) -> NodeIdx {
        self.mem
            .find_or_create_node(nw, ne, sw, se, self.computed_generations)
    }

    /// Returns the unique canonical node structurally equal to `cell`.
    ///
    /// Children are interned before their parent, so the table is only ever
    /// probed with keys made of canonical handles. Empty regions of any level
    /// map to one shared node per level.
    ///
    /// Handles stay valid until the next pruning pass ([`Self::prune_caches`],
    /// [`LifeAlgorithm::update`], [`LifeAlgorithm::load_cells`]).
    pub fn canonicalize(&mut self, cell: &MacroCell) -> NodeIdx {
        match cell {
            MacroCell::Cell(Cell::Dead) => NodeIdx::DEAD,
            MacroCell::Cell(Cell::Alive) => NodeIdx::ALIVE,
            MacroCell::Node(node) => {
                if node.size() == 0 {
                    return self.blank(node.level());
                }
                let [nw, ne, sw, se] = node.parts().map(|x| self.canonicalize(x));
                self.find_or_create_node(nw, ne, sw, se)
            }
        }
    }

    /// Rebuilds an owned tree from a canonical node.
    pub fn to_macro_cell(&self, idx: NodeIdx) -> MacroCell {
        let n = self.mem.get(idx);
        if n.is_leaf() {
            return MacroCell::Cell(Cell::from(idx == NodeIdx::ALIVE));
        }
        let [nw, ne, sw, se] = n.parts().map(|x| self.to_macro_cell(x));
        MacroCell::node(nw, ne, sw, se)
    }

    fn update_row(row_prev: u8, row_curr: u8, row_next: u8) -> u8 {
        let b = row_prev;
        let a = b << 1;
        let c = b >> 1;
        let i = row_curr;
        let h = i << 1;
        let d = i >> 1;
        let f = row_next;
        let g = f << 1;
        let e = f >> 1;

        let ab0 = a ^ b;
        let ab1 = a & b;
        let cd0 = c ^ d;
        let cd1 = c & d;

        let ef0 = e ^ f;
        let ef1 = e & f;
        let gh0 = g ^ h;
        let gh1 = g & h;

        let ad0 = ab0 ^ cd0;
        let ad1 = (ab1 ^ cd1) ^ (ab0 & cd0);
        let ad2 = ab1 & cd1;

        let eh0 = ef0 ^ gh0;
        let eh1 = (ef1 ^ gh1) ^ (ef0 & gh0);
        let eh2 = ef1 & gh1;

        let ah0 = ad0 ^ eh0;
        let xx = ad0 & eh0;
        let yy = ad1 ^ eh1;
        let ah1 = xx ^ yy;
        let ah23 = (ad2 | eh2) | (ad1 & eh1) | (xx & yy);
        let z = !ah23 & ah1;
        let i2 = !ah0 & z;
        let i3 = ah0 & z;
        (i & i2) | i3
    }

    /// Base case: `node` is a 4x4 square of cells, the result is its 2x2 center
    /// one generation later.
    fn update_leaves(&mut self, node: NodeIdx) -> NodeIdx {
        let [nw, ne, sw, se] = self
            .mem
            .get(node)
            .parts()
            .map(|x| self.mem.get(x).parts().map(|y| (y == NodeIdx::ALIVE) as u8));

        // bit `i` of a row is the cell in column `i`
        let row = |w: [u8; 4], e: [u8; 4], top: bool| {
            let (l, r) = if top { (0, 1) } else { (2, 3) };
            w[l] | (w[r] << 1) | (e[l] << 2) | (e[r] << 3)
        };
        let rows = [
            row(nw, ne, true),
            row(nw, ne, false),
            row(sw, se, true),
            row(sw, se, false),
        ];
        let upper = Self::update_row(rows[0], rows[1], rows[2]);
        let lower = Self::update_row(rows[1], rows[2], rows[3]);

        let leaf = |row: u8, column: u32| {
            if row >> column & 1 == 1 {
                NodeIdx::ALIVE
            } else {
                NodeIdx::DEAD
            }
        };
        self.find_or_create_node(
            leaf(upper, 1),
            leaf(upper, 2),
            leaf(lower, 1),
            leaf(lower, 2),
        )
    }

    /// Node of the same level as the parts, centered on the junction of the
    /// four of them.
    fn centered_of_four(
        &mut self,
        nw: NodeIdx,
        ne: NodeIdx,
        sw: NodeIdx,
        se: NodeIdx,
    ) -> NodeIdx {
        let [nw, ne, sw, se] = [nw, ne, sw, se].map(|x| self.mem.get(x).parts());
        self.find_or_create_node(nw[3], ne[2], sw[1], se[0])
    }

    /// Half-sized node centered on `idx`.
    pub(super) fn centered(&mut self, idx: NodeIdx) -> NodeIdx {
        let [nw, ne, sw, se] = self.mem.get(idx).parts();
        self.centered_of_four(nw, ne, sw, se)
    }

    /// Nine disjoint nodes of level `L - 2` tiling the center of `node`:
    /// each one is centered in one of the nine overlapping level `L - 1`
    /// squares of the 3x3 grid spanned by the grandchildren.
    fn nine_children_disjoint(&mut self, node: NodeIdx) -> [NodeIdx; 9] {
        let [[nwnw, nwne, nwsw, nwse], [nenw, nene, nesw, nese], [swnw, swne, swsw, swse], [senw, sene, sesw, sese]] =
            self.mem.get(node).parts().map(|x| self.mem.get(x).parts());

        [
            [nwnw, nwne, nwsw, nwse],
            [nwne, nenw, nwse, nesw],
            [nenw, nene, nesw, nese],
            [nwsw, nwse, swnw, swne],
            [nwse, nesw, swne, senw],
            [nesw, nese, senw, sene],
            [swnw, swne, swsw, swse],
            [swne, senw, swse, sesw],
            [senw, sene, sesw, sese],
        ]
        .map(|[nw, ne, sw, se]| self.centered_of_four(nw, ne, sw, se))
    }

    fn four_children_overlapping(&mut self, arr: &[NodeIdx; 9]) -> [NodeIdx; 4] {
        [
            self.find_or_create_node(arr[0], arr[1], arr[3], arr[4]),
            self.find_or_create_node(arr[1], arr[2], arr[4], arr[5]),
            self.find_or_create_node(arr[3], arr[4], arr[6], arr[7]),
            self.find_or_create_node(arr[4], arr[5], arr[7], arr[8]),
        ]
    }

    /// Recursive case: four overlapping level `L - 1` nodes are advanced one
    /// generation and their centers are assembled into the result.
    fn update_nodes(&mut self, node: NodeIdx) -> NodeIdx {
        let arr9 = self.nine_children_disjoint(node);
        let arr4 = self.four_children_overlapping(&arr9);
        let [nw, ne, sw, se] = arr4.map(|x| self.next_generation(x));
        self.find_or_create_node(nw, ne, sw, se)
    }

    /// Returns the center of `node` (one level smaller) one generation later.
    ///
    /// # Panics
    ///
    /// Panics if `node` has level below 2.
    pub fn next_generation(&mut self, node: NodeIdx) -> NodeIdx {
        let n = self.mem.get(node);
        let (level, population) = (n.level, n.population);
        assert!(
            level >= 2,
            "next generation is defined for nodes of level 2 or more, got level {level}"
        );
        if population == 0 {
            return self.blank(level - 1);
        }

        let now = self.computed_generations;
        if let Some(cached) = self.results.get(&node, now) {
            return cached;
        }
        let result = if level == 2 {
            self.update_leaves(node)
        } else {
            self.update_nodes(node)
        };
        self.results.insert(node, result, now);
        result
    }

    /// Twice bigger node with `idx` in the middle and a blank frame around it.
    fn with_frame(&mut self, idx: NodeIdx) -> NodeIdx {
        let n = self.mem.get(idx);
        let (level, [nw, ne, sw, se]) = (n.level, n.parts());
        let b = self.blank(level - 1);
        let nw = self.find_or_create_node(b, b, b, nw);
        let ne = self.find_or_create_node(b, b, ne, b);
        let sw = self.find_or_create_node(b, sw, b, b);
        let se = self.find_or_create_node(se, b, b, b);
        self.find_or_create_node(nw, ne, sw, se)
    }

    /// True while alive cells may leave the root within one step:
    /// everything must fit into the quarter-sized center.
    fn needs_expansion(&mut self) -> bool {
        let root = self.state.root;
        let n = self.mem.get(root);
        if n.level < self.config.root_level() {
            return true;
        }
        let population = n.population;
        let center = self.centered(root);
        let center = self.centered(center);
        self.mem.get(center).population != population
    }

    fn add_frame(&mut self) {
        let level = self.mem.get(self.state.root).level;
        self.state.root = self.with_frame(self.state.root);
        let shift = 1i128 << (level - 1);
        let (x, y) = self.state.offset;
        self.state.offset = (x - shift, y - shift);
        debug!(level = level + 1, "expanded root");
    }

    fn step_once(&mut self) {
        while self.needs_expansion() {
            self.add_frame();
        }
        let level = self.mem.get(self.state.root).level;
        let root = self.next_generation(self.state.root);
        let shift = 1i128 << (level - 2);
        let (x, y) = self.state.offset;
        self.state = HashLifeCellState {
            offset: (x + shift, y + shift),
            root,
        };
        self.computed_generations += 1;
        trace!(
            generation = self.computed_generations,
            population = self.population(),
            "advanced one generation"
        );
    }

    /// Evicts entries of both tables that were not accessed during the last
    /// [`EngineConfig::eviction_window`] generations, then frees the nodes
    /// nothing refers to anymore.
    ///
    /// Nodes still reachable from the current state, the next-generation
    /// table or the blank nodes keep their canonical entry, so sharing
    /// survives eviction.
    pub fn prune_caches(&mut self) {
        let (now, window) = (self.computed_generations, self.config.eviction_window);
        let results_evicted = self.results.prune(now, window);
        let roots = self
            .results
            .iter()
            .flat_map(|(k, v)| [k, v])
            .chain(self.blank_nodes.iter())
            .chain([self.state.root]);
        let (canonical_evicted, freed) = self.mem.prune(now, window, roots);
        if results_evicted != 0 || freed != 0 {
            debug!(
                results_evicted,
                canonical_evicted, freed, "pruned caches at generation {now}"
            );
        }
    }
}

impl LifeAlgorithm for HashLifeEngine {
    fn name(&self) -> &'static str {
        "hashlife"
    }

    fn load_cells(&mut self, cells: &SparseCellSet) {
        self.state = self.build_state(cells);
        debug!(
            population = self.population(),
            level = self.node_level(self.state.root),
            "loaded cells"
        );
        self.prune_caches();
    }

    fn current_cells(&self) -> SparseCellSet {
        self.collect_cells(&self.state)
    }

    fn update(&mut self, step: u64) {
        for _ in 0..step {
            self.step_once();
        }
        self.prune_caches();
    }

    fn run_gc(&mut self) {
        let cells = self.current_cells();
        self.mem.clear();
        self.results.clear();
        self.blank_nodes.clear();
        self.state = self.build_state(&cells);
    }

    fn bytes_total(&self) -> usize {
        self.mem.bytes_total() + self.results.bytes_total()
    }
}
