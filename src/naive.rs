use crate::{IntOffset, LifeAlgorithm, SparseCellSet};
use ahash::AHashMap as HashMap;

/// Brute-force engine: every generation counts the neighbours of every cell
/// adjacent to a live one.
///
/// Its cost is proportional to population times generations, which makes it
/// the reference the quadtree engine is checked against and a predictable
/// choice for small, chaotic patterns.
#[derive(Clone, Debug, Default)]
pub struct NaiveEngine {
    cells: SparseCellSet,
}

impl NaiveEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// One generation of B3/S23.
    pub fn next_generation(cells: &SparseCellSet) -> SparseCellSet {
        let mut counts: HashMap<IntOffset, u8> = HashMap::with_capacity(cells.population() * 9);
        for c in cells.iter() {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    *counts.entry(c + IntOffset::new(dx, dy)).or_insert(0) += 1;
                }
            }
        }
        counts
            .into_iter()
            .filter(|&(c, n)| n == 3 || (n == 2 && cells.contains(c)))
            .map(|(c, _)| c)
            .collect()
    }
}

impl LifeAlgorithm for NaiveEngine {
    fn name(&self) -> &'static str {
        "naive"
    }

    fn load_cells(&mut self, cells: &SparseCellSet) {
        self.cells = cells.clone();
    }

    fn current_cells(&self) -> SparseCellSet {
        self.cells.clone()
    }

    fn update(&mut self, step: u64) {
        for _ in 0..step {
            if self.cells.is_empty() {
                break;
            }
            self.cells = Self::next_generation(&self.cells);
        }
    }

    fn bytes_total(&self) -> usize {
        self.cells.population() * std::mem::size_of::<IntOffset>()
    }
}
