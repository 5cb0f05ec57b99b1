use crate::{GenerationStream, SparseCellSet};
use anyhow::Result;

/// Engine advancing Conway's Game of Life on an unbounded grid.
///
/// An engine holds one genealogy at a time and may keep caches that outlive
/// it, so reusing one instance for unrelated patterns is both allowed and
/// cheaper than building a new one. Calls must be serialized: every mutating
/// method takes `&mut self`.
pub trait LifeAlgorithm: Send {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Replaces the current genealogy with `cells`.
    fn load_cells(&mut self, cells: &SparseCellSet);

    /// Returns the alive cells of the current generation.
    fn current_cells(&self) -> SparseCellSet;

    /// Advances the current genealogy by exactly `step` generations.
    ///
    /// `step == 0` leaves the cells untouched but still runs cache maintenance.
    fn update(&mut self, step: u64);

    /// Advances `cells` by exactly `step` generations and returns the result.
    ///
    /// This call is blocking and CPU-bound; run it off any latency-sensitive thread.
    fn compute_generation_with_step(&mut self, cells: &SparseCellSet, step: u64) -> SparseCellSet {
        self.load_cells(cells);
        self.update(step);
        self.current_cells()
    }

    /// Moves the engine onto a background worker and returns the lazy sequence
    /// of states, each `step` generations after the previous one. The first
    /// element is `step` generations after `initial`.
    ///
    /// The worker computes at most one generation ahead of the consumer.
    /// Dropping the stream stops production.
    ///
    /// # Errors
    ///
    /// Returns an error if the background runtime cannot be started.
    fn compute_generations_with_step(
        self,
        initial: SparseCellSet,
        step: u64,
    ) -> Result<GenerationStream>
    where
        Self: Sized + 'static,
    {
        GenerationStream::spawn(Box::new(self), initial, step)
    }

    /// Drops every cache entry.
    ///
    /// The default implementation does nothing. Engines should override this if they
    /// implement caching mechanisms.
    fn run_gc(&mut self) {}

    /// Returns the approximate heap memory usage of the engine in bytes.
    fn bytes_total(&self) -> usize;
}
