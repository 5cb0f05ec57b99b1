#[cfg(test)]
mod tests {
    use gol_hashlife::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Forwards to an inner engine and counts the generations it was asked for.
    struct CountingEngine {
        inner: HashLifeEngine,
        updates: Arc<AtomicU64>,
    }

    impl LifeAlgorithm for CountingEngine {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn load_cells(&mut self, cells: &SparseCellSet) {
            self.inner.load_cells(cells);
        }

        fn current_cells(&self) -> SparseCellSet {
            self.inner.current_cells()
        }

        fn update(&mut self, step: u64) {
            self.inner.update(step);
            self.updates.fetch_add(1, Ordering::SeqCst);
        }

        fn bytes_total(&self) -> usize {
            self.inner.bytes_total()
        }
    }

    struct PanickingEngine;

    impl LifeAlgorithm for PanickingEngine {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn load_cells(&mut self, _cells: &SparseCellSet) {}

        fn current_cells(&self) -> SparseCellSet {
            SparseCellSet::new()
        }

        fn update(&mut self, _step: u64) {
            panic!("update failed");
        }

        fn bytes_total(&self) -> usize {
            0
        }
    }

    fn counting_engine() -> (CountingEngine, Arc<AtomicU64>) {
        let updates = Arc::new(AtomicU64::new(0));
        let engine = CountingEngine {
            inner: HashLifeEngine::new(),
            updates: updates.clone(),
        };
        (engine, updates)
    }

    fn naive_sequence(initial: &SparseCellSet, step: u64, count: usize) -> Vec<SparseCellSet> {
        let mut engine = NaiveEngine::new();
        engine.load_cells(initial);
        (0..count)
            .map(|_| {
                engine.update(step);
                engine.current_cells()
            })
            .collect()
    }

    #[test]
    fn test_stream_matches_naive() {
        let soup = SparseCellSet::random(16, 16, Some(21));
        for step in [1, 3] {
            let stream = HashLifeEngine::new()
                .compute_generations_with_step(soup.clone(), step)
                .unwrap();
            let produced: Vec<_> = stream.take(12).collect();
            assert_eq!(produced, naive_sequence(&soup, step, 12));
        }
    }

    #[test]
    fn test_zero_step_stream_repeats_initial() {
        let blinker: SparseCellSet = [(0, 0), (1, 0), (2, 0)].into_iter().collect();
        let stream = HashLifeEngine::new()
            .compute_generations_with_step(blinker.clone(), 0)
            .unwrap();
        for cells in stream.take(3) {
            assert_eq!(cells, blinker);
        }
    }

    #[test]
    fn test_backpressure() {
        let (engine, updates) = counting_engine();
        let mut stream = engine
            .compute_generations_with_step(SparseCellSet::random(8, 8, Some(2)), 1)
            .unwrap();

        for consumed in 1..=5u64 {
            assert!(stream.next().is_some());
            std::thread::sleep(Duration::from_millis(50));
            assert!(updates.load(Ordering::SeqCst) <= consumed + 1);
        }
    }

    #[test]
    fn test_drop_cancels() {
        let (engine, updates) = counting_engine();
        let mut stream = engine
            .compute_generations_with_step(SparseCellSet::random(8, 8, Some(3)), 1)
            .unwrap();
        stream.next();
        stream.next();
        drop(stream);

        std::thread::sleep(Duration::from_millis(100));
        let after_drop = updates.load(Ordering::SeqCst);
        assert!(after_drop <= 3);
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(updates.load(Ordering::SeqCst), after_drop);
    }

    #[test]
    fn test_into_algorithm_returns_warm_engine() {
        let glider: SparseCellSet = [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)]
            .into_iter()
            .collect();
        let mut stream = HashLifeEngine::new()
            .compute_generations_with_step(glider.clone(), 4)
            .unwrap();
        let last = stream.nth(2).unwrap();
        assert_eq!(last, glider.translated(IntOffset::new(3, 3)));

        let mut engine = stream.into_algorithm().unwrap();
        // the worker may have run one generation ahead
        let current = engine.current_cells();
        assert!(current == last || current == last.translated(IntOffset::new(1, 1)));
        assert_eq!(engine.compute_generation_with_step(&glider, 8), glider.translated(IntOffset::new(2, 2)));
    }

    #[test]
    fn test_worker_panic_ends_stream() {
        let mut stream = PanickingEngine
            .compute_generations_with_step(SparseCellSet::new(), 1)
            .unwrap();
        assert!(stream.next().is_none());
        assert!(stream.into_algorithm().is_err());
    }

    #[test]
    fn test_algorithm_switch_continuity() {
        let soup = SparseCellSet::random(12, 12, Some(8));
        let mut switch = AlgorithmSwitch::new(Box::new(HashLifeEngine::new()), soup.clone(), 2).unwrap();
        assert_eq!(switch.last_emitted(), &soup);

        let mut produced: Vec<_> = switch.by_ref().take(4).collect();
        switch.switch_algorithm(Box::new(NaiveEngine::new())).unwrap();
        produced.extend(switch.by_ref().take(4));
        switch.switch_algorithm(Box::new(HashLifeEngine::new())).unwrap();
        produced.extend(switch.by_ref().take(4));

        assert_eq!(switch.last_emitted(), &produced[11]);
        assert_eq!(produced, naive_sequence(&soup, 2, 12));
    }
}
