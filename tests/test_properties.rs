#[cfg(test)]
mod tests {
    use gol_hashlife::*;
    use proptest::prelude::*;

    fn cell_sets() -> impl Strategy<Value = SparseCellSet> {
        proptest::collection::vec((-6i64..10, -4i64..12), 0..48)
            .prop_map(|coords| coords.into_iter().collect::<SparseCellSet>())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn hashlife_matches_naive(cells in cell_sets(), step in 0u64..40) {
            let mut hashlife = HashLifeEngine::new();
            let mut naive = NaiveEngine::new();
            prop_assert_eq!(
                hashlife.compute_generation_with_step(&cells, step),
                naive.compute_generation_with_step(&cells, step)
            );
        }

        #[test]
        fn steps_compose(cells in cell_sets(), a in 0u64..20, b in 0u64..20) {
            let mut engine = HashLifeEngine::new();
            let direct = engine.compute_generation_with_step(&cells, a + b);
            let first = engine.compute_generation_with_step(&cells, a);
            let composed = engine.compute_generation_with_step(&first, b);
            prop_assert_eq!(direct, composed);
        }

        #[test]
        fn zero_step_is_identity(cells in cell_sets()) {
            let mut engine = HashLifeEngine::new();
            prop_assert_eq!(engine.compute_generation_with_step(&cells, 0), cells);
        }

        #[test]
        fn eviction_does_not_change_results(
            cells in cell_sets(),
            window in 0u64..4,
            steps in proptest::collection::vec(0u64..6, 1..8),
        ) {
            let mut evicting = HashLifeEngine::with_config(EngineConfig::default().with_eviction_window(window));
            let mut keeping = HashLifeEngine::new();
            evicting.load_cells(&cells);
            keeping.load_cells(&cells);
            for step in steps {
                evicting.update(step);
                evicting.prune_caches();
                keeping.update(step);
                prop_assert_eq!(evicting.current_cells(), keeping.current_cells());
            }
        }

        #[test]
        fn translation_commutes_with_evolution(cells in cell_sets(), dx in -500i64..500, dy in -500i64..500, step in 0u64..12) {
            let delta = IntOffset::new(dx, dy);
            let mut engine = HashLifeEngine::new();
            let moved_first = engine.compute_generation_with_step(&cells.translated(delta), step);
            let evolved_first = engine.compute_generation_with_step(&cells, step).translated(delta);
            prop_assert_eq!(moved_first, evolved_first);
        }
    }
}
