/// Number of trailing generations during which an unused cache entry survives.
pub const DEFAULT_EVICTION_WINDOW: u64 = 256;

/// Smallest root the engine steps: the safety check looks two levels down
/// from the root, and the doubling recursion needs at least level 2.
pub const MIN_ROOT_LEVEL: u32 = 3;

/// Tunables of a [`HashLifeEngine`](crate::HashLifeEngine).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Cache entries not accessed during this many most recent generations
    /// are evicted after every update.
    pub eviction_window: u64,
    /// Level the root is expanded to before the first step.
    /// Values below [`MIN_ROOT_LEVEL`] are raised to it.
    pub min_root_level: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            eviction_window: DEFAULT_EVICTION_WINDOW,
            min_root_level: MIN_ROOT_LEVEL,
        }
    }
}

impl EngineConfig {
    pub fn with_eviction_window(mut self, eviction_window: u64) -> Self {
        self.eviction_window = eviction_window;
        self
    }

    pub fn with_min_root_level(mut self, min_root_level: u32) -> Self {
        self.min_root_level = min_root_level;
        self
    }

    pub(crate) fn root_level(&self) -> u32 {
        self.min_root_level.max(MIN_ROOT_LEVEL)
    }
}
