#![warn(clippy::all)]

mod cells;
mod config;
mod naive;
mod pattern;
mod quadtree;
mod stream;
mod traits;

pub use cells::{BoundingBox, IntOffset, SparseCellSet};
pub use config::{EngineConfig, DEFAULT_EVICTION_WINDOW, MIN_ROOT_LEVEL};
pub use naive::NaiveEngine;
pub use pattern::PatternFormat;
pub use quadtree::{Cell, CellNode, EngineStatistics, HashLifeCellState, HashLifeEngine, MacroCell, NodeIdx};
pub use stream::{AlgorithmSwitch, GenerationStream};
pub use traits::LifeAlgorithm;

pub type DefaultEngine = HashLifeEngine;

pub const VERSION: &str = "0.1.0";
