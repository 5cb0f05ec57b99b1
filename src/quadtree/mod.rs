mod blank;
mod cache;
mod hashlife;
mod memory;
mod node;
mod state;

use blank::BlankNodes;
use cache::GenerationCache;
use memory::MemoryManager;
use node::{NodeKey, QuadTreeNode};

pub use hashlife::{EngineStatistics, HashLifeEngine};
pub use node::{Cell, CellNode, MacroCell, NodeIdx};
pub use state::HashLifeCellState;
