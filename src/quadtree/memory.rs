use super::{GenerationCache, NodeIdx, NodeKey, QuadTreeNode};
use super::node::Cell;

/// Arena of canonical nodes together with the canonicalization table.
///
/// Every node in the arena (leaves aside) has exactly one table entry.
/// Slots are reused through a free list once a reclamation pass proves
/// them unreachable, so a `NodeIdx` stays valid only while something the
/// pass treats as a root (a table entry or a live root) keeps it alive.
pub(super) struct MemoryManager {
    nodes: Vec<QuadTreeNode>,
    free: Vec<NodeIdx>,
    canonical: GenerationCache<NodeKey, NodeIdx>,
}

impl MemoryManager {
    pub(super) fn new() -> Self {
        Self {
            nodes: vec![
                QuadTreeNode::leaf(Cell::Dead),
                QuadTreeNode::leaf(Cell::Alive),
            ],
            free: vec![],
            canonical: GenerationCache::new(),
        }
    }

    /// Get a const reference to the node at the given index.
    ///
    /// # Panics
    ///
    /// Panics if the node was freed, even if its slot has been reused since.
    #[inline]
    pub(super) fn get(&self, idx: NodeIdx) -> &QuadTreeNode {
        let n = &self.nodes[idx.index()];
        assert!(
            n.is_used && n.generation == idx.generation,
            "access to a freed node {idx:?}"
        );
        n
    }

    /// Find a node with the given parts in the canonicalization table.
    /// If the node is not found, it is created and registered.
    ///
    /// # Panics
    ///
    /// Panics if the parts have different levels.
    pub(super) fn find_or_create_node(
        &mut self,
        nw: NodeIdx,
        ne: NodeIdx,
        sw: NodeIdx,
        se: NodeIdx,
        now: u64,
    ) -> NodeIdx {
        let level = self.get(nw).level;
        assert!(
            [ne, sw, se].iter().all(|&x| self.get(x).level == level),
            "parts of a node must have equal levels"
        );
        let key = NodeKey {
            level: level + 1,
            nw,
            ne,
            sw,
            se,
        };
        if let Some(idx) = self.canonical.get(&key, now) {
            return idx;
        }

        let population = [nw, ne, sw, se]
            .iter()
            .fold(0u64, |acc, &x| acc.saturating_add(self.get(x).population));
        let idx = self.allocate(QuadTreeNode {
            nw,
            ne,
            sw,
            se,
            level: level + 1,
            population,
            generation: 0,
            is_used: true,
            gc_marked: false,
        });
        self.canonical.insert(key, idx, now);
        idx
    }

    fn allocate(&mut self, mut node: QuadTreeNode) -> NodeIdx {
        if let Some(idx) = self.free.pop() {
            node.generation = idx.generation;
            self.nodes[idx.index()] = node;
            return idx;
        }
        let index = self
            .nodes
            .len()
            .try_into()
            .expect("Ran out of u32 indices");
        self.nodes.push(node);
        NodeIdx::new(index, 0)
    }

    /// Drops table entries that were not used during the last `window`
    /// generations and frees the nodes reachable neither from the remaining
    /// entries nor from `roots`. Evicted nodes that are still reachable get
    /// their entry back, stamped with `now`, so a structure never ends up
    /// with two nodes.
    ///
    /// `roots` is only consumed when something was evicted.
    /// Returns the number of entries dropped for good and of freed slots.
    pub(super) fn prune(
        &mut self,
        now: u64,
        window: u64,
        roots: impl IntoIterator<Item = NodeIdx>,
    ) -> (usize, usize) {
        let stale = self.canonical.evict(now, window);
        if stale.is_empty() {
            return (0, 0);
        }

        let freed = self.collect_garbage(roots);
        let mut evicted = 0;
        for (key, idx) in stale {
            if self.nodes[idx.index()].is_used {
                self.canonical.insert(key, idx, now);
            } else {
                evicted += 1;
            }
        }
        (evicted, freed)
    }

    /// Frees every slot that is reachable neither from the canonicalization
    /// table nor from `roots`. Returns the number of freed slots.
    fn collect_garbage(&mut self, roots: impl IntoIterator<Item = NodeIdx>) -> usize {
        let mut stack: Vec<NodeIdx> = self.canonical.iter().map(|(_, v)| v).collect();
        stack.extend(roots);
        stack.extend([NodeIdx::DEAD, NodeIdx::ALIVE]);

        while let Some(idx) = stack.pop() {
            let n = &mut self.nodes[idx.index()];
            if n.gc_marked {
                continue;
            }
            n.gc_marked = true;
            if !n.is_leaf() {
                stack.extend(n.parts());
            }
        }

        let mut freed = 0;
        for (i, n) in self.nodes.iter_mut().enumerate() {
            if n.gc_marked {
                n.gc_marked = false;
            } else if n.is_used {
                n.is_used = false;
                n.generation = n.generation.wrapping_add(1);
                self.free.push(NodeIdx::new(i as u32, n.generation));
                freed += 1;
            }
        }
        freed
    }

    /// Forget every node except the two leaves.
    pub(super) fn clear(&mut self) {
        self.nodes.truncate(2);
        self.free.clear();
        self.canonical.clear();
    }

    /// Number of occupied slots, leaves included.
    pub(super) fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub(super) fn canonical_len(&self) -> usize {
        self.canonical.len()
    }

    pub(super) fn canonical_hits(&self) -> u64 {
        self.canonical.hits()
    }

    pub(super) fn canonical_misses(&self) -> u64 {
        self.canonical.misses()
    }

    pub(super) fn bytes_total(&self) -> usize {
        self.nodes.capacity() * std::mem::size_of::<QuadTreeNode>()
            + self.free.capacity() * std::mem::size_of::<NodeIdx>()
            + self.canonical.bytes_total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_or_create_is_canonical() {
        let mut mem = MemoryManager::new();
        let (d, a) = (NodeIdx::DEAD, NodeIdx::ALIVE);
        let x = mem.find_or_create_node(a, d, d, a, 0);
        let y = mem.find_or_create_node(a, d, d, a, 0);
        let z = mem.find_or_create_node(d, a, a, d, 0);
        assert_eq!(x, y);
        assert_ne!(x, z);
        assert_eq!(mem.get(x).population, 2);
        assert_eq!(mem.get(x).level, 1);
        assert_eq!(mem.canonical_len(), 2);
    }

    #[test]
    fn test_prune_keeps_reachable_nodes() {
        let mut mem = MemoryManager::new();
        let (d, a) = (NodeIdx::DEAD, NodeIdx::ALIVE);
        let x = mem.find_or_create_node(a, d, d, d, 0);
        let y = mem.find_or_create_node(d, a, d, d, 0);
        let parent = mem.find_or_create_node(x, y, x, y, 0);
        assert_eq!(mem.len(), 5);

        // every entry is stale, but `parent` is a live root
        assert_eq!(mem.prune(1000, 10, [parent]), (0, 0));
        assert_eq!(mem.get(parent).population, 4);
        assert_eq!(mem.canonical_len(), 3);
        // the entries were refreshed and still resolve to the same nodes
        assert_eq!(mem.find_or_create_node(a, d, d, d, 1000), x);
        assert_eq!(mem.find_or_create_node(x, y, x, y, 1000), parent);

        assert_eq!(mem.prune(2000, 10, []), (3, 3));
        assert_eq!(mem.len(), 2);
        assert_eq!(mem.canonical_len(), 0);

        // freed slots get reused
        let z = mem.find_or_create_node(a, a, a, a, 2000);
        assert!(z.index() < 5);
        assert_eq!(mem.len(), 3);
    }

    #[test]
    fn test_fresh_entries_skip_collection() {
        let mut mem = MemoryManager::new();
        let a = NodeIdx::ALIVE;
        mem.find_or_create_node(a, a, a, a, 0);
        // roots must not be walked when nothing is stale
        let roots = std::iter::from_fn(|| -> Option<NodeIdx> { panic!("roots consumed") });
        assert_eq!(mem.prune(5, 10, roots), (0, 0));
    }

    #[test]
    #[should_panic(expected = "freed node")]
    fn test_reused_slot_rejects_old_handle() {
        let mut mem = MemoryManager::new();
        let (d, a) = (NodeIdx::DEAD, NodeIdx::ALIVE);
        let old = mem.find_or_create_node(a, d, d, d, 0);
        mem.prune(100, 10, []);
        let new = mem.find_or_create_node(d, d, d, a, 100);
        assert_eq!(new.index(), old.index());
        mem.get(old);
    }

    #[test]
    #[should_panic(expected = "equal levels")]
    fn test_mismatched_levels() {
        let mut mem = MemoryManager::new();
        let d = NodeIdx::DEAD;
        let x = mem.find_or_create_node(d, d, d, d, 0);
        mem.find_or_create_node(x, d, d, d, 0);
    }
}
