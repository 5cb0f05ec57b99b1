use super::{MemoryManager, NodeIdx};

/// One canonical empty node per level, built lazily from the one below.
pub(super) struct BlankNodes {
    data: Vec<NodeIdx>,
}

impl BlankNodes {
    pub(super) fn new() -> Self {
        Self { data: vec![] }
    }

    pub(super) fn get(&mut self, level: u32, mem: &mut MemoryManager, now: u64) -> NodeIdx {
        let i = level as usize;
        let v = &mut self.data;
        while v.len() <= i {
            if let Some(&b) = v.last() {
                v.push(mem.find_or_create_node(b, b, b, b, now));
            } else {
                v.push(NodeIdx::DEAD);
            };
        }
        v[i]
    }

    pub(super) fn iter(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        self.data.iter().copied()
    }

    pub(super) fn clear(&mut self) {
        self.data.clear();
    }
}
