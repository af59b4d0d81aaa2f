// id.rs — Stable dense identifiers for IR operations and blocks
//
// Indices are assigned in graph (textual) order and stay fixed for the
// lifetime of a `Graph`. They are dense, so per-operation side tables are
// plain vectors addressed by `OpIndex::index()`.

use std::fmt;

/// Stable identifier for an operation within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpIndex(pub u32);

/// Stable identifier for a block within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockIndex(pub u32);

impl OpIndex {
    /// Position in dense per-operation tables.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl BlockIndex {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for OpIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for BlockIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        assert_eq!(OpIndex(7).to_string(), "#7");
        assert_eq!(BlockIndex(2).to_string(), "B2");
    }

    #[test]
    fn ordering_follows_allocation_order() {
        assert!(OpIndex(1) < OpIndex(2));
        assert_eq!(OpIndex(3).index(), 3);
    }
}
