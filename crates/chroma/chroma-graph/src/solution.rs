use crate::edge::Edge;

/// Most conflict edges a single published record can carry.
///
/// Trials with more conflicts are discarded by the generator rather than
/// truncated, so a record's count is always the true count.
pub const MAX_SOLUTION_EDGES: usize = 12;

/// One candidate solution: the set of edges whose endpoints collided under
/// a trial coloring. Removing these edges would make the graph 3-colorable,
/// so fewer is better and zero proves 3-colorability.
///
/// `repr(C)` + `Copy`: records are copied bitwise into shared-memory slots.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct Solution {
    len: u32,
    edges: [Edge; MAX_SOLUTION_EDGES],
}

impl Solution {
    /// Packs a conflict list into a record, or `None` when it does not fit.
    pub fn from_conflicts(conflicts: &[Edge]) -> Option<Self> {
        if conflicts.len() > MAX_SOLUTION_EDGES {
            return None;
        }
        let mut edges = [Edge::default(); MAX_SOLUTION_EDGES];
        edges[..conflicts.len()].copy_from_slice(conflicts);
        Some(Solution {
            len: conflicts.len() as u32,
            edges,
        })
    }

    #[inline]
    pub fn conflict_count(&self) -> u32 {
        self.len
    }

    /// The live prefix of the edge array.
    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges[..self.len as usize]
    }

    /// A zero-conflict record proves the graph is 3-colorable.
    #[inline]
    pub fn is_perfect(&self) -> bool {
        self.len == 0
    }
}
