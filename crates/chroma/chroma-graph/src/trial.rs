//! The randomized coloring heuristic.
//!
//! Pure and stateless from the protocol's point of view: every call colors
//! the whole graph uniformly at random with 3 labels and reports the edges
//! whose endpoints collided. The generator decides what to do with the
//! result; nothing here touches shared memory.

use crate::edge::{Edge, Graph};
use crate::solution::Solution;
use rand::Rng;

const COLORS: u8 = 3;

/// Assigns every vertex an independent uniformly-random label.
pub fn randomize_colors<R: Rng>(rng: &mut R, vertex_count: usize, colors: &mut Vec<u8>) {
    colors.clear();
    colors.extend((0..vertex_count).map(|_| rng.gen_range(0..COLORS)));
}

/// Collects every edge whose endpoints share a label under `colors`.
pub fn conflicting_edges(graph: &Graph, colors: &[u8]) -> Vec<Edge> {
    graph
        .edges
        .iter()
        .copied()
        .filter(|e| colors[e.a as usize] == colors[e.b as usize])
        .collect()
}

/// Runs one full trial: random coloring, conflict scan, record packing.
///
/// Returns `None` when the conflict set is too large to represent; the
/// caller skips publication for that iteration.
pub fn color_trial<R: Rng>(graph: &Graph, rng: &mut R) -> Option<Solution> {
    let mut colors = Vec::with_capacity(graph.vertex_count);
    randomize_colors(rng, graph.vertex_count, &mut colors);
    let conflicts = conflicting_edges(graph, &colors);
    Solution::from_conflicts(&conflicts)
}
