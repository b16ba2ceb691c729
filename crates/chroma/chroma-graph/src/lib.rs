pub mod edge;
pub mod solution;
pub mod trial;

pub use edge::{Edge, EdgeParseError, Graph};
pub use solution::{MAX_SOLUTION_EDGES, Solution};
pub use trial::color_trial;
