use std::fmt;
use std::str::FromStr;

/// An undirected edge between two vertices.
///
/// Stored bytes travel through the shared-memory ring, so the layout is
/// fixed with `repr(C)` and the type is plain old data (`Copy`, no padding
/// surprises: two `u32` fields, 8 bytes, align 4).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Edge {
    pub a: u32,
    pub b: u32,
}

impl Edge {
    pub fn new(a: u32, b: u32) -> Self {
        Self { a, b }
    }

    /// Endpoint comparison that ignores orientation.
    pub fn same_endpoints(&self, other: &Edge) -> bool {
        (self.a == other.a && self.b == other.b) || (self.a == other.b && self.b == other.a)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.a, self.b)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EdgeParseError {
    #[error("edge '{0}' is not of the form A-B")]
    Malformed(String),

    #[error("vertex id '{0}' is not a non-negative integer")]
    BadVertex(String),

    #[error("empty edge list")]
    Empty,
}

impl FromStr for Edge {
    type Err = EdgeParseError;

    /// Parses the textual `A-B` form, e.g. `0-1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = s
            .split_once('-')
            .ok_or_else(|| EdgeParseError::Malformed(s.to_string()))?;
        let a = a
            .parse::<u32>()
            .map_err(|_| EdgeParseError::BadVertex(a.to_string()))?;
        let b = b
            .parse::<u32>()
            .map_err(|_| EdgeParseError::BadVertex(b.to_string()))?;
        Ok(Edge { a, b })
    }
}

/// The fixed input graph, shared by every generator iteration.
///
/// `vertex_count` is derived from the largest vertex id seen, so vertex ids
/// are expected to be dense starting at 0 (isolated trailing vertices can
/// never conflict and would only widen the color array).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    pub edges: Vec<Edge>,
    pub vertex_count: usize,
}

impl Graph {
    /// Builds a graph from textual edge specs, typically `argv[1..]`.
    pub fn from_edge_specs<I, S>(specs: I) -> Result<Self, EdgeParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut edges = Vec::new();
        let mut max_vertex = 0u32;
        for spec in specs {
            let edge: Edge = spec.as_ref().parse()?;
            max_vertex = max_vertex.max(edge.a).max(edge.b);
            edges.push(edge);
        }
        if edges.is_empty() {
            return Err(EdgeParseError::Empty);
        }
        Ok(Graph {
            edges,
            vertex_count: max_vertex as usize + 1,
        })
    }
}
