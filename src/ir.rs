use crate::geometry::{Segment, Vector2};
use serde::{Deserialize, Serialize};

/// Id carried by synthetic points that do not correspond to a graph node.
pub const CUSTOM_POINT_ID: i64 = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: i64,
    pub name: String,
    pub position: Vector2,
}

impl Point {
    pub fn new(id: i64, name: impl Into<String>, position: Vector2) -> Self {
        Self {
            id,
            name: name.into(),
            position,
        }
    }

    pub fn custom(position: Vector2) -> Self {
        Self::new(CUSTOM_POINT_ID, "custom", position)
    }

    pub fn is_custom(&self) -> bool {
        self.id == CUSTOM_POINT_ID
    }
}

/// Directed connection between two nodes of a [`Graph`].
///
/// `from` and `to` index into [`Graph::nodes`]. `subdivision_points` is the
/// edge's own polyline: the first and last entries mirror the endpoint
/// positions and are never displaced, everything in between belongs to this
/// edge alone. `compatible_edges` holds indices into [`Graph::edges`].
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: i64,
    pub from: usize,
    pub to: usize,
    pub subdivision_points: Vec<Vector2>,
    pub compatible_edges: Vec<usize>,
}

impl Edge {
    /// Number of movable points between the endpoints.
    pub fn interior_count(&self) -> usize {
        self.subdivision_points.len().saturating_sub(2)
    }

    /// Polyline as points, synthetic interior points tagged with
    /// [`CUSTOM_POINT_ID`].
    pub fn subdivision_nodes<'a>(&'a self, nodes: &'a [Point]) -> impl Iterator<Item = Point> + 'a {
        let last = self.subdivision_points.len().saturating_sub(1);
        self.subdivision_points
            .iter()
            .enumerate()
            .map(move |(idx, position)| {
                if idx == 0 {
                    nodes[self.from].clone()
                } else if idx == last {
                    nodes[self.to].clone()
                } else {
                    Point::custom(*position)
                }
            })
    }
}

/// Arena of nodes and the edges drawn between them.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub nodes: Vec<Point>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node whose id is its index.
    pub fn add_node(&mut self, name: impl Into<String>, position: Vector2) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Point::new(idx as i64, name, position));
        idx
    }

    /// Appends an edge whose id is its index. Returns `None` when either
    /// endpoint is not a node of this graph.
    pub fn add_edge(&mut self, from: usize, to: usize) -> Option<usize> {
        let from_pos = self.nodes.get(from)?.position;
        let to_pos = self.nodes.get(to)?.position;
        let idx = self.edges.len();
        self.edges.push(Edge {
            id: idx as i64,
            from,
            to,
            subdivision_points: vec![from_pos, to_pos],
            compatible_edges: Vec::new(),
        });
        Some(idx)
    }

    /// Straight from→to line of an edge.
    pub fn segment(&self, edge: &Edge) -> Segment {
        Segment::new(self.nodes[edge.from].position, self.nodes[edge.to].position)
    }

    pub fn segments(&self) -> Vec<Segment> {
        self.edges.iter().map(|edge| self.segment(edge)).collect()
    }

    /// First edge whose endpoints are not nodes of this graph, as
    /// `(edge index, missing node index)`.
    pub fn dangling_endpoint(&self) -> Option<(usize, usize)> {
        self.edges.iter().enumerate().find_map(|(idx, edge)| {
            [edge.from, edge.to]
                .into_iter()
                .find(|node| *node >= self.nodes.len())
                .map(|node| (idx, node))
        })
    }
}
