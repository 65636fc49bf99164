//! Street graph and shortest-path search
//!
//! Nodes sit at street junctions and bends in overhead pixel coordinates.
//! Edges are two-way unless the graph is marked `directed`.
//!
//! # File format
//!
//! ```json
//! {
//!   "directed": false,
//!   "nodes": [{"id": 1, "x": 40, "y": 60}, {"id": 2, "x": 200, "y": 60}],
//!   "edges": [{"from": 1, "to": 2, "weight": 160.0}]
//! }
//! ```
//!
//! A missing `weight` defaults to the euclidean distance between the nodes.

use crate::error::{NavError, Result};
use crate::geometry::PixelPoint;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::path::Path;

/// Graph node identifier
pub type NodeId = u64;

/// Graph node
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct GraphNode {
    pub id: NodeId,
    pub x: i32,
    pub y: i32,
}

impl GraphNode {
    pub fn position(&self) -> PixelPoint {
        PixelPoint::new(self.x, self.y)
    }
}

/// Graph edge as stored on disk
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct GraphEdge {
    pub from: NodeId,
    pub to: NodeId,
    #[serde(default)]
    pub weight: Option<f32>,
}

#[derive(Deserialize)]
struct GraphFile {
    #[serde(default)]
    directed: bool,
    nodes: Vec<GraphNode>,
    #[serde(default)]
    edges: Vec<GraphEdge>,
}

/// Route target taken from the graph
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Waypoint {
    pub node_id: NodeId,
    pub x: i32,
    pub y: i32,
}

impl From<&GraphNode> for Waypoint {
    fn from(node: &GraphNode) -> Self {
        Self {
            node_id: node.id,
            x: node.x,
            y: node.y,
        }
    }
}

/// Ordered, non-empty waypoint sequence
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    pub waypoints: Vec<Waypoint>,
    /// Sum of traversed edge weights
    pub total_weight: f32,
}

impl Route {
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.waypoints.iter().map(|w| w.node_id).collect()
    }
}

/// Entry in the search frontier
#[derive(Clone, Debug)]
struct SearchNode {
    index: usize,
    cost: f32,
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for SearchNode {}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (lower cost = higher priority)
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Read-only street graph
#[derive(Clone, Debug)]
pub struct StreetGraph {
    nodes: Vec<GraphNode>,
    index: HashMap<NodeId, usize>,
    adjacency: Vec<Vec<(usize, f32)>>,
    directed: bool,
}

impl StreetGraph {
    /// Build a graph, validating ids and weights
    pub fn from_parts(nodes: Vec<GraphNode>, edges: &[GraphEdge], directed: bool) -> Result<Self> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id, i).is_some() {
                return Err(NavError::Graph(format!("Duplicate node id {}", node.id)));
            }
        }

        let mut adjacency = vec![Vec::new(); nodes.len()];
        for edge in edges {
            let from = *index.get(&edge.from).ok_or(NavError::UnknownNode(edge.from))?;
            let to = *index.get(&edge.to).ok_or(NavError::UnknownNode(edge.to))?;

            let weight = match edge.weight {
                Some(w) if w.is_finite() && w >= 0.0 => w,
                Some(w) => {
                    return Err(NavError::Graph(format!(
                        "Edge {} -> {} has invalid weight {}",
                        edge.from, edge.to, w
                    )));
                }
                None => nodes[from].position().distance_to(nodes[to].position()),
            };

            adjacency[from].push((to, weight));
            if !directed {
                adjacency[to].push((from, weight));
            }
        }

        Ok(Self {
            nodes,
            index,
            adjacency,
            directed,
        })
    }

    /// Parse the JSON graph format
    pub fn from_json(json: &str) -> Result<Self> {
        let file: GraphFile = serde_json::from_str(json)?;
        Self::from_parts(file.nodes, &file.edges, file.directed)
    }

    /// Load a JSON graph file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NavError::Graph(format!("Failed to read graph {}: {}", path.display(), e))
        })?;
        let graph = Self::from_json(&content)?;
        tracing::info!(
            "Loaded street graph {}: {} nodes, {} edges{}",
            path.display(),
            graph.node_count(),
            graph.edge_count(),
            if graph.directed { " (directed)" } else { "" }
        );
        Ok(graph)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges as given (an undirected edge counts once)
    pub fn edge_count(&self) -> usize {
        let arcs: usize = self.adjacency.iter().map(Vec::len).sum();
        if self.directed { arcs } else { arcs / 2 }
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    /// Node closest to `point` by euclidean distance; first one wins ties
    pub fn nearest_node(&self, point: PixelPoint) -> Option<&GraphNode> {
        self.nodes.iter().min_by(|a, b| {
            let da = a.position().distance_to(point);
            let db = b.position().distance_to(point);
            da.partial_cmp(&db).unwrap_or(Ordering::Equal)
        })
    }

    /// Lowest-weight route between two nodes (Dijkstra)
    pub fn shortest_path(&self, from: NodeId, to: NodeId) -> Result<Route> {
        let start = *self.index.get(&from).ok_or(NavError::UnknownNode(from))?;
        let goal = *self.index.get(&to).ok_or(NavError::UnknownNode(to))?;

        let mut open_set = BinaryHeap::new();
        let mut cost = vec![f32::INFINITY; self.nodes.len()];
        let mut parent: Vec<Option<usize>> = vec![None; self.nodes.len()];
        let mut closed = vec![false; self.nodes.len()];

        cost[start] = 0.0;
        open_set.push(SearchNode {
            index: start,
            cost: 0.0,
        });

        while let Some(current) = open_set.pop() {
            if current.index == goal {
                return Ok(self.reconstruct(&parent, goal, cost[goal]));
            }

            // Stale heap entry
            if closed[current.index] {
                continue;
            }
            closed[current.index] = true;

            for &(neighbor, weight) in &self.adjacency[current.index] {
                if closed[neighbor] {
                    continue;
                }
                let new_cost = cost[current.index] + weight;
                if new_cost < cost[neighbor] {
                    cost[neighbor] = new_cost;
                    parent[neighbor] = Some(current.index);
                    open_set.push(SearchNode {
                        index: neighbor,
                        cost: new_cost,
                    });
                }
            }
        }

        Err(NavError::NoPathFound { from, to })
    }

    fn reconstruct(&self, parent: &[Option<usize>], goal: usize, total_weight: f32) -> Route {
        let mut indices = vec![goal];
        let mut current = goal;
        while let Some(p) = parent[current] {
            indices.push(p);
            current = p;
        }
        indices.reverse();

        Route {
            waypoints: indices.iter().map(|&i| Waypoint::from(&self.nodes[i])).collect(),
            total_weight,
        }
    }
}
