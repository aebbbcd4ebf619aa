//! Popularity Graph
//!
//! Directed weighted call graph over phone numbers. One edge per ordered (caller, callee)
//! pair accumulates the call count and total duration. Scores are computed on demand from
//! the current edges:
//!
//! ```text
//! score(n) = (in_degree * 2 + out_degree) * 100 + in_duration + 0.5 * out_duration
//! ```
//!
//! Degrees count distinct neighbors, not calls. Vertices and edges are kept in arenas and
//! reference each other by index, so neighbor lookup is O(1) without shared ownership.

use crate::PhoneNumber;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Graph Elements
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct VertexId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct EdgeId(usize);

/// Accumulated weight of one directed edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeWeight {
    pub count: u64,
    pub duration_total: f64,
}

/// Calls received by a number, independent of who placed them
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceivedTally {
    pub count: u64,
    pub duration: f64,
}

#[derive(Debug)]
struct Vertex {
    number: PhoneNumber,
    outgoing: HashMap<VertexId, EdgeId>,
    incoming: HashMap<VertexId, EdgeId>,
}

#[derive(Debug)]
struct Edge {
    origin: VertexId,
    destination: VertexId,
    weight: EdgeWeight,
}

// ----------------------------------------------------------------------------
// Snapshot Types
// ----------------------------------------------------------------------------

/// One serialized edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    pub caller: PhoneNumber,
    pub callee: PhoneNumber,
    pub count: u64,
    pub duration_total: f64,
}

/// Serialized graph: edges in creation order plus the received tallies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub edges: Vec<EdgeSnapshot>,
    pub received: Vec<(PhoneNumber, ReceivedTally)>,
}

// ----------------------------------------------------------------------------
// Popularity Graph
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct PopularityGraph {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    index: HashMap<PhoneNumber, VertexId>,
    received: HashMap<PhoneNumber, ReceivedTally>,
}

impl PopularityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one call of `duration_secs` from `caller` to `callee`
    ///
    /// Calls with an empty party are ignored.
    pub fn record_call(&mut self, caller: &PhoneNumber, callee: &PhoneNumber, duration_secs: f64) {
        if caller.is_empty() || callee.is_empty() {
            return;
        }
        self.accumulate(caller, callee, 1, duration_secs);

        let tally = self.received.entry(callee.clone()).or_default();
        tally.count += 1;
        tally.duration += duration_secs;
    }

    /// Popularity score; 0 for unknown numbers
    pub fn score(&self, number: &str) -> f64 {
        let Some(&vertex) = self.index.get(number) else {
            return 0.0;
        };
        let vertex = &self.vertices[vertex.0];

        let in_duration = self.duration_sum(&vertex.incoming);
        let out_duration = self.duration_sum(&vertex.outgoing);
        let degree_weight = (vertex.incoming.len() * 2 + vertex.outgoing.len()) as f64;

        degree_weight * 100.0 + in_duration + 0.5 * out_duration
    }

    /// The `n` highest scoring numbers, ties in vertex creation order
    pub fn top_n(&self, n: usize) -> Vec<(PhoneNumber, f64)> {
        let mut scores: Vec<(PhoneNumber, f64)> = self
            .vertices
            .iter()
            .map(|vertex| (vertex.number.clone(), self.score(vertex.number.as_str())))
            .collect();
        scores.sort_by(|a, b| b.1.total_cmp(&a.1));
        scores.truncate(n);
        scores
    }

    pub fn contains(&self, number: &str) -> bool {
        self.index.contains_key(number)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Weight of the edge `caller -> callee`, if any call was recorded
    pub fn edge(&self, caller: &str, callee: &str) -> Option<EdgeWeight> {
        let origin = self.index.get(caller)?;
        let destination = self.index.get(callee)?;
        self.vertices[origin.0]
            .outgoing
            .get(destination)
            .map(|edge| self.edges[edge.0].weight)
    }

    pub fn in_degree(&self, number: &str) -> usize {
        self.index
            .get(number)
            .map(|v| self.vertices[v.0].incoming.len())
            .unwrap_or(0)
    }

    pub fn out_degree(&self, number: &str) -> usize {
        self.index
            .get(number)
            .map(|v| self.vertices[v.0].outgoing.len())
            .unwrap_or(0)
    }

    pub fn received(&self, number: &str) -> ReceivedTally {
        self.received.get(number).copied().unwrap_or_default()
    }

    /// Edges in creation order as (caller, callee, weight)
    pub fn edges(&self) -> impl Iterator<Item = (&PhoneNumber, &PhoneNumber, EdgeWeight)> {
        self.edges.iter().map(|edge| {
            (
                &self.vertices[edge.origin.0].number,
                &self.vertices[edge.destination.0].number,
                edge.weight,
            )
        })
    }

    // ------------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------------

    pub fn serialize(&self) -> GraphSnapshot {
        let edges = self
            .edges()
            .map(|(caller, callee, weight)| EdgeSnapshot {
                caller: caller.clone(),
                callee: callee.clone(),
                count: weight.count,
                duration_total: weight.duration_total,
            })
            .collect();

        let mut received: Vec<(PhoneNumber, ReceivedTally)> = self
            .received
            .iter()
            .map(|(number, tally)| (number.clone(), *tally))
            .collect();
        received.sort_by(|a, b| a.0.cmp(&b.0));

        GraphSnapshot { edges, received }
    }

    /// Replace the graph with `snapshot`
    ///
    /// Edges are replayed in creation order, so vertices come back in the
    /// same order `record_call` created them and `top_n` tie-breaking is preserved.
    pub fn restore(&mut self, snapshot: GraphSnapshot) {
        self.clear();
        for edge in snapshot.edges {
            if edge.caller.is_empty() || edge.callee.is_empty() {
                continue;
            }
            self.accumulate(&edge.caller, &edge.callee, edge.count, edge.duration_total);
        }
        self.received = snapshot.received.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.edges.clear();
        self.index.clear();
        self.received.clear();
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn vertex_for(&mut self, number: &PhoneNumber) -> VertexId {
        if let Some(&id) = self.index.get(number.as_str()) {
            return id;
        }
        let id = VertexId(self.vertices.len());
        self.vertices.push(Vertex {
            number: number.clone(),
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
        });
        self.index.insert(number.clone(), id);
        id
    }

    /// Summed in edge creation order so a restored graph scores bit-for-bit the same
    fn duration_sum(&self, edges: &HashMap<VertexId, EdgeId>) -> f64 {
        let mut ids: Vec<EdgeId> = edges.values().copied().collect();
        ids.sort_unstable_by_key(|edge| edge.0);
        ids.iter().map(|edge| self.edges[edge.0].weight.duration_total).sum()
    }

    fn accumulate(&mut self, caller: &PhoneNumber, callee: &PhoneNumber, count: u64, duration: f64) {
        let origin = self.vertex_for(caller);
        let destination = self.vertex_for(callee);

        if let Some(&edge) = self.vertices[origin.0].outgoing.get(&destination) {
            let weight = &mut self.edges[edge.0].weight;
            weight.count += count;
            weight.duration_total += duration;
            return;
        }

        let edge = EdgeId(self.edges.len());
        self.edges.push(Edge {
            origin,
            destination,
            weight: EdgeWeight {
                count,
                duration_total: duration,
            },
        });
        self.vertices[origin.0].outgoing.insert(destination, edge);
        self.vertices[destination.0].incoming.insert(origin, edge);
    }
}
