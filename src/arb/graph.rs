use std::collections::BTreeSet;
use std::fmt::{self, Display, Write as _};

use super::error::{Error, Result};

/// Dense vertex index. Removing a vertex compacts the space: every index
/// above the removed one shifts down by one, so indices held across a
/// mutation must be translated through the reload report.
pub type Vertex = usize;

/// A directed edge as a `(source, target)` index pair.
pub type EdgePair = (Vertex, Vertex);

/// Ceiling on the vertex count. Indices travel to callers that may hold
/// them in signed form, so the space is capped accordingly.
const MAX_VERTICES: usize = i32::MAX as usize;

#[derive(Clone, Copy, Debug, PartialEq)]
struct HalfEdge {
    target: Vertex,
    weight: f64,
}

/// A directed graph of currencies with one real-valued log-rate weight
/// per edge.
///
/// Vertices are the dense indices `0..N`. Edges are stored per-source in
/// insertion order; inserting an edge that already exists updates its
/// weight in place. Every rate loaded through [`RateGraph::load_rate_pair`]
/// contributes a matched pair of directed edges, one per side of the
/// market, so the graphs the engine searches are symmetric in adjacency
/// (not in weight).
#[derive(Clone, Debug, Default)]
pub struct RateGraph {
    adj: Vec<Vec<HalfEdge>>,
    edge_count: usize,
}

impl RateGraph {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.adj.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    fn check(&self, v: Vertex) -> Result<()> {
        if v < self.adj.len() {
            Ok(())
        } else {
            Err(Error::InvalidVertex(v))
        }
    }

    /// Append a vertex and return its index.
    ///
    /// # Errors
    ///
    /// `IndexOverflow` when the index space is exhausted.
    pub fn add_vertex(&mut self) -> Result<Vertex> {
        if self.adj.len() >= MAX_VERTICES {
            return Err(Error::IndexOverflow);
        }
        self.adj.push(Vec::new());
        Ok(self.adj.len() - 1)
    }

    /// Whether the directed edge `u -> v` exists. Out-of-range endpoints
    /// simply yield `false`.
    #[must_use]
    pub fn has_edge(&self, u: Vertex, v: Vertex) -> bool {
        self.adj
            .get(u)
            .is_some_and(|edges| edges.iter().any(|e| e.target == v))
    }

    /// Weight of the directed edge `u -> v`, if present.
    #[must_use]
    pub fn weight(&self, u: Vertex, v: Vertex) -> Option<f64> {
        self.adj
            .get(u)?
            .iter()
            .find(|e| e.target == v)
            .map(|e| e.weight)
    }

    /// Insert the directed edge `u -> v`, or update its weight if it is
    /// already present.
    ///
    /// # Errors
    ///
    /// `InvalidVertex` if either endpoint does not exist.
    pub fn upsert_edge(&mut self, u: Vertex, v: Vertex, weight: f64) -> Result<()> {
        self.check(u)?;
        self.check(v)?;
        match self.adj[u].iter_mut().find(|e| e.target == v) {
            Some(edge) => edge.weight = weight,
            None => {
                self.adj[u].push(HalfEdge { target: v, weight });
                self.edge_count += 1;
            }
        }
        Ok(())
    }

    /// Remove the directed edge `u -> v`; removing an absent edge is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// `InvalidVertex` if either endpoint does not exist.
    pub fn remove_edge(&mut self, u: Vertex, v: Vertex) -> Result<()> {
        self.check(u)?;
        self.check(v)?;
        let before = self.adj[u].len();
        self.adj[u].retain(|e| e.target != v);
        self.edge_count -= before - self.adj[u].len();
        Ok(())
    }

    /// Remove vertex `v` together with all incident edges. Vertices above
    /// `v` shift down by one.
    ///
    /// # Errors
    ///
    /// `InvalidVertex` if `v` does not exist.
    pub fn remove_vertex(&mut self, v: Vertex) -> Result<()> {
        self.check(v)?;
        let out = self.adj.remove(v);
        self.edge_count -= out.len();
        for edges in &mut self.adj {
            let before = edges.len();
            edges.retain(|e| e.target != v);
            self.edge_count -= before - edges.len();
            for edge in edges.iter_mut() {
                if edge.target > v {
                    edge.target -= 1;
                }
            }
        }
        Ok(())
    }

    /// The set of out-adjacent vertices of `u`, optionally with self-loops
    /// filtered out.
    ///
    /// # Errors
    ///
    /// `InvalidVertex` if `u` does not exist.
    pub fn out_vertices(&self, u: Vertex, filter_loops: bool) -> Result<BTreeSet<Vertex>> {
        self.check(u)?;
        Ok(self.adj[u]
            .iter()
            .map(|e| e.target)
            .filter(|&t| !filter_loops || t != u)
            .collect())
    }

    /// Iterate over all directed edges as `(source, target, weight)`, in
    /// source order and per-source insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (Vertex, Vertex, f64)> + '_ {
        self.adj
            .iter()
            .enumerate()
            .flat_map(|(u, edges)| edges.iter().map(move |e| (u, e.target, e.weight)))
    }

    /// Load the edge pair for one quoted instrument: `u -> v` weighted
    /// `-ln(ask)` and `v -> u` weighted `+ln(bid)`. Existing weights are
    /// updated in place.
    ///
    /// # Errors
    ///
    /// `InvalidVertex` if either endpoint does not exist, and
    /// `AsymmetricEdge` if exactly one direction already exists - such a
    /// graph was not built from edge pairs and cannot be updated safely.
    pub fn load_rate_pair(&mut self, u: Vertex, v: Vertex, ask: f64, bid: f64) -> Result<()> {
        self.check(u)?;
        self.check(v)?;
        if self.has_edge(u, v) ^ self.has_edge(v, u) {
            return Err(Error::AsymmetricEdge(u, v));
        }
        self.upsert_edge(u, v, -ask.ln())?;
        self.upsert_edge(v, u, bid.ln())?;
        Ok(())
    }
}

/// A rate graph coupled with the vertex labels: `labels[v]` names vertex
/// `v`. The two halves mutate together; the reloader is the sole mutator
/// after construction.
#[derive(Clone, Debug, Default)]
pub struct LabeledGraph {
    /// The graph
    pub graph: RateGraph,
    /// The label vector, parallel to the vertex index space
    pub labels: Vec<String>,
}

impl LabeledGraph {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.labels.len()
    }

    /// Label of vertex `v`.
    ///
    /// # Errors
    ///
    /// `InvalidVertex` if `v` does not exist.
    pub fn label(&self, v: Vertex) -> Result<&str> {
        self.labels
            .get(v)
            .map(String::as_str)
            .ok_or(Error::InvalidVertex(v))
    }

    /// Index of the vertex labeled `label`, if any.
    #[must_use]
    pub fn index_of(&self, label: &str) -> Option<Vertex> {
        self.labels.iter().position(|l| l == label)
    }

    /// Fetch the vertex labeled `label`, appending a fresh vertex when it
    /// is not present yet.
    ///
    /// # Errors
    ///
    /// `IndexOverflow` when the index space is exhausted.
    pub fn ensure_vertex(&mut self, label: &str) -> Result<Vertex> {
        if let Some(v) = self.index_of(label) {
            return Ok(v);
        }
        let v = self.graph.add_vertex()?;
        self.labels.push(label.to_string());
        Ok(v)
    }

    /// Remove vertex `v` and its label; indices above `v` shift down.
    ///
    /// # Errors
    ///
    /// `InvalidVertex` if `v` does not exist.
    pub fn remove_vertex(&mut self, v: Vertex) -> Result<()> {
        self.graph.remove_vertex(v)?;
        self.labels.remove(v);
        Ok(())
    }
}

impl Display for LabeledGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut vertices = String::new();
        for (v, label) in self.labels.iter().enumerate() {
            if v > 0 {
                vertices.push_str(", ");
            }
            write!(vertices, "{v}({label})")?;
        }
        let mut edges = String::new();
        for (i, (u, v, _)) in self.graph.edges().enumerate() {
            if i > 0 {
                edges.push_str(", ");
            }
            let ul = self.labels.get(u).map(String::as_str).unwrap_or("?");
            let vl = self.labels.get(v).map(String::as_str).unwrap_or("?");
            write!(edges, "{u}->{v}({ul}->{vl})")?;
        }
        write!(f, "(vertices[{vertices}], edges[{edges}])")
    }
}

/// Render vertices as `index(label)` items, the way trace dumps print
/// them.
pub(crate) fn label_vertices(vertices: &[Vertex], labels: &[String]) -> String {
    vertices
        .iter()
        .map(|&v| {
            let l = labels.get(v).map(String::as_str).unwrap_or("?");
            format!("{v}({l})")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render edges as `u->v(A->B)` items.
pub(crate) fn label_edges(edges: &[EdgePair], labels: &[String]) -> String {
    edges
        .iter()
        .map(|&(u, v)| {
            let ul = labels.get(u).map(String::as_str).unwrap_or("?");
            let vl = labels.get(v).map(String::as_str).unwrap_or("?");
            format!("{u}->{v}({ul}->{vl})")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(n: usize) -> RateGraph {
        let mut g = RateGraph::new();
        for _ in 0..n {
            g.add_vertex().unwrap();
        }
        g
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let mut g = graph_with(2);
        g.upsert_edge(0, 1, 1.0).unwrap();
        g.upsert_edge(0, 1, 2.0).unwrap();
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.weight(0, 1), Some(2.0));
    }

    #[test]
    fn test_edge_ops_reject_missing_vertices() {
        let mut g = graph_with(1);
        assert_eq!(g.upsert_edge(0, 1, 1.0), Err(Error::InvalidVertex(1)));
        assert_eq!(g.remove_edge(2, 0), Err(Error::InvalidVertex(2)));
        assert_eq!(g.remove_vertex(1), Err(Error::InvalidVertex(1)));
        assert!(g.out_vertices(3, false).is_err());
        assert!(!g.has_edge(0, 1));
        assert_eq!(g.weight(0, 5), None);
    }

    #[test]
    fn test_remove_edge_is_noop_when_absent() {
        let mut g = graph_with(2);
        g.upsert_edge(0, 1, 1.0).unwrap();
        g.remove_edge(1, 0).unwrap();
        assert_eq!(g.edge_count(), 1);
        g.remove_edge(0, 1).unwrap();
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn test_remove_vertex_compacts_indices() {
        // 0 -> 1 -> 2 -> 0, plus 0 -> 2
        let mut g = graph_with(3);
        g.upsert_edge(0, 1, 0.1).unwrap();
        g.upsert_edge(1, 2, 0.2).unwrap();
        g.upsert_edge(2, 0, 0.3).unwrap();
        g.upsert_edge(0, 2, 0.4).unwrap();

        g.remove_vertex(1).unwrap();

        // Old vertex 2 is now 1; edges through the removed vertex are gone.
        assert_eq!(g.vertex_count(), 2);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.weight(1, 0), Some(0.3));
        assert_eq!(g.weight(0, 1), Some(0.4));
        assert!(!g.has_edge(0, 0));
    }

    #[test]
    fn test_out_vertices_filters_loops() {
        let mut g = graph_with(2);
        g.upsert_edge(0, 0, 1.0).unwrap();
        g.upsert_edge(0, 1, 1.0).unwrap();
        assert_eq!(g.out_vertices(0, false).unwrap(), BTreeSet::from([0, 1]));
        assert_eq!(g.out_vertices(0, true).unwrap(), BTreeSet::from([1]));
    }

    #[test]
    fn test_load_rate_pair_weights() {
        let mut g = graph_with(2);
        g.load_rate_pair(0, 1, 2.0, 0.5).unwrap();
        assert_eq!(g.weight(0, 1), Some(-(2.0f64.ln())));
        assert_eq!(g.weight(1, 0), Some(0.5f64.ln()));

        // Updating through the same instrument keeps the pair matched.
        g.load_rate_pair(0, 1, 4.0, 0.25).unwrap();
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.weight(0, 1), Some(-(4.0f64.ln())));
        assert_eq!(g.weight(1, 0), Some(0.25f64.ln()));
    }

    #[test]
    fn test_load_rate_pair_rejects_one_sided_edge() {
        let mut g = graph_with(2);
        g.upsert_edge(0, 1, 1.0).unwrap();
        assert_eq!(
            g.load_rate_pair(0, 1, 1.0, 1.0),
            Err(Error::AsymmetricEdge(0, 1))
        );
    }

    #[test]
    fn test_labeled_graph_lookup() {
        let mut lg = LabeledGraph::new();
        let a = lg.ensure_vertex("EUR").unwrap();
        let b = lg.ensure_vertex("USD").unwrap();
        assert_eq!((a, b), (0, 1));
        assert_eq!(lg.ensure_vertex("EUR").unwrap(), 0);
        assert_eq!(lg.vertex_count(), 2);
        assert_eq!(lg.label(1).unwrap(), "USD");
        assert_eq!(lg.index_of("USD"), Some(1));
        assert_eq!(lg.index_of("JPY"), None);
        assert_eq!(lg.label(2), Err(Error::InvalidVertex(2)));
    }

    #[test]
    fn test_labeled_graph_display() {
        let mut lg = LabeledGraph::new();
        lg.ensure_vertex("A").unwrap();
        lg.ensure_vertex("B").unwrap();
        lg.graph.load_rate_pair(0, 1, 1.0, 1.0).unwrap();
        assert_eq!(
            lg.to_string(),
            "(vertices[0(A), 1(B)], edges[0->1(A->B), 1->0(B->A)])"
        );
    }
}
