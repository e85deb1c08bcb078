use std::collections::{BTreeSet, HashSet};

use log::{info, trace};

use super::error::Result;
use super::graph::{label_edges, label_vertices, EdgePair, LabeledGraph, Vertex};
use super::rate::Rate;
use crate::debug::{self, SinkLease};

const SCOPE: &str = "graph:reload";

/// The modifications a reload applied to a labeled graph.
///
/// `removed_*` hold pre-deletion indices in ascending order; `added_*`
/// hold post-reload indices, in the order the rate snapshot first
/// mentioned each vertex or edge. Together with [`remap`] this is enough
/// for a caller to migrate any indices it cached across the reload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReloadReport {
    /// Indices of removed vertices
    pub removed_vertices: Vec<Vertex>,
    /// Vertex-pair indices of removed edges
    pub removed_edges: Vec<EdgePair>,
    /// Indices of added vertices, corrected for removed ones
    pub added_vertices: Vec<Vertex>,
    /// Vertex-pair indices of added edges, corrected for removed vertices
    pub added_edges: Vec<EdgePair>,
}

/// Translate old vertex indices into new ones given the label vectors
/// from before and after a reload. A slot is `None` where the old label
/// no longer exists.
pub fn remap(old_labels: &[String], new_labels: &[String]) -> Vec<Option<Vertex>> {
    let out: Vec<Option<Vertex>> = old_labels
        .iter()
        .map(|label| new_labels.iter().position(|l| l == label))
        .collect();

    if debug::enabled("graph:remap", log::Level::Trace) {
        let gone: Vec<&str> = old_labels
            .iter()
            .zip(&out)
            .filter(|(_, slot)| slot.is_none())
            .map(|(label, _)| label.as_str())
            .collect();
        trace!(target: "graph:remap", "remaps{out:?}");
        trace!(target: "graph:remap", "gone[{}]", gone.join(", "));
    }
    out
}

/// (Re)build a labeled graph from a rate snapshot.
///
/// After a successful return the graph represents exactly `rates`: every
/// quoted instrument contributes its pair of directed edges, every named
/// currency is a vertex, anything no longer named is gone, and vertex
/// indices are compacted.
///
/// # Errors
///
/// `InvalidInstrument` or `InvalidRate` on a bad entry, `AsymmetricEdge`
/// when an existing edge is found in only one direction. Mutations made
/// before the failing entry remain; the caller may re-run.
pub fn reload(lg: &mut LabeledGraph, rates: &[Rate]) -> Result<ReloadReport> {
    let _lease = SinkLease::acquire();

    // Snapshot the old vertex and edge sets before any insertion; loading
    // edges below adds vertices as new labels appear.
    let old_vertex_count = lg.vertex_count();
    let old_edges: BTreeSet<EdgePair> = lg.graph.edges().map(|(u, v, _)| (u, v)).collect();

    // First-mention order is kept alongside the membership sets; the
    // report's added sequences preserve it.
    let mut visited_vertices: Vec<Vertex> = Vec::new();
    let mut visited_vertex_set: HashSet<Vertex> = HashSet::new();
    let mut visited_edges: Vec<EdgePair> = Vec::new();
    let mut visited_edge_set: HashSet<EdgePair> = HashSet::new();

    for rate in rates {
        let (u, v) = rate.currencies()?;
        rate.validate()?;
        let upos = lg.ensure_vertex(u)?;
        let vpos = lg.ensure_vertex(v)?;

        lg.graph.load_rate_pair(upos, vpos, rate.ask, rate.bid)?;

        for vertex in [upos, vpos] {
            if visited_vertex_set.insert(vertex) {
                visited_vertices.push(vertex);
            }
        }
        for edge in [(upos, vpos), (vpos, upos)] {
            if visited_edge_set.insert(edge) {
                visited_edges.push(edge);
            }
        }
    }

    // New = Vis \ Old, in first-mention order
    let mut added_vertices: Vec<Vertex> = visited_vertices
        .iter()
        .copied()
        .filter(|&v| v >= old_vertex_count)
        .collect();
    let mut added_edges: Vec<EdgePair> = visited_edges
        .iter()
        .copied()
        .filter(|e| !old_edges.contains(e))
        .collect();
    // Del = Old \ Vis, ascending
    let removed_vertices: Vec<Vertex> = (0..old_vertex_count)
        .filter(|v| !visited_vertex_set.contains(v))
        .collect();
    let removed_edges: Vec<EdgePair> = old_edges
        .iter()
        .copied()
        .filter(|e| !visited_edge_set.contains(e))
        .collect();

    info!(target: SCOPE, "{}", if removed_vertices.is_empty() { "No removed vertices" } else { "Removed vertices" });
    info!(target: SCOPE, "{}", if removed_edges.is_empty() { "No removed edges" } else { "Removed edges" });
    info!(target: SCOPE, "{}", if added_vertices.is_empty() { "No added vertices" } else { "Added vertices" });
    info!(target: SCOPE, "{}", if added_edges.is_empty() { "No added edges" } else { "Added edges" });
    if debug::enabled(SCOPE, log::Level::Trace) {
        // Labels are still pre-deletion here, so removed indices resolve.
        if !removed_vertices.is_empty() {
            trace!(target: SCOPE, "Deleted vertices[{}]", label_vertices(&removed_vertices, &lg.labels));
        }
        if !removed_edges.is_empty() {
            trace!(target: SCOPE, "Deleted edges[{}]", label_edges(&removed_edges, &lg.labels));
        }
        if !added_vertices.is_empty() {
            trace!(target: SCOPE, "<UNADJ> Added vertices[{}]", label_vertices(&added_vertices, &lg.labels));
        }
        if !added_edges.is_empty() {
            trace!(target: SCOPE, "<UNADJ> Added edges[{}]", label_edges(&added_edges, &lg.labels));
        }
    }

    for &(u, v) in &removed_edges {
        lg.graph.remove_edge(u, v)?;
    }

    // Reverse-order vertex deletion keeps the pending deletions' indices
    // valid while the added sequences are shifted down past each hole.
    for &del in removed_vertices.iter().rev() {
        lg.remove_vertex(del)?;
        let mut adjusted = 0usize;
        for vertex in added_vertices.iter_mut() {
            if *vertex > del {
                *vertex -= 1;
                adjusted += 1;
            }
        }
        trace!(target: SCOPE, "Delete vertex {del}: adjust {adjusted} vertices");
        let mut adjusted = 0usize;
        for (u, v) in added_edges.iter_mut() {
            if *u > del || *v > del {
                adjusted += 1;
            }
            if *u > del {
                *u -= 1;
            }
            if *v > del {
                *v -= 1;
            }
        }
        trace!(target: SCOPE, "Delete vertex {del}: adjust {adjusted} edges");
    }

    if debug::enabled(SCOPE, log::Level::Trace) {
        if !added_vertices.is_empty() {
            trace!(target: SCOPE, "Corrected new vertices[{}]", label_vertices(&added_vertices, &lg.labels));
        }
        if !added_edges.is_empty() {
            trace!(target: SCOPE, "Corrected new edges[{}]", label_edges(&added_edges, &lg.labels));
        }
    }

    Ok(ReloadReport {
        removed_vertices,
        removed_edges,
        added_vertices,
        added_edges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arb::error::Error;
    use crate::arb::test_helpers::*;

    #[test]
    fn test_initial_load() {
        let mut lg = LabeledGraph::new();
        let report = reload(&mut lg, &rates(&[("A_B", 0.5, 0.5), ("B_C", 0.5, 0.5)])).unwrap();

        assert_eq!(lg.labels, vec!["A", "B", "C"]);
        assert_eq!(lg.graph.vertex_count(), 3);
        assert_eq!(lg.graph.edge_count(), 4);
        assert_eq!(report.added_vertices, vec![0, 1, 2]);
        assert_eq!(report.added_edges, vec![(0, 1), (1, 0), (1, 2), (2, 1)]);
        assert!(report.removed_vertices.is_empty());
        assert!(report.removed_edges.is_empty());
    }

    #[test]
    fn test_added_order_follows_first_mention() {
        let mut lg = LabeledGraph::new();
        let report = reload(&mut lg, &rates(&[("X_Y", 1.0, 1.0), ("A_X", 1.0, 1.0)])).unwrap();

        assert_eq!(lg.labels, vec!["X", "Y", "A"]);
        assert_eq!(report.added_vertices, vec![0, 1, 2]);
        assert_eq!(report.added_edges, vec![(0, 1), (1, 0), (2, 0), (0, 2)]);
    }

    #[test]
    fn test_edge_weights_and_update() {
        let mut lg = LabeledGraph::new();
        reload(&mut lg, &rates(&[("A_B", 0.5, 2.0)])).unwrap();
        assert_eq!(lg.graph.weight(0, 1), Some(-(2.0f64.ln())));
        assert_eq!(lg.graph.weight(1, 0), Some(0.5f64.ln()));

        // Same instrument set: a pure weight update, empty report.
        let report = reload(&mut lg, &rates(&[("A_B", 0.25, 4.0)])).unwrap();
        assert_eq!(report, ReloadReport::default());
        assert_eq!(lg.graph.weight(0, 1), Some(-(4.0f64.ln())));
        assert_eq!(lg.graph.weight(1, 0), Some(0.25f64.ln()));
    }

    #[test]
    fn test_vertex_swap_reindexes_report() {
        // {A, B, C} -> {A, B, D}: D enters while C leaves, and D's index
        // is reported in the compacted, post-reload space.
        let mut lg = LabeledGraph::new();
        reload(&mut lg, &triangle_rates()).unwrap();

        let report = reload(
            &mut lg,
            &rates(&[("A_B", 1.0, 1.0), ("B_D", 1.0, 1.0), ("D_A", 1.0, 1.0)]),
        )
        .unwrap();

        assert_eq!(lg.labels, vec!["A", "B", "D"]);
        assert_eq!(report.removed_vertices, vec![2]);
        assert_eq!(report.added_vertices, vec![2]);
        assert_eq!(
            report.removed_edges,
            vec![(0, 2), (1, 2), (2, 0), (2, 1)]
        );
        assert_eq!(report.added_edges, vec![(1, 2), (2, 1), (2, 0), (0, 2)]);

        // The graph itself is consistent with the new snapshot.
        assert_eq!(lg.graph.vertex_count(), 3);
        assert_eq!(lg.graph.edge_count(), 6);
        assert!(lg.graph.has_edge(1, 2) && lg.graph.has_edge(2, 1));
        assert!(lg.graph.has_edge(2, 0) && lg.graph.has_edge(0, 2));
    }

    #[test]
    fn test_empty_snapshot_clears_graph() {
        let mut lg = LabeledGraph::new();
        reload(&mut lg, &triangle_rates()).unwrap();

        let report = reload(&mut lg, &[]).unwrap();
        assert_eq!(lg.vertex_count(), 0);
        assert_eq!(lg.graph.vertex_count(), 0);
        assert_eq!(lg.graph.edge_count(), 0);
        assert_eq!(report.removed_vertices, vec![0, 1, 2]);
        assert_eq!(report.removed_edges.len(), 6);
        assert!(report.added_vertices.is_empty());
        assert!(report.added_edges.is_empty());
    }

    #[test]
    fn test_cardinality_balance() {
        // |V_old| + |added| - |removed| = |V_new|, and likewise for edges.
        let mut lg = LabeledGraph::new();
        reload(&mut lg, &triangle_rates()).unwrap();
        let (v_old, e_old) = (lg.graph.vertex_count(), lg.graph.edge_count());

        let report = reload(
            &mut lg,
            &rates(&[("A_B", 1.0, 1.0), ("D_E", 1.0, 1.0)]),
        )
        .unwrap();

        assert_eq!(
            v_old + report.added_vertices.len() - report.removed_vertices.len(),
            lg.graph.vertex_count()
        );
        assert_eq!(
            e_old + report.added_edges.len() - report.removed_edges.len(),
            lg.graph.edge_count()
        );
        // Labels stay distinct and parallel to the vertex space.
        assert_eq!(lg.labels.len(), lg.graph.vertex_count());
        let unique: std::collections::HashSet<&String> = lg.labels.iter().collect();
        assert_eq!(unique.len(), lg.labels.len());
    }

    #[test]
    fn test_every_edge_is_paired() {
        let mut lg = LabeledGraph::new();
        reload(&mut lg, &rates(&[("A_B", 0.9, 1.1), ("B_C", 0.8, 1.2)])).unwrap();
        for (u, v, _) in lg.graph.edges() {
            assert!(lg.graph.has_edge(v, u), "missing reverse of {u}->{v}");
        }
    }

    #[test]
    fn test_flipped_instrument_updates_existing_pair() {
        let mut lg = LabeledGraph::new();
        reload(&mut lg, &rates(&[("A_B", 0.5, 2.0)])).unwrap();
        // B_A addresses the same vertex pair from the other side.
        let report = reload(&mut lg, &rates(&[("B_A", 0.5, 2.0)])).unwrap();
        assert_eq!(report, ReloadReport::default());
        assert_eq!(lg.graph.weight(1, 0), Some(-(2.0f64.ln())));
        assert_eq!(lg.graph.weight(0, 1), Some(0.5f64.ln()));
    }

    #[test]
    fn test_one_sided_edge_is_rejected() {
        let mut lg = LabeledGraph::new();
        lg.ensure_vertex("A").unwrap();
        lg.ensure_vertex("B").unwrap();
        lg.graph.upsert_edge(0, 1, 1.0).unwrap();

        let err = reload(&mut lg, &rates(&[("A_B", 1.0, 1.0)])).unwrap_err();
        assert_eq!(err, Error::AsymmetricEdge(0, 1));
    }

    #[test]
    fn test_bad_entries_are_rejected() {
        let mut lg = LabeledGraph::new();
        assert_eq!(
            reload(&mut lg, &rates(&[("AB", 1.0, 1.0)])).unwrap_err(),
            Error::InvalidInstrument("AB".to_string())
        );
        assert_eq!(
            reload(&mut lg, &rates(&[("A_B", 0.0, 1.0)])).unwrap_err(),
            Error::InvalidRate("A_B".to_string(), 0.0, 1.0)
        );
        assert_eq!(
            reload(&mut lg, &rates(&[("A_B", 1.0, -2.0)])).unwrap_err(),
            Error::InvalidRate("A_B".to_string(), 1.0, -2.0)
        );
    }

    #[test]
    fn test_remap_translates_surviving_labels() {
        let old = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let new = vec!["A".to_string(), "D".to_string(), "B".to_string()];
        assert_eq!(remap(&old, &new), vec![Some(0), Some(2), None]);
        assert_eq!(remap(&[], &new), Vec::<Option<Vertex>>::new());
    }
}
