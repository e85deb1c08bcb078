use log::{info, trace};

use super::error::Result;
use super::rate::split_instrument;
use crate::debug::{self, SinkLease};

const SCOPE: &str = "pruner";

/// Reduce an instrument list to the entries whose currencies can lie on a
/// cycle of the undirected projection.
///
/// Two passes over the currency graph built from the `A_B` names:
///
/// 1. a leaf prune drops, in a single reverse-discovery-order sweep,
///    every vertex whose degree has fallen below 2 by the time it is
///    visited (such a vertex cannot lie on any cycle);
/// 2. a depth-first sweep marks the vertices that lie on some cycle of
///    what remains - a self-loop, or an incident edge that is not a
///    bridge - and everything unmarked is dropped.
///
/// Surviving entries come back in input order. Duplicate entries are
/// accepted; they count toward leaf-prune degree but the cycle test runs
/// on the deduplicated projection, so duplicates alone never make a pair
/// cyclic. Self-loops count 2 toward degree and are always cyclic.
///
/// # Errors
///
/// `InvalidInstrument` on the first entry that does not parse.
pub fn prune(input: &[String]) -> Result<Vec<String>> {
    let _lease = SinkLease::acquire();
    info!(target: SCOPE, "load graph");

    // Discovery order defines the vertex indices.
    let mut nodes: Vec<String> = Vec::new();
    let mut edges: Vec<(usize, usize)> = Vec::with_capacity(input.len());
    for line in input {
        let (u, v) = split_instrument(line)?;
        let upos = index_or_insert(&mut nodes, u);
        let vpos = index_or_insert(&mut nodes, v);
        trace!(target: SCOPE, "Load edge: {u}_{v} -> [{upos}]->[{vpos}]");
        edges.push((upos, vpos));
    }
    if debug::enabled(SCOPE, log::Level::Trace) {
        trace!(target: SCOPE, "Nodes[{}]", nodes.join(", "));
    }

    let n = nodes.len();
    let mut alive = vec![true; n];
    let mut degree = vec![0usize; n];
    for &(u, v) in &edges {
        if u == v {
            degree[u] += 2;
        } else {
            degree[u] += 1;
            degree[v] += 1;
        }
    }

    // Leaf prune. One sweep in reverse discovery order; degrees drop as
    // vertices go, so a removal can cascade into lower-indexed vertices
    // still ahead of the sweep. Whatever survives that shouldn't is
    // caught by the cycle test below.
    info!(target: SCOPE, "pre-prune lone vertices");
    let mut removed: Vec<&str> = Vec::new();
    for v in (0..n).rev() {
        if degree[v] >= 2 {
            continue;
        }
        alive[v] = false;
        for &(a, b) in &edges {
            if a == v && b != v && alive[b] {
                degree[b] -= 1;
            } else if b == v && a != v && alive[a] {
                degree[a] -= 1;
            }
        }
        removed.push(&nodes[v]);
    }
    if debug::enabled(SCOPE, log::Level::Trace) {
        trace!(target: SCOPE, "Removed vertices[{}]", removed.join(", "));
    }
    removed.clear();

    // Cycle detection over the deduplicated undirected projection.
    info!(target: SCOPE, "find cycles");
    let cyclic = mark_cyclic(n, &alive, &edges);

    info!(target: SCOPE, "prune acyclics");
    for v in (0..n).rev() {
        if alive[v] && !cyclic[v] {
            alive[v] = false;
            removed.push(&nodes[v]);
        }
    }
    if debug::enabled(SCOPE, log::Level::Trace) {
        trace!(target: SCOPE, "Removed vertices[{}]", removed.join(", "));
        let survivors: Vec<&str> = (0..n)
            .filter(|&v| alive[v])
            .map(|v| nodes[v].as_str())
            .collect();
        trace!(target: SCOPE, "New vertices[{}]", survivors.join(", "));
    }

    // Surviving entries, in input order.
    let output: Vec<String> = input
        .iter()
        .zip(&edges)
        .filter(|(_, &(u, v))| alive[u] && alive[v])
        .map(|(line, _)| line.clone())
        .collect();
    if debug::enabled(SCOPE, log::Level::Trace) {
        trace!(target: SCOPE, "New edges[{}]", output.join(", "));
    }
    Ok(output)
}

fn index_or_insert(nodes: &mut Vec<String>, label: &str) -> usize {
    match nodes.iter().position(|n| n == label) {
        Some(pos) => pos,
        None => {
            nodes.push(label.to_string());
            nodes.len() - 1
        }
    }
}

/// Mark the live vertices that lie on some cycle of the undirected
/// projection: vertices with a self-loop, and the endpoints of every
/// non-bridge edge. Bridges are found with a depth-first search over the
/// deduplicated projection (parallel input edges collapse, so duplicates
/// cannot fabricate cycles).
fn mark_cyclic(n: usize, alive: &[bool], edges: &[(usize, usize)]) -> Vec<bool> {
    let mut cyclic = vec![false; n];

    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
    for &(u, v) in edges {
        if !alive[u] || !alive[v] {
            continue;
        }
        if u == v {
            cyclic[u] = true;
        } else if !adj[u].contains(&v) {
            adj[u].push(v);
            adj[v].push(u);
        }
    }

    const UNDISCOVERED: usize = usize::MAX;
    let mut disc = vec![UNDISCOVERED; n];
    let mut low = vec![0usize; n];
    let mut timer = 0usize;

    for start in 0..n {
        if !alive[start] || disc[start] != UNDISCOVERED {
            continue;
        }
        disc[start] = timer;
        low[start] = timer;
        timer += 1;
        // Frames of (vertex, parent, next-neighbor cursor).
        let mut stack: Vec<(usize, Option<usize>, usize)> = vec![(start, None, 0)];
        while !stack.is_empty() {
            let top = stack.len() - 1;
            let (v, parent, cursor) = stack[top];
            if let Some(&w) = adj[v].get(cursor) {
                stack[top].2 += 1;
                if disc[w] == UNDISCOVERED {
                    disc[w] = timer;
                    low[w] = timer;
                    timer += 1;
                    stack.push((w, Some(v), 0));
                } else if Some(w) != parent {
                    // An edge to an already-discovered non-parent closes a
                    // cycle through the tree path; both ends lie on it.
                    low[v] = low[v].min(disc[w]);
                    cyclic[v] = true;
                    cyclic[w] = true;
                }
            } else {
                stack.pop();
                if let Some(&(p, _, _)) = stack.last() {
                    low[p] = low[p].min(low[v]);
                    // Tree edge {p, v} lies on a cycle unless it is a
                    // bridge.
                    if low[v] <= disc[p] {
                        cyclic[p] = true;
                        cyclic[v] = true;
                    }
                }
            }
        }
    }

    cyclic
}
