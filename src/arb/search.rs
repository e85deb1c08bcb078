use std::collections::BTreeSet;

use log::{info, trace};

use super::error::{Error, Result};
use super::graph::{LabeledGraph, RateGraph, Vertex};
use crate::debug::SinkLease;

const SCOPE: &str = "graph:search";

/// Per-call visitation state for the search passes. The coloring is
/// scratch, never a property of the graph itself.
///
/// In the triangle sweep: black marks vertices already taken as the
/// primary, gray marks vertices consumed as the secondary; only white
/// vertices remain candidates for the third corner, which is what keeps
/// any triangle from being evaluated twice. In the expansion pass: black
/// marks the vertices of the current cycle plus any vertex spliced in
/// during the pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

struct ColorMap {
    colors: Vec<Color>,
}

impl ColorMap {
    fn new(n: usize) -> Self {
        Self {
            colors: vec![Color::White; n],
        }
    }

    fn get(&self, v: Vertex) -> Color {
        self.colors[v]
    }

    fn set(&mut self, v: Vertex, color: Color) {
        self.colors[v] = color;
    }
}

/// A path and its log-rate, coupled.
///
/// The search works on the open form (the closing edge back to the first
/// vertex is implicit); [`best_path`] emits the closed form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RatedPath {
    /// Vertex sequence
    pub path: Vec<Vertex>,
    /// Sum of log-rates around the closed walk
    pub lrate: f64,
}

impl RatedPath {
    pub fn new(path: Vec<Vertex>, lrate: f64) -> Self {
        Self { path, lrate }
    }
}

/// Close an open path by repeating its first vertex at the tail. An
/// empty path stays empty.
#[must_use]
pub fn close_path(mut path: Vec<Vertex>) -> Vec<Vertex> {
    if let Some(&first) = path.first() {
        path.push(first);
    }
    path
}

/// Sum the log-rates around the closed walk induced by an open path.
///
/// # Errors
///
/// `InvalidPath` when the path spans fewer than two vertices or crosses
/// an edge the graph does not have.
pub fn evaluate_path(g: &RateGraph, path: &[Vertex]) -> Result<f64> {
    if path.len() < 2 {
        return Err(Error::InvalidPath(
            "insufficient vertex count spanned by path".to_string(),
        ));
    }
    let mut acc = 0.0;
    for (i, &u) in path.iter().enumerate() {
        let v = path[(i + 1) % path.len()];
        match g.weight(u, v) {
            Some(weight) => acc += weight,
            None => {
                return Err(Error::InvalidPath(format!("invalid edge ({u},{v}) in path")));
            }
        }
    }
    Ok(acc)
}

/// Out-neighbors of `u` (self-loops filtered) whose color differs from
/// `excluded`.
fn neighbors_excluding(
    g: &RateGraph,
    u: Vertex,
    colors: &ColorMap,
    excluded: Color,
) -> Result<BTreeSet<Vertex>> {
    let mut out = g.out_vertices(u, true)?;
    out.retain(|&w| colors.get(w) != excluded);
    Ok(out)
}

/// Out-neighbors of `u` (self-loops filtered) carrying exactly the color
/// `wanted`.
fn neighbors_colored(
    g: &RateGraph,
    u: Vertex,
    colors: &ColorMap,
    wanted: Color,
) -> Result<BTreeSet<Vertex>> {
    let mut out = g.out_vertices(u, true)?;
    out.retain(|&w| colors.get(w) == wanted);
    Ok(out)
}

/// Vertices adjacent to both `u` and `v` carrying exactly the color
/// `wanted`.
fn intersecting_colored(
    g: &RateGraph,
    u: Vertex,
    v: Vertex,
    colors: &ColorMap,
    wanted: Color,
) -> Result<BTreeSet<Vertex>> {
    let out_u = neighbors_colored(g, u, colors, wanted)?;
    let out_v = neighbors_colored(g, v, colors, wanted)?;
    Ok(out_u.intersection(&out_v).copied().collect())
}

/// Vertices adjacent to both `u` and `v` whose color differs from
/// `excluded`.
fn intersecting_excluding(
    g: &RateGraph,
    u: Vertex,
    v: Vertex,
    colors: &ColorMap,
    excluded: Color,
) -> Result<BTreeSet<Vertex>> {
    let out_u = neighbors_excluding(g, u, colors, excluded)?;
    let out_v = neighbors_excluding(g, v, colors, excluded)?;
    Ok(out_u.intersection(&out_v).copied().collect())
}

/// Find the minimum-weight directed triangle, the seed for the iterative
/// expansion.
///
/// Every vertex `u` is taken as the primary in turn and painted black;
/// each non-black out-neighbor `v` is painted gray, and each white common
/// neighbor `w` closes the candidate triangles `u->v->w->u` and
/// `u->w->v->u`. Colors are never reset between iterations - that
/// discipline is what keeps triangles from being re-evaluated, at the
/// price of an outer-order dependence in tie-breaking. Candidates whose
/// edges are missing are skipped silently.
///
/// Returns the empty path with `lrate = 0` when no negative triangle
/// exists.
#[must_use]
pub fn find_initial_simplex(g: &RateGraph) -> RatedPath {
    let mut colors = ColorMap::new(g.vertex_count());
    let mut best = 0.0;
    let mut best_simplex: Vec<Vertex> = Vec::new();

    for u in 0..g.vertex_count() {
        colors.set(u, Color::Black);
        let Ok(neighbors) = neighbors_excluding(g, u, &colors, Color::Black) else {
            continue;
        };
        for v in neighbors {
            colors.set(v, Color::Gray);
            let Ok(triangles) = intersecting_colored(g, u, v, &colors, Color::White) else {
                continue;
            };
            for w in triangles {
                for simplex in [[u, v, w], [u, w, v]] {
                    let Ok(rate) = evaluate_path(g, &simplex) else {
                        continue;
                    };
                    if rate < 0.0 {
                        trace!(
                            target: SCOPE,
                            "candidate [{}->{}->{}] lrate={rate}",
                            simplex[0], simplex[1], simplex[2]
                        );
                    }
                    if rate < best {
                        best = rate;
                        best_simplex = simplex.to_vec();
                    }
                }
            }
        }
    }

    RatedPath::new(best_simplex, best)
}

/// One expansion pass: between every consecutive pair `(u, v)` of the
/// cycle, look for a fresh vertex `w` whose detour `u->w->v` beats the
/// direct edge, and splice in the best one.
///
/// Cycle vertices are painted black; candidates are the non-black common
/// neighbors of `u` and `v`. The best split rate starts at 0, so only
/// strictly negative detours are ever candidates, and a splice is taken
/// only when it also beats the direct edge. Accepted vertices turn black
/// immediately, so one pass never uses a vertex twice.
///
/// # Errors
///
/// `InvalidVertex` / `InvalidPath` when the path does not fit the graph -
/// mutation between search calls is a caller error.
pub fn try_expand(g: &RateGraph, path: &[Vertex]) -> Result<RatedPath> {
    let mut colors = ColorMap::new(g.vertex_count());
    for &p in path {
        if p >= g.vertex_count() {
            return Err(Error::InvalidVertex(p));
        }
        colors.set(p, Color::Black);
    }

    let mut vertices: Vec<Vertex> = Vec::with_capacity(path.len());
    let mut new_rate = 0.0;
    for (i, &u) in path.iter().enumerate() {
        let v = path[(i + 1) % path.len()];
        let rate = g
            .weight(u, v)
            .ok_or_else(|| Error::InvalidPath(format!("invalid edge ({u},{v}) in path")))?;
        vertices.push(u);
        trace!(target: SCOPE, "Existing: [{u}->{v}] = {rate}");

        // Choose the best unvisited `w`.
        let mut candidate: Option<Vertex> = None;
        let mut c_rate = 0.0;
        for w in intersecting_excluding(g, u, v, &colors, Color::Black)? {
            let (Some(uw), Some(wv)) = (g.weight(u, w), g.weight(w, v)) else {
                continue;
            };
            let xrate = uw + wv;
            trace!(target: SCOPE, "Evaluating [{u}->{w}->{v}]: d = {}", xrate - c_rate);
            if xrate < c_rate {
                c_rate = xrate;
                candidate = Some(w);
            }
        }

        match candidate {
            Some(w) if c_rate < rate => {
                new_rate += c_rate;
                vertices.push(w);
                colors.set(w, Color::Black);
                info!(
                    target: SCOPE,
                    "growth: adding node {w} raised profits by {}",
                    -(c_rate - rate)
                );
            }
            _ => new_rate += rate,
        }
    }

    Ok(RatedPath::new(vertices, new_rate))
}

/// Compute the best path: seed with the minimum triangle, then expand
/// iteratively until the path stops growing or the iteration cap is
/// reached (a negative cap means "until fixpoint"). The result is in
/// closed form.
///
/// # Errors
///
/// Only if the graph is mutated while the search runs; see
/// [`try_expand`].
pub fn best_path(lg: &LabeledGraph, max_iterations: i64) -> Result<RatedPath> {
    let _lease = SinkLease::acquire();

    let mut rp = find_initial_simplex(&lg.graph);
    info!(target: SCOPE, "{}", describe_iteration(lg, &rp, 0, max_iterations));

    let mut c_iter: i64 = 0;
    loop {
        c_iter += 1;
        if max_iterations >= 0 && c_iter >= max_iterations {
            break;
        }
        let last_size = rp.path.len();
        rp = try_expand(&lg.graph, &rp.path)?;
        info!(target: SCOPE, "{}", describe_iteration(lg, &rp, c_iter, max_iterations));
        // Convergence
        if rp.path.len() == last_size {
            info!(target: SCOPE, "Convergence");
            break;
        }
    }

    rp.path = close_path(rp.path);
    Ok(rp)
}

fn describe_iteration(lg: &LabeledGraph, rp: &RatedPath, iter: i64, max_iterations: i64) -> String {
    let mut s = format!("Iteration {iter}");
    if max_iterations != -1 {
        s.push_str(&format!(" of {max_iterations}"));
    }
    let tour: Vec<&str> = rp
        .path
        .iter()
        .chain(rp.path.first())
        .map(|&v| lg.labels.get(v).map(String::as_str).unwrap_or("?"))
        .collect();
    s.push_str(&format!(": path=[{}] lrate={}", tour.join("->"), rp.lrate));
    s
}
