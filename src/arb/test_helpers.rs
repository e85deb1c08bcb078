use super::graph::LabeledGraph;
use super::rate::Rate;
use super::reload::reload;

#[allow(dead_code)]
pub fn rates(args: &[(&str, f64, f64)]) -> Vec<Rate> {
    args.iter()
        .map(|(instrument, bid, ask)| Rate::new(*instrument, *bid, *ask))
        .collect()
}

/// A symmetric triangle over {A, B, C} where every quote is 0.5. The
/// reverse tour A->C->B->A carries log-rate `3 * ln 0.5`.
#[allow(dead_code)]
pub fn triangle_rates() -> Vec<Rate> {
    rates(&[("A_B", 0.5, 0.5), ("B_C", 0.5, 0.5), ("C_A", 0.5, 0.5)])
}

#[allow(dead_code)]
pub fn graph_from(args: &[(&str, f64, f64)]) -> LabeledGraph {
    let mut lg = LabeledGraph::new();
    reload(&mut lg, &rates(args)).unwrap();
    lg
}
