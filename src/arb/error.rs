use thiserror::Error;

use super::graph::Vertex;

/// Failure kinds surfaced by the graph engine.
///
/// The engine never retries or recovers silently: the pruner and the
/// reloader stop at the first hard failure, and any partial mutation is
/// left in place for the caller to re-run.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// An instrument name did not split into exactly two non-empty
    /// currency codes around a single underscore.
    #[error("invalid instrument `{0}`")]
    InvalidInstrument(String),

    /// A quote carried a non-positive or non-finite bid or ask.
    #[error("invalid rate for `{0}`: bid={1} ask={2}")]
    InvalidRate(String, f64, f64),

    /// A reload found a pre-existing edge in only one direction.
    #[error("edge between {0} and {1} exists in only one direction")]
    AsymmetricEdge(Vertex, Vertex),

    /// An operation referenced a vertex index outside the graph.
    #[error("vertex {0} does not exist")]
    InvalidVertex(Vertex),

    /// A path spans fewer than two vertices or crosses a missing edge.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A principal amount was non-positive.
    #[error("invalid principal {0}")]
    InvalidPrincipal(f64),

    /// The vertex index space is exhausted.
    #[error("vertex index space exhausted")]
    IndexOverflow,
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
