/*!
 * # Arbitrage Module
 *
 * This module contains the core logic for finding profitable trading
 * cycles in a graph of currency exchange rates. Bid/ask quotes become a
 * pair of directed log-rate edges per instrument; a cycle whose weights
 * sum to a negative value is profitable.
 *
 * ## Key Components
 *
 * - `rate`: The immutable bid/ask quote record and instrument-name parsing
 * - `graph`: The labeled directed graph with dense, compacting vertex indices
 * - `pruner`: Drops instruments whose currencies cannot lie on any cycle
 * - `reload`: Rebuilds the graph from a fresh rate snapshot, reporting the diff
 * - `search`: Triangle sweep and iterative expansion over the rate graph
 * - `evaluate`: Revenue and profit figures for a cycle log-rate
 * - `error`: Typed failure kinds shared by the engine
 */

/// Typed failure kinds shared by the engine
pub mod error;
/// Revenue/profit evaluation of a cycle log-rate
pub mod evaluate;
/// Labeled directed rate graph
pub mod graph;
/// Instrument pruning to the cycle-bearing subgraph
pub mod pruner;
/// Bid/ask quote record
pub mod rate;
/// Snapshot reload and change reporting
pub mod reload;
/// Negative-cycle search
pub mod search;
/// Helpers for testing
mod test_helpers;
