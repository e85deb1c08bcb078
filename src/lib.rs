/*!
 * # Gyre - Currency Arbitrage Cycle Search
 *
 * Gyre searches a directed, weighted graph of currency exchange rates for a
 * profitable closed cycle: a sequence of trades whose net rate yields a
 * positive return. Bid/ask quotes become log-rate edge weights, so a
 * profitable cycle is exactly a negative-weight directed cycle.
 *
 * ## Core Features
 *
 * - **Incremental reload**: rebuilds the rate graph from a fresh snapshot
 *   while reporting exactly which vertices and edges changed
 * - **Pruning**: drops instruments whose currencies cannot lie on any cycle
 * - **Cycle search**: a triangle sweep followed by iterative expansion that
 *   splices vertices into the cycle while the total log-rate keeps falling
 * - **Evaluation**: turns a cycle log-rate into revenue and profit figures
 *
 * ## Module Structure
 *
 * - `arb`: Core graph engine - rates, labeled graph, pruner, reload, search
 * - `config`: Configuration management for the process
 * - `debug`: Scoped debug levels and the log sink they control
 * - `fetch`: HTTP fetchers for instrument lists and rate snapshots
 * - `repl`: The interactive command shell driving the pipeline
 * - `utils`: Utility functions and helpers
 */

/// Core arbitrage graph engine
pub mod arb;
/// Configuration management for the process
pub mod config;
/// Scoped debug levels and sink control
pub mod debug;
/// HTTP fetchers for instruments and rates
pub mod fetch;
/// Interactive command shell
pub mod repl;
/// Utility functions and helpers
pub mod utils;
