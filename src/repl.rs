/*!
 * # Command Shell
 *
 * The interactive harness around the engine. Commands mirror the data
 * flow: fetch instruments, prune them, fetch rates, load the graph,
 * search it, evaluate principals. Each stage checkpoints what it
 * produced so later stages can refuse to run on missing input, and
 * `getvar` exposes every intermediate for inspection.
 *
 * | command        | effect                                             |
 * |----------------|----------------------------------------------------|
 * | `setd <spec>`  | set debug levels, e.g. `graph:reload=t,pruner=i`   |
 * | `instr`        | fetch the raw instrument list                      |
 * | `prune`        | keep only instruments that can lie on a cycle      |
 * | `rates`        | fetch rates for the pruned instruments             |
 * | `gload`        | reload the graph from the rates                    |
 * | `gsearch [N]`  | search, expanding up to `N` times (`-1` unbounded) |
 * | `eval x1 x2 …` | revenue/profit per principal                       |
 * | `getvar <name>`| print an intermediate                              |
 */

use eyre::{bail, Result};
use log::info;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::arb::evaluate::evaluate_all;
use crate::arb::graph::LabeledGraph;
use crate::arb::pruner::prune;
use crate::arb::rate::Rate;
use crate::arb::reload::reload;
use crate::arb::search::{best_path, RatedPath};
use crate::config::Config;
use crate::debug;
use crate::fetch;

const SCOPE: &str = "repl";

/// Which pipeline intermediates have been produced so far.
#[derive(Clone, Copy, Debug, Default)]
struct Checkpoints {
    instr: bool,
    pruned: bool,
    rates: bool,
    graph: bool,
    path: bool,
}

impl Checkpoints {
    fn need(flag: bool, what: &str) -> Result<()> {
        if flag {
            Ok(())
        } else {
            bail!("need {what}")
        }
    }

    /// One marker per stage, `-` where the stage has not run.
    fn render(&self) -> String {
        [
            (self.instr, 'I'),
            (self.pruned, 'P'),
            (self.rates, 'R'),
            (self.graph, 'G'),
            (self.path, 'X'),
        ]
        .iter()
        .map(|&(set, mark)| if set { mark } else { '-' })
        .map(String::from)
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Shell state: the pipeline intermediates flowing between commands.
pub struct Session {
    config: Config,
    instruments: Vec<String>,
    pruned: Vec<String>,
    rates: Vec<Rate>,
    graph: LabeledGraph,
    best: RatedPath,
    have: Checkpoints,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            instruments: Vec::new(),
            pruned: Vec::new(),
            rates: Vec::new(),
            graph: LabeledGraph::new(),
            best: RatedPath::default(),
            have: Checkpoints::default(),
        }
    }

    /// Dispatch one command line. `Ok(Some(_))` carries output to print;
    /// commands that only advance the pipeline return `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Any argument or pipeline failure; the session state stays usable.
    pub async fn dispatch(&mut self, line: &str) -> Result<Option<String>> {
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = parts.collect();

        match command {
            "setd" => self.set_dlevel(&args),
            "instr" => self.update_instruments().await,
            "prune" => self.update_pruned(),
            "rates" => self.update_rates().await,
            "gload" => self.load_graph(),
            "gsearch" => self.search_graph(&args),
            "eval" => self.eval_rates(&args),
            "getvar" => self.get_var(&args),
            other => bail!("bad cmd: {other}"),
        }
    }

    fn set_dlevel(&mut self, args: &[&str]) -> Result<Option<String>> {
        let Some(spec) = args.first() else {
            bail!("tokenization error");
        };
        debug::set_from_spec(spec)?;
        Ok(None)
    }

    async fn update_instruments(&mut self) -> Result<Option<String>> {
        self.instruments = fetch::instruments::list(&self.config).await?;
        self.have.instr = true;
        Ok(None)
    }

    fn update_pruned(&mut self) -> Result<Option<String>> {
        Checkpoints::need(self.have.instr, "instruments")?;
        self.pruned = prune(&self.instruments)?;
        self.have.pruned = true;
        Ok(None)
    }

    async fn update_rates(&mut self) -> Result<Option<String>> {
        Checkpoints::need(self.have.pruned, "pruned")?;
        self.rates = fetch::rates::get(&self.config, &self.pruned).await?;
        self.have.rates = true;
        Ok(None)
    }

    fn load_graph(&mut self) -> Result<Option<String>> {
        Checkpoints::need(self.have.rates, "rates")?;
        let _report = reload(&mut self.graph, &self.rates)?;
        self.have.graph = true;
        Ok(None)
    }

    fn search_graph(&mut self, args: &[&str]) -> Result<Option<String>> {
        Checkpoints::need(self.have.graph, "graph")?;
        // A missing or malformed count falls back to "until fixpoint".
        let cap: i64 = args.first().and_then(|a| a.parse().ok()).unwrap_or(-1);
        self.best = best_path(&self.graph, cap)?;
        self.have.path = true;
        Ok(None)
    }

    fn eval_rates(&mut self, args: &[&str]) -> Result<Option<String>> {
        Checkpoints::need(self.have.path, "path")?;
        let principals: Vec<f64> = args
            .iter()
            .map(|a| a.parse())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| eyre::eyre!("tokenization error"))?;
        let out = evaluate_all(&principals, self.best.lrate)?
            .iter()
            .map(|e| format!("[{}, {}]", e.revenue, e.profit))
            .collect::<Vec<_>>()
            .join(" ");
        Ok(Some(out))
    }

    fn get_var(&self, args: &[&str]) -> Result<Option<String>> {
        let Some(name) = args.first() else {
            bail!("tokenization error");
        };
        let out = match *name {
            "instr" => self.instruments.join(" "),
            "pruned" => self.pruned.join(" "),
            "ratelist" => self
                .rates
                .iter()
                .map(Rate::to_string)
                .collect::<Vec<_>>()
                .join(" "),
            "graph" => self.graph.to_string(),
            "path" => self
                .best
                .path
                .iter()
                .map(|&v| self.graph.labels.get(v).map(String::as_str).unwrap_or("?"))
                .collect::<Vec<_>>()
                .join("->"),
            "lrate" => self.best.lrate.to_string(),
            // I_ is for internals
            "I_isset" => self.have.render(),
            other => bail!("bad var: {other}"),
        };
        Ok(Some(out))
    }
}

/// Run the command loop over stdin until end of input.
///
/// # Errors
///
/// Only on a broken stdin; command failures are printed and the loop
/// continues.
pub async fn run(config: Config) -> Result<()> {
    info!(target: SCOPE, "command loop started");
    let mut session = Session::new(config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match session.dispatch(line.trim()).await {
            Ok(Some(out)) => println!("{out}"),
            Ok(None) => {}
            Err(e) => println!("Argument error: {e}"),
        }
    }
    Ok(())
}
