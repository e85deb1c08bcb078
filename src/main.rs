use clap::Parser;
use eyre::Result;

use gyre::config::Config;
use gyre::debug;
use gyre::repl;
use gyre::utils::logger::setup_logger;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Debug level spec, e.g. `graph:reload=t,pruner=i` or a bare level
    #[arg(short = 'd', value_name = "SPEC")]
    debug: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logger()?;
    if let Some(spec) = &cli.debug {
        debug::set_from_spec(spec)?;
    }

    repl::run(Config::from_env()).await
}
