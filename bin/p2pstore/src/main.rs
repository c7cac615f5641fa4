//! p2pstore binary: operate on a node's local chunk store.

mod cli;
mod logging;

use clap::Parser;

fn main() -> eyre::Result<()> {
    let cli = cli::Cli::parse();
    logging::init_logging(&cli.log_args)?;
    cli.run()
}
