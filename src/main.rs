//! bundle-harness - sandboxed execution harness for module bundler output
//!
//! Runs the entry bundle of a bundle graph over a snapshot of the output
//! directory, or asserts how the graph was split into bundles.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::helpers;

/// Install the log subscriber; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => helpers::load_config(cli.config.as_deref())
            .and_then(|config| commands::run::run(config, args)),
        Commands::Check(args) => commands::check::run(args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
