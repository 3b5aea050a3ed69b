//! CLI definitions using clap derive API

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// bundle-harness - run bundler output in a sandbox
///
/// Execute the entry bundle of a bundle graph and inspect what it exported, or
/// check how the graph was split into bundles.
#[derive(Parser, Debug)]
#[command(
    name = "bundle-harness",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Sandboxed execution harness for module bundler output",
    long_about = "bundle-harness executes bundler output in a browser, node or electron flavored \
                  context over a snapshot of the output directory, and asserts bundle layouts.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n    \
                  bundle-harness run graph.yaml --root dist --mount /dist\n    \
                  bundle-harness run graph.yaml --global 'API_URL=\"http://test\"'\n    \
                  bundle-harness check graph.yaml expected.yaml"
)]
pub struct Cli {
    /// Harness configuration file (YAML or JSON)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute the entry bundle of a graph
    Run(RunArgs),

    /// Assert the bundle layout of a graph
    Check(CheckArgs),

    /// Show version information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Run the entry bundle with dist/ mounted at the root:\n    bundle-harness run graph.yaml --root dist\n\n\
                  Mount the output somewhere else:\n    bundle-harness run graph.yaml --root dist --mount /out\n\n\
                  Provide globals:\n    bundle-harness run graph.yaml --global 'DEBUG=true' --global 'NAME=\"x\"'\n\n\
                  Print the context's binding names instead of the export:\n    bundle-harness run graph.yaml --raw")]
pub struct RunArgs {
    /// Bundle graph manifest (YAML or JSON)
    pub graph: PathBuf,

    /// Directory snapshotted into the virtual file view
    #[arg(long, short = 'r', default_value = ".")]
    pub root: PathBuf,

    /// Virtual path the root directory is mounted at
    #[arg(long, short = 'm', default_value = "/")]
    pub mount: PathBuf,

    /// Extra global as NAME=JSON (repeatable)
    #[arg(long = "global", short = 'g', value_name = "NAME=JSON")]
    pub globals: Vec<String>,

    /// Skip export extraction and report the context object itself
    #[arg(long)]
    pub raw: bool,
}

/// Arguments for the check command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Check a layout:\n    bundle-harness check graph.yaml expected.yaml")]
pub struct CheckArgs {
    /// Bundle graph manifest (YAML or JSON)
    pub graph: PathBuf,

    /// Expected layout: a list of {name?, type?, assets} (YAML or JSON)
    pub expected: PathBuf,
}

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    bundle-harness completions --shell bash > ~/.bash_completion.d/bundle-harness\n\n\
                  Generate zsh completions:\n    bundle-harness completions --shell zsh > ~/.zfunc/_bundle-harness\n\n\
                  Generate fish completions:\n    bundle-harness completions --shell fish > ~/.config/fish/completions/bundle-harness.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    #[arg(long)]
    pub shell: String,
}
