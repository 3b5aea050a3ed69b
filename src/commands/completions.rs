//! Shell completions command

use clap::CommandFactory;

use crate::cli::CompletionsArgs;
use bundle_harness::error::{Result, config};

/// Generate shell completions
pub fn run(args: CompletionsArgs) -> Result<()> {
    let shell = match args.shell.to_lowercase().as_str() {
        "bash" => clap_complete::Shell::Bash,
        "elvish" => clap_complete::Shell::Elvish,
        "fish" => clap_complete::Shell::Fish,
        "powershell" | "pwsh" => clap_complete::Shell::PowerShell,
        "zsh" => clap_complete::Shell::Zsh,
        _ => {
            return Err(config::invalid(format!(
                "unknown shell '{}' (supported: bash, elvish, fish, powershell, zsh)",
                args.shell
            )));
        }
    };

    let mut cmd = <crate::cli::Cli as CommandFactory>::command();
    clap_complete::generate(
        shell,
        &mut cmd,
        "bundle-harness",
        &mut std::io::stdout().lock(),
    );

    Ok(())
}
