//! Run command implementation
//!
//! Snapshots a real directory into an in-memory file view, executes the entry
//! bundle of the graph and prints what it exported.

use std::sync::Arc;

use console::Style;
use tracing::debug;

use crate::cli::RunArgs;
use crate::commands::helpers;
use bundle_harness::error::{Result, fs};
use bundle_harness::{ExecuteOptions, Globals, GraphManifest, Harness, HarnessConfig, MemoryFs};

/// Run the run command
pub fn run(config: HarnessConfig, args: RunArgs) -> Result<()> {
    let graph = GraphManifest::from_file(&args.graph)?;

    let files = Arc::new(MemoryFs::new());
    let copied = files
        .load_dir(&args.root, &args.mount)
        .map_err(|e| fs::from_io(&args.root, &e))?;
    debug!(copied, mount = %args.mount.display(), "mounted output directory");

    let mut globals = Globals::new();
    for assignment in &args.globals {
        let (name, value) = Globals::parse_assignment(assignment)?;
        globals = globals.with_json(name, value);
    }

    let options = if args.raw {
        ExecuteOptions::raw()
    } else {
        ExecuteOptions::default()
    };

    let harness = Harness::new(files).with_config(config);
    let mut execution =
        futures_lite::future::block_on(harness.execute(&graph, globals, options))?;

    for message in execution.console() {
        eprintln!(
            "{} {}",
            Style::new().dim().apply_to(format!("[{}]", message.level)),
            message.text
        );
    }

    if args.raw {
        for name in execution.keys()? {
            println!("{}", name);
        }
    } else {
        let value = execution.to_json()?;
        println!("{}", helpers::pretty_json(&value)?);
    }

    Ok(())
}
