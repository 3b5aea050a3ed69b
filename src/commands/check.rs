//! Check command implementation

use console::Style;

use crate::cli::CheckArgs;
use bundle_harness::error::Result;
use bundle_harness::layout::{self, ExpectedBundle};
use bundle_harness::{GraphManifest, assert_bundle_layout};

/// Run the check command
pub fn run(args: CheckArgs) -> Result<()> {
    let graph = GraphManifest::from_file(&args.graph)?;
    let expected = ExpectedBundle::list_from_file(&args.expected)?;

    let actual = layout::actual_layout(&graph);
    println!("Bundles ({}):", actual.len());
    for bundle in &actual {
        println!(
            "  {} {}",
            Style::new().bold().yellow().apply_to(&bundle.name),
            Style::new().dim().apply_to(format!("({})", bundle.bundle_type))
        );
        for asset in &bundle.assets {
            println!("    {}", asset);
        }
    }
    println!();

    assert_bundle_layout(&graph, &expected)?;
    println!(
        "{} layout matches {} expected bundles",
        Style::new().green().bold().apply_to("✓"),
        expected.len()
    );

    Ok(())
}
