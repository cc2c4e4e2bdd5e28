//! Graph command implementation for csx CLI.
//!
//! Prints the entry script and every file it pulls in through `#load`.

use std::path::Path;

use csx_core::collect_references;
use csx_core::resolve_script_graph;

use crate::colors;

/// Execute the graph command.
pub fn execute(script: &Path) -> anyhow::Result<()> {
    let graph = resolve_script_graph(&[script])?;
    let collected = collect_references(&graph)?;

    for (i, file) in graph.iter().enumerate() {
        if i == 0 {
            println!("{}{}{}", colors::BOLD, file.display(), colors::RESET);
        } else {
            println!("  {}", file.display());
        }
    }

    let mut packages: Vec<_> = collected
        .package_references
        .iter()
        .map(|reference| reference.to_string())
        .collect();
    packages.sort();

    if !packages.is_empty() {
        println!("\n{}Packages:{}", colors::BOLD, colors::RESET);
        for package in packages {
            println!("  {}", package);
        }
    }

    if let Some(framework) = collected.target_framework {
        println!("\n{}Framework:{} {}", colors::DIM, colors::RESET, framework);
    }

    Ok(())
}
