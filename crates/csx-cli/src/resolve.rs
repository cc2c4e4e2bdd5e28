//! Resolve command implementation for csx CLI.
//!
//! Restores a script and prints what the compiler would be given.

use std::path::Path;

use csx_core::{CompilationRequest, ResolvedDependencySet, ScriptEnvironment, ScriptPipeline};
use serde::Serialize;

use crate::colors;

#[derive(Serialize)]
struct Report<'a> {
    request: &'a CompilationRequest,
    resolved: &'a ResolvedDependencySet,
}

/// Execute the resolve command.
pub fn execute(
    env: &ScriptEnvironment,
    script: &Path,
    no_cache: bool,
    json: bool,
) -> anyhow::Result<()> {
    let pipeline = ScriptPipeline::new(env, !no_cache);

    let project = pipeline.synthesize(script)?;
    let outcome = pipeline.restore(&project)?;
    tracing::debug!("Restore outcome: {:?}", outcome);

    let resolved = pipeline.resolve(&project)?;
    let request = pipeline.compilation_request(&project, &resolved);

    if json {
        let report = Report {
            request: &request,
            resolved: &resolved,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_section("References", request.references.iter().map(|p| p.display().to_string()));
    print_section(
        "Runtime assemblies",
        resolved
            .runtime_assemblies()
            .iter()
            .map(|a| format!("{} {} {}{}{}", a.name, a.version, colors::DIM, a.path.display(), colors::RESET)),
    );
    print_section("Native assets", resolved.native_assets().iter().map(|p| p.display().to_string()));
    print_section("Scripts", request.script_files.iter().map(|p| p.display().to_string()));

    Ok(())
}

fn print_section(title: &str, lines: impl Iterator<Item = String>) {
    let lines: Vec<String> = lines.collect();
    if lines.is_empty() {
        return;
    }
    println!("{}{}:{}", colors::BOLD, title, colors::RESET);
    for line in lines {
        println!("  {}", line);
    }
}
