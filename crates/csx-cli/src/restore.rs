//! Restore command implementation for csx CLI.
//!
//! Generates the project for a script and restores its packages.

use std::path::Path;
use std::time::Instant;

use csx_core::{RestoreOutcome, ScriptEnvironment, ScriptPipeline};

use crate::colors;

/// Execute the restore command.
pub fn execute(env: &ScriptEnvironment, script: &Path, no_cache: bool) -> anyhow::Result<()> {
    let start = Instant::now();
    let pipeline = ScriptPipeline::new(env, !no_cache);

    let project = pipeline.synthesize(script)?;
    print!(
        "{}Restoring{} {} for {}... ",
        colors::CYAN,
        colors::RESET,
        project.dirs.manifest_path.display(),
        env.runtime_identifier()
    );
    colors::flush_stdout();

    match pipeline.restore(&project)? {
        RestoreOutcome::Restored => println!(
            "{}done{} in {:.2}s",
            colors::GREEN,
            colors::RESET,
            start.elapsed().as_secs_f64()
        ),
        RestoreOutcome::CacheHit => println!("{}cached{}", colors::YELLOW, colors::RESET),
    }

    Ok(())
}
