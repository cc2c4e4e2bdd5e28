//! csx CLI - dependency resolution for C# scripts.

mod clean;
mod colors;
mod graph;
mod resolve;
mod restore;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use csx_core::ScriptEnvironment;

#[derive(Parser)]
#[command(name = "csx")]
#[command(about = "Resolve NuGet references of C# scripts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    settings: Settings,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Options that shape the script environment.
#[derive(Args)]
struct Settings {
    /// Additional package source (repeatable)
    #[arg(short, long = "source", global = true)]
    sources: Vec<String>,

    /// Directory for generated projects
    #[arg(long, global = true, env = "CSX_CACHE_ROOT")]
    cache_root: Option<PathBuf>,

    /// Target framework when no script declares one
    #[arg(short, long, global = true, env = "CSX_TARGET_FRAMEWORK")]
    framework: Option<String>,

    /// Runtime identifier to restore for (defaults to the host)
    #[arg(short, long, global = true)]
    runtime: Option<String>,

    /// Restore tool to run instead of `dotnet`
    #[arg(long, global = true, env = "CSX_RESTORE_TOOL", value_name = "PATH")]
    restore_tool: Option<String>,

    /// Restore timeout in seconds, 0 disables the limit
    #[arg(long, global = true, value_name = "SECONDS")]
    restore_timeout: Option<u64>,
}

impl Settings {
    fn environment(self) -> ScriptEnvironment {
        let mut env = ScriptEnvironment::detect().with_package_sources(self.sources);
        if let Some(root) = self.cache_root {
            env = env.with_cache_root(root);
        }
        if let Some(framework) = self.framework {
            env = env.with_target_framework(framework);
        }
        if let Some(rid) = self.runtime {
            env = env.with_runtime_identifier(rid);
        }
        if let Some(tool) = self.restore_tool {
            env = env.with_restore_tool(tool);
        }
        if let Some(secs) = self.restore_timeout {
            env = env.with_restore_timeout((secs > 0).then(|| Duration::from_secs(secs)));
        }
        env
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print every script reachable from an entry script
    Graph {
        /// Path to the entry script (.csx file)
        script: PathBuf,
    },

    /// Generate the project for a script and restore its packages
    Restore {
        /// Path to the entry script (.csx file)
        script: PathBuf,

        /// Restore even when the cached manifest matches
        #[arg(long)]
        no_cache: bool,
    },

    /// Restore and print the resolved references
    Resolve {
        /// Path to the entry script (.csx file)
        script: PathBuf,

        /// Restore even when the cached manifest matches
        #[arg(long)]
        no_cache: bool,

        /// Print the compilation request as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove every generated project
    Clean,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Helper to format csx-core errors with recovery hints
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        if let Some(csx_err) = err.downcast_ref::<csx_core::Error>() {
            anyhow::anyhow!("{}", csx_err.with_hint())
        } else {
            err
        }
    };

    let env = cli.settings.environment();
    tracing::debug!(
        "Runtime {}, framework {}, cache root {}",
        env.runtime_identifier(),
        env.target_framework(),
        env.cache_root().display()
    );

    match cli.command {
        Commands::Graph { script } => graph::execute(&script).map_err(format_error)?,

        Commands::Restore { script, no_cache } => {
            restore::execute(&env, &script, no_cache).map_err(format_error)?;
        }

        Commands::Resolve {
            script,
            no_cache,
            json,
        } => {
            resolve::execute(&env, &script, no_cache, json).map_err(format_error)?;
        }

        Commands::Clean => clean::execute(&env).map_err(format_error)?,
    }

    Ok(())
}
