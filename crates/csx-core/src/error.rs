//! Error types for csx-core.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type for csx-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in csx-core.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A script file referenced from the graph could not be read.
    #[error("failed to read script {}: {source}", path.display())]
    ScriptRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a project manifest.
    #[error("parse error: {0}")]
    Parse(String),

    /// The external restore tool exited with a non-zero status.
    #[error("restore failed for {}:\n{output}", manifest.display())]
    Restore { manifest: PathBuf, output: String },

    /// The external restore tool did not finish in time.
    #[error("restore of {} timed out after {}s", manifest.display(), timeout.as_secs())]
    RestoreTimeout { manifest: PathBuf, timeout: Duration },

    /// None of the configured restorers is available on this machine.
    #[error("no restorer available: {0}")]
    NoRestorer(String),

    /// The lock artifact produced by restore is missing or unreadable.
    #[error("lock artifact not found at {}", path.display())]
    MissingLockArtifact { path: PathBuf },

    /// The lock artifact has no runtime-qualified target.
    #[error(
        "no runtime-specific target found in {}; restore with an explicit runtime identifier (-r {runtime_identifier})",
        path.display()
    )]
    MissingRuntimeTarget {
        path: PathBuf,
        runtime_identifier: String,
    },

    /// The lock artifact references a file that is not on disk.
    #[error("dependency {dependency} references missing file {}", path.display())]
    MissingAsset { dependency: String, path: PathBuf },

    /// The lock artifact could not be deserialized.
    #[error("invalid lock artifact {}: {source}", path.display())]
    LockArtifact {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Failed to load a native asset.
    #[error("failed to load native asset: {0}")]
    NativeLoad(#[from] libloading::Error),

    /// Compilation failed in the external compiler service.
    #[error("compilation failed: {0}")]
    Compilation(String),
}

impl Error {
    /// Render the error together with a recovery hint, when one applies.
    pub fn with_hint(&self) -> String {
        let hint = match self {
            Error::MissingAsset { .. } => Some(
                "the global package cache may be stale; try again with --no-cache",
            ),
            Error::MissingRuntimeTarget { .. } => {
                Some("run the restore with a runtime identifier (dotnet restore -r <rid>)")
            }
            Error::MissingLockArtifact { .. } => {
                Some("the restore did not produce project.assets.json; try again with --no-cache")
            }
            Error::NoRestorer(_) => Some("install the .NET SDK and make sure `dotnet` is on PATH"),
            Error::RestoreTimeout { .. } => Some("raise the limit with --restore-timeout"),
            _ => None,
        };

        match hint {
            Some(hint) => format!("{self}\n\nhint: {hint}"),
            None => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_runtime_target_message() {
        let err = Error::MissingRuntimeTarget {
            path: PathBuf::from("/tmp/obj/project.assets.json"),
            runtime_identifier: "linux-x64".to_string(),
        };

        let message = err.to_string();
        assert!(message.contains("explicit runtime identifier"));
        assert!(message.contains("-r linux-x64"));
    }

    #[test]
    fn test_hint_for_missing_asset() {
        let err = Error::MissingAsset {
            dependency: "Newtonsoft.Json".to_string(),
            path: PathBuf::from("/packages/newtonsoft.json/12.0.3/lib/Newtonsoft.Json.dll"),
        };

        let rendered = err.with_hint();
        assert!(rendered.contains("Newtonsoft.Json"));
        assert!(rendered.contains("--no-cache"));
    }

    #[test]
    fn test_no_hint_for_parse_error() {
        let err = Error::Parse("bad".to_string());
        assert_eq!(err.with_hint(), "parse error: bad");
    }
}
