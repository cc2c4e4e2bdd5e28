//! Restore through the `dotnet` CLI.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::environment::ScriptEnvironment;
use crate::error::{Error, Result};

use super::process::run_captured;
use super::{RestoreOutcome, Restorer};

/// Runs `dotnet restore "<manifest>" -r <rid> [--source <src> ...]`.
#[derive(Debug, Clone)]
pub struct DotnetRestorer {
    /// Tool name or path, resolved against PATH at call time.
    tool: String,

    /// Runtime identifier passed to every restore.
    runtime_identifier: String,

    /// Upper bound for one restore, `None` for no limit.
    timeout: Option<Duration>,
}

impl DotnetRestorer {
    pub fn new(env: &ScriptEnvironment) -> Self {
        Self {
            tool: env.restore_tool().to_string(),
            runtime_identifier: env.runtime_identifier().to_string(),
            timeout: env.restore_timeout(),
        }
    }

    /// Arguments for one restore invocation.
    pub fn restore_args(&self, manifest_path: &Path, package_sources: &[String]) -> Vec<String> {
        let mut args = vec![
            "restore".to_string(),
            manifest_path.display().to_string(),
            "-r".to_string(),
            self.runtime_identifier.clone(),
        ];
        for source in package_sources {
            args.push("--source".to_string());
            args.push(source.clone());
        }
        args
    }

    fn tool_path(&self) -> PathBuf {
        which::which(&self.tool).unwrap_or_else(|_| PathBuf::from(&self.tool))
    }
}

impl Restorer for DotnetRestorer {
    fn restore(&self, manifest_path: &Path, package_sources: &[String]) -> Result<RestoreOutcome> {
        let tool = self.tool_path();
        let args = self.restore_args(manifest_path, package_sources);
        tracing::debug!("Running {} {}", tool.display(), args.join(" "));

        let mut cmd = Command::new(&tool);
        cmd.args(&args);
        if let Some(dir) = manifest_path.parent() {
            cmd.current_dir(dir);
        }

        let captured = run_captured(&mut cmd, self.timeout).map_err(|e| Error::Restore {
            manifest: manifest_path.to_path_buf(),
            output: format!("failed to run {}: {}", tool.display(), e),
        })?;

        if captured.timed_out() {
            return Err(Error::RestoreTimeout {
                manifest: manifest_path.to_path_buf(),
                timeout: self.timeout.unwrap_or_default(),
            });
        }

        if !captured.success() {
            return Err(Error::Restore {
                manifest: manifest_path.to_path_buf(),
                output: captured.output,
            });
        }

        tracing::debug!("{}", captured.output.trim_end());
        Ok(RestoreOutcome::Restored)
    }

    fn can_restore(&self) -> bool {
        let Ok(tool) = which::which(&self.tool) else {
            tracing::debug!("{} not found in PATH", self.tool);
            return false;
        };

        Command::new(tool)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn env_with_tool(tool: &Path) -> ScriptEnvironment {
        ScriptEnvironment::detect()
            .with_runtime_identifier("linux-x64")
            .with_restore_tool(tool.display().to_string())
            .with_restore_timeout(Some(Duration::from_secs(30)))
    }

    #[cfg(unix)]
    fn fake_tool(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-dotnet");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[test]
    fn test_restore_args_include_rid_and_sources() {
        let env = ScriptEnvironment::detect().with_runtime_identifier("win10-x64");
        let restorer = DotnetRestorer::new(&env);

        let args = restorer.restore_args(
            Path::new("/tmp/script.csproj"),
            &["https://a.example/v3/index.json".to_string(), "/local/feed".to_string()],
        );

        assert_eq!(
            args,
            vec![
                "restore",
                "/tmp/script.csproj",
                "-r",
                "win10-x64",
                "--source",
                "https://a.example/v3/index.json",
                "--source",
                "/local/feed",
            ]
        );
    }

    #[test]
    fn test_missing_tool_cannot_restore() {
        let env = ScriptEnvironment::detect().with_restore_tool("definitely-not-a-dotnet-tool");
        assert!(!DotnetRestorer::new(&env).can_restore());
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_carries_tool_output() {
        let temp = TempDir::new().unwrap();
        let tool = fake_tool(
            temp.path(),
            "echo \"error NU1101: Unable to find package No.Such.Package.\" 1>&2\nexit 1",
        );
        let restorer = DotnetRestorer::new(&env_with_tool(&tool));

        let err = restorer
            .restore(&temp.path().join("script.csproj"), &[])
            .unwrap_err();

        match err {
            Error::Restore { output, manifest } => {
                assert!(output.contains("NU1101"));
                assert!(manifest.ends_with("script.csproj"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_success_and_availability() {
        let temp = TempDir::new().unwrap();
        let tool = fake_tool(temp.path(), "echo \"$@\" > \"$(dirname \"$0\")/args.txt\"\nexit 0");
        let restorer = DotnetRestorer::new(&env_with_tool(&tool));

        assert!(restorer.can_restore());

        let outcome = restorer
            .restore(&temp.path().join("script.csproj"), &["/feed".to_string()])
            .unwrap();
        assert_eq!(outcome, RestoreOutcome::Restored);

        let recorded = fs::read_to_string(temp.path().join("args.txt")).unwrap();
        assert!(recorded.contains("-r linux-x64"));
        assert!(recorded.contains("--source /feed"));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_is_distinct_error() {
        let temp = TempDir::new().unwrap();
        let tool = fake_tool(temp.path(), "sleep 10");
        let env = env_with_tool(&tool).with_restore_timeout(Some(Duration::from_millis(200)));

        let err = DotnetRestorer::new(&env)
            .restore(&temp.path().join("script.csproj"), &[])
            .unwrap_err();

        assert!(matches!(err, Error::RestoreTimeout { .. }));
    }
}
