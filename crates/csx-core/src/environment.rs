//! Host environment for the resolution pipeline.
//!
//! A [`ScriptEnvironment`] is built once at startup and passed by reference
//! into every stage. It carries the platform facts (runtime identifier,
//! operating system) and the user-facing configuration (cache root, package
//! sources, restore tool, timeout).

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Target framework used when no script declares one.
pub const DEFAULT_TARGET_FRAMEWORK: &str = "net8.0";

/// Default upper bound for one restore run.
pub const DEFAULT_RESTORE_TIMEOUT: Duration = Duration::from_secs(600);

/// Operating system family of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Windows,
    Linux,
    MacOs,
    Other,
}

impl OsFamily {
    /// The family this binary was compiled for.
    pub fn current() -> Self {
        match std::env::consts::OS {
            "windows" => Self::Windows,
            "linux" => Self::Linux,
            "macos" => Self::MacOs,
            _ => Self::Other,
        }
    }
}

/// Immutable configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct ScriptEnvironment {
    runtime_identifier: String,
    target_framework: String,
    os: OsFamily,
    cache_root: PathBuf,
    package_sources: Vec<String>,
    restore_tool: String,
    restore_timeout: Option<Duration>,
}

impl ScriptEnvironment {
    /// Detect the host platform and use default settings.
    pub fn detect() -> Self {
        Self {
            runtime_identifier: host_runtime_identifier(),
            target_framework: DEFAULT_TARGET_FRAMEWORK.to_string(),
            os: OsFamily::current(),
            cache_root: std::env::temp_dir().join("csx-host"),
            package_sources: Vec::new(),
            restore_tool: "dotnet".to_string(),
            restore_timeout: Some(DEFAULT_RESTORE_TIMEOUT),
        }
    }

    pub fn with_runtime_identifier(mut self, rid: impl Into<String>) -> Self {
        self.runtime_identifier = rid.into();
        self
    }

    pub fn with_target_framework(mut self, tfm: impl Into<String>) -> Self {
        self.target_framework = tfm.into();
        self
    }

    pub fn with_cache_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache_root = root.into();
        self
    }

    pub fn with_package_sources(mut self, sources: Vec<String>) -> Self {
        self.package_sources = sources;
        self
    }

    pub fn with_restore_tool(mut self, tool: impl Into<String>) -> Self {
        self.restore_tool = tool.into();
        self
    }

    /// `None` lets restore run without a time limit.
    pub fn with_restore_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.restore_timeout = timeout;
        self
    }

    pub fn runtime_identifier(&self) -> &str {
        &self.runtime_identifier
    }

    /// Framework moniker used when the scripts don't declare one.
    pub fn target_framework(&self) -> &str {
        &self.target_framework
    }

    pub fn os(&self) -> OsFamily {
        self.os
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn package_sources(&self) -> &[String] {
        &self.package_sources
    }

    pub fn restore_tool(&self) -> &str {
        &self.restore_tool
    }

    pub fn restore_timeout(&self) -> Option<Duration> {
        self.restore_timeout
    }
}

/// Runtime identifier for the compilation target, e.g. `linux-x64`.
pub fn host_runtime_identifier() -> String {
    let os = match std::env::consts::OS {
        "windows" => "win",
        "macos" => "osx",
        "linux" if cfg!(target_env = "musl") => "linux-musl",
        "linux" => "linux",
        "freebsd" => "freebsd",
        _ => "unix",
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "x64",
        "x86" => "x86",
        "aarch64" => "arm64",
        "arm" => "arm",
        "s390x" => "s390x",
        "powerpc64" => "ppc64le",
        other => other,
    };
    format!("{}-{}", os, arch)
}
