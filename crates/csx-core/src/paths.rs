//! Generated project directory management.
//!
//! Every script directory maps to one deterministic project directory under
//! the cache root, so repeated runs of the same script reuse the same
//! manifest and cache file:
//!
//! ```text
//! <cache_root>/
//! └── home/me/scripts/       # script directory, root stripped
//!     └── net8.0/            # target framework
//!         ├── script.csproj
//!         ├── script.csproj.cache
//!         └── obj/
//!             └── project.assets.json
//! ```

use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::Result;

/// File name of the generated project manifest.
pub const MANIFEST_FILE_NAME: &str = "script.csproj";

/// Extension appended to the manifest path for the cached copy.
pub const CACHE_EXTENSION: &str = "cache";

/// Directory layout for the generated project of one script directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDirs {
    /// Directory holding the generated project.
    pub project_dir: PathBuf,

    /// The generated manifest.
    pub manifest_path: PathBuf,

    /// Cached copy of the last successfully restored, fully pinned manifest.
    pub cache_path: PathBuf,

    /// Lock artifact written by restore.
    pub assets_path: PathBuf,
}

impl ScriptDirs {
    /// Compute the layout for `script_dir` without touching the filesystem.
    ///
    /// # Arguments
    /// * `cache_root` - Root for all generated projects
    /// * `script_dir` - Absolute directory of the entry script
    /// * `target_framework` - Framework moniker the project targets
    pub fn for_script_dir(cache_root: &Path, script_dir: &Path, target_framework: &str) -> Self {
        let project_dir = cache_root
            .join(strip_root(script_dir))
            .join(target_framework);
        Self::from_project_dir(project_dir)
    }

    /// Layout rooted at an explicit project directory.
    pub fn from_project_dir(project_dir: PathBuf) -> Self {
        let manifest_path = project_dir.join(MANIFEST_FILE_NAME);
        let cache_path = cache_path_for(&manifest_path);
        let assets_path = project_dir.join("obj").join("project.assets.json");

        Self {
            project_dir,
            manifest_path,
            cache_path,
            assets_path,
        }
    }

    /// Create the project directory if it doesn't exist.
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.project_dir)?;
        Ok(())
    }

    /// Remove the generated project, including restore output and cache.
    pub fn clean(&self) -> Result<()> {
        if self.project_dir.exists() {
            fs::remove_dir_all(&self.project_dir)?;
        }
        Ok(())
    }
}

/// `<manifest>.cache` next to the manifest.
pub fn cache_path_for(manifest_path: &Path) -> PathBuf {
    let mut name = manifest_path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".");
    name.push(CACHE_EXTENSION);
    manifest_path.with_file_name(name)
}

/// Make an absolute path relative by dropping its root.
///
/// A Windows drive prefix keeps its letter and loses the colon, so
/// `C:\work\scripts` becomes `C\work\scripts`.
fn strip_root(path: &Path) -> PathBuf {
    let mut relative = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => {
                let text = prefix.as_os_str().to_string_lossy().replace(':', "");
                let text = text.trim_start_matches(['\\', '?', '.']);
                if !text.is_empty() {
                    relative.push(text);
                }
            }
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                relative.pop();
            }
            Component::Normal(part) => relative.push(part),
        }
    }
    relative
}
