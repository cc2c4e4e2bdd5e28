//! Script file graph resolution.
//!
//! Follows file-based `#load` directives from one or more entry scripts and
//! returns every participating file exactly once, depth-first in discovery
//! order. Package-backed loads (`#load "nuget: ..."`) are not followed.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::directives::parse_directives;
use crate::error::{Error, Result};

/// Resolve the ordered, deduplicated list of script files reachable from
/// `entries`.
///
/// Relative `#load` paths are resolved against the directory of the file
/// that contains the directive. A file that cannot be read is a fatal error.
pub fn resolve_script_graph<P: AsRef<Path>>(entries: &[P]) -> Result<Vec<PathBuf>> {
    let base = std::env::current_dir()?;
    let mut visited = HashSet::new();
    let mut ordered = Vec::new();

    for entry in entries {
        let path = absolutize(&base, entry.as_ref());
        visit(path, &mut visited, &mut ordered)?;
    }

    Ok(ordered)
}

fn visit(path: PathBuf, visited: &mut HashSet<PathBuf>, ordered: &mut Vec<PathBuf>) -> Result<()> {
    // Membership is checked before recursing, so cyclic loads terminate.
    if !visited.insert(path.clone()) {
        return Ok(());
    }

    let source = fs::read_to_string(&path).map_err(|source| Error::ScriptRead {
        path: path.clone(),
        source,
    })?;
    ordered.push(path.clone());

    let dir = path.parent().unwrap_or(Path::new("/")).to_path_buf();
    for load in parse_directives(&source).load_paths {
        let target = absolutize(&dir, Path::new(&load));
        tracing::debug!("{} loads {}", path.display(), target.display());
        visit(target, visited, ordered)?;
    }

    Ok(())
}

/// Join `path` onto `base` unless it is already absolute, then fold `.` and
/// `..` components lexically.
pub(crate) fn absolutize(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
