//! Clean command implementation for csx CLI.

use std::fs;
use std::path::Path;

use anyhow::bail;
use csx_core::ScriptEnvironment;

use crate::colors;

/// Remove the cache root with every generated project in it.
pub fn execute(env: &ScriptEnvironment) -> anyhow::Result<()> {
    let root = env.cache_root();
    if !root.exists() {
        println!("Nothing to clean at {}", root.display());
        return Ok(());
    }

    let root = fs::canonicalize(root)?;
    if is_protected(&root, dirs::home_dir().as_deref()) {
        bail!(
            "refusing to remove {}: not a dedicated cache directory",
            root.display()
        );
    }

    fs::remove_dir_all(&root)?;
    println!("{}Removed{} {}", colors::GREEN, colors::RESET, root.display());
    Ok(())
}

/// Filesystem roots and the home directory are never removed.
fn is_protected(root: &Path, home: Option<&Path>) -> bool {
    if root.parent().is_none() {
        return true;
    }
    home.is_some_and(|home| {
        let home = fs::canonicalize(home).unwrap_or_else(|_| home.to_path_buf());
        root == home
    })
}
