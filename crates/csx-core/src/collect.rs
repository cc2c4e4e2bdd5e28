//! Package reference collection across a script graph.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::directives::parse_directives;
use crate::error::{Error, Result};
use crate::graph::absolutize;
use crate::reference::{AssemblyReference, PackageReference};

/// References gathered from every file of a script graph.
#[derive(Debug, Clone, Default)]
pub struct CollectedReferences {
    /// Union of all package references (identical id and version collapse).
    pub package_references: HashSet<PackageReference>,

    /// Union of all local assembly references, as absolute paths.
    pub assembly_references: HashSet<AssemblyReference>,

    /// First target framework found in file order, if any.
    pub target_framework: Option<String>,
}

/// Parse every file in `files` and union what they reference.
///
/// When two files name different target frameworks, the first one wins and
/// the conflict is logged.
pub fn collect_references<P: AsRef<Path>>(files: &[P]) -> Result<CollectedReferences> {
    let mut collected = CollectedReferences::default();

    for file in files {
        let file = file.as_ref();
        let source = fs::read_to_string(file).map_err(|source| Error::ScriptRead {
            path: file.to_path_buf(),
            source,
        })?;
        let directives = parse_directives(&source);

        collected
            .package_references
            .extend(directives.package_references);

        let dir = file.parent().map(Path::to_path_buf).unwrap_or_else(PathBuf::new);
        collected.assembly_references.extend(
            directives
                .assembly_paths
                .iter()
                .map(|p| AssemblyReference::new(absolutize(&dir, Path::new(p)))),
        );

        if let Some(found) = directives.target_framework {
            match &collected.target_framework {
                None => collected.target_framework = Some(found),
                Some(current) if !current.eq_ignore_ascii_case(&found) => {
                    tracing::warn!(
                        "Found multiple target frameworks ({} in {}). Using {}",
                        found,
                        file.display(),
                        current
                    );
                }
                Some(_) => {}
            }
        }
    }

    tracing::debug!(
        "Collected {} package reference(s) from {} file(s)",
        collected.package_references.len(),
        files.len()
    );

    Ok(collected)
}
