//! Assembly identity read from CLI metadata.

use std::path::Path;

use dotscope::CilObject;

/// `major.minor.build.revision` from the assembly manifest of `path`.
///
/// `None` when the file is not a readable .NET assembly.
pub fn assembly_version(path: &Path) -> Option<String> {
    if std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true) {
        return None;
    }

    let object = match CilObject::from_path(path) {
        Ok(object) => object,
        Err(e) => {
            tracing::debug!("No CLI metadata in {}: {}", path.display(), e);
            return None;
        }
    };

    let assembly = object.assembly()?;
    Some(format!(
        "{}.{}.{}.{}",
        assembly.major_version,
        assembly.minor_version,
        assembly.build_number,
        assembly.revision_number
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_non_assemblies_have_no_version() {
        let temp = TempDir::new().unwrap();
        let empty = temp.path().join("Empty.dll");
        fs::write(&empty, b"").unwrap();
        let text = temp.path().join("Text.dll");
        fs::write(&text, b"not a portable executable").unwrap();

        assert_eq!(assembly_version(&empty), None);
        assert_eq!(assembly_version(&text), None);
        assert_eq!(assembly_version(&temp.path().join("Missing.dll")), None);
    }
}
