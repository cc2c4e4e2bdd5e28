//! Package and assembly references discovered in script source.
//!
//! Package identity is case-insensitive on both id and version, so
//! `Newtonsoft.Json, 12.0.3` and `newtonsoft.json, 12.0.3` collapse to one
//! reference when collected into a set.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Exact version: `1.2.3`, `1.2.3.4`, optionally with a prerelease label.
static EXACT_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(\.\d+){2,3}(-[0-9A-Za-z][0-9A-Za-z.-]*)?(\+[0-9A-Za-z.-]+)?$")
        .expect("exact version pattern is valid")
});

/// A version specifier as written in a `#r "nuget: ..."` directive.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct PackageVersion(String);

impl PackageVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the specifier names exactly one version.
    ///
    /// `1.2.3`, `1.2.3.4` and `[1.2.3]` are pinned. Ranges, floating and
    /// partial versions such as `1.0`, `(1.0,)` or `[1.0,2.0]` are not.
    pub fn is_pinned(&self) -> bool {
        let version = self.0.as_str();
        if let Some(inner) = version
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            return EXACT_VERSION.is_match(inner.trim());
        }
        EXACT_VERSION.is_match(version)
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for PackageVersion {}

impl Hash for PackageVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_ascii_lowercase().hash(state);
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A NuGet package reference.
#[derive(Debug, Clone, Serialize)]
pub struct PackageReference {
    id: String,
    version: PackageVersion,
}

impl PackageReference {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into().trim().to_string(),
            version: PackageVersion::new(version),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> &PackageVersion {
        &self.version
    }

    pub fn is_pinned(&self) -> bool {
        self.version.is_pinned()
    }
}

impl PartialEq for PackageReference {
    fn eq(&self, other: &Self) -> bool {
        self.id.eq_ignore_ascii_case(&other.id) && self.version == other.version
    }
}

impl Eq for PackageReference {}

impl Hash for PackageReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.to_ascii_lowercase().hash(state);
        self.version.hash(state);
    }
}

impl fmt::Display for PackageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.id, self.version)
    }
}

/// A reference to a local assembly file (`#r "lib/Foo.dll"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AssemblyReference {
    path: PathBuf,
}

impl AssemblyReference {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
