//! Serde model of the restore lock artifact (`obj/project.assets.json`).
//!
//! Only the parts the resolver reads are modelled:
//!
//! ```text
//! {
//!   "targets": {
//!     "net8.0/linux-x64": {
//!       "Newtonsoft.Json/12.0.3": {
//!         "type": "package",
//!         "compile": { "lib/netstandard2.0/Newtonsoft.Json.dll": {} },
//!         "runtime": { "lib/netstandard2.0/Newtonsoft.Json.dll": {} },
//!         "runtimeTargets": { "runtimes/win/lib/...": { "assetType": "runtime", "rid": "win" } },
//!         "native": { "runtimes/linux-x64/native/libfoo.so": {} },
//!         "contentFiles": { "contentFiles/csx/netstandard2.0/main.csx": { "codeLanguage": "csx" } }
//!       }
//!     }
//!   },
//!   "libraries": {
//!     "Newtonsoft.Json/12.0.3": { "type": "package", "path": "newtonsoft.json/12.0.3", "files": [...] }
//!   },
//!   "packageFolders": { "/home/me/.nuget/packages/": {} }
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// Placeholder file NuGet writes for "this folder intentionally has no assets".
pub const PLACEHOLDER_FILE: &str = "_._";

/// Asset file map, values carry nothing the resolver needs.
pub type AssetMap = BTreeMap<String, IgnoredAny>;

#[derive(Debug, Deserialize)]
pub struct LockFile {
    #[serde(default)]
    pub version: u32,

    #[serde(default)]
    pub targets: BTreeMap<String, BTreeMap<String, TargetLibrary>>,

    #[serde(default)]
    pub libraries: BTreeMap<String, LockLibrary>,

    /// Package folders in declared order, primary first.
    #[serde(default, rename = "packageFolders", deserialize_with = "ordered_keys")]
    pub package_folders: Vec<String>,
}

impl LockFile {
    /// Read and deserialize a lock artifact.
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|_| Error::MissingLockArtifact {
            path: path.to_path_buf(),
        })?;
        serde_json::from_str(&text).map_err(|source| Error::LockArtifact {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// One library entry inside a target.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetLibrary {
    #[serde(default, rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    #[serde(default)]
    pub compile: AssetMap,

    #[serde(default)]
    pub runtime: AssetMap,

    #[serde(default)]
    pub native: AssetMap,

    #[serde(default)]
    pub runtime_targets: BTreeMap<String, RuntimeTargetAsset>,

    /// Content files NuGet selected for the target framework.
    #[serde(default)]
    pub content_files: BTreeMap<String, ContentFileAsset>,
}

/// A runtime-specific asset (`runtimes/<rid>/...`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeTargetAsset {
    #[serde(default)]
    pub asset_type: String,

    #[serde(default)]
    pub rid: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentFileAsset {
    #[serde(default)]
    pub code_language: Option<String>,

    #[serde(default)]
    pub build_action: Option<String>,
}

/// A library entry in the top-level `libraries` section.
#[derive(Debug, Default, Deserialize)]
pub struct LockLibrary {
    #[serde(default, rename = "type")]
    pub kind: String,

    /// Package directory relative to a package folder.
    #[serde(default)]
    pub path: Option<String>,

    /// Every file in the package, relative to the package directory.
    #[serde(default)]
    pub files: Vec<String>,
}

/// Split a `Name/Version` library key.
pub fn split_library_key(key: &str) -> (&str, &str) {
    key.split_once('/').unwrap_or((key, ""))
}

/// Whether an asset entry is the NuGet "no assets" placeholder.
pub fn is_placeholder(asset: &str) -> bool {
    asset.rsplit('/').next() == Some(PLACEHOLDER_FILE)
}

/// Map keys in document order.
fn ordered_keys<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<String>, D::Error> {
    struct KeysVisitor;

    impl<'de> Visitor<'de> for KeysVisitor {
        type Value = Vec<String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of package folders")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
            let mut keys = Vec::new();
            while let Some((key, _)) = map.next_entry::<String, IgnoredAny>()? {
                keys.push(key);
            }
            Ok(keys)
        }
    }

    deserializer.deserialize_map(KeysVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "version": 3,
        "targets": {
            "net8.0": {},
            "net8.0/linux-x64": {
                "Newtonsoft.Json/12.0.3": {
                    "type": "package",
                    "compile": { "lib/netstandard2.0/Newtonsoft.Json.dll": { "related": ".xml" } },
                    "runtime": { "lib/netstandard2.0/Newtonsoft.Json.dll": {} },
                    "runtimeTargets": {
                        "runtimes/win/lib/netstandard2.0/Foo.dll": { "assetType": "runtime", "rid": "win" }
                    },
                    "contentFiles": {
                        "contentFiles/csx/netstandard2.0/main.csx": {
                            "buildAction": "Compile",
                            "codeLanguage": "csx",
                            "copyToOutput": false
                        }
                    }
                }
            }
        },
        "libraries": {
            "Newtonsoft.Json/12.0.3": {
                "sha512": "abc",
                "type": "package",
                "path": "newtonsoft.json/12.0.3",
                "files": ["lib/netstandard2.0/Newtonsoft.Json.dll"]
            }
        },
        "packageFolders": {
            "/z/primary/": {},
            "/a/fallback/": {}
        },
        "project": { "version": "1.0.0" }
    }"#;

    #[test]
    fn test_deserialize_sample() {
        let lock: LockFile = serde_json::from_str(SAMPLE).unwrap();

        assert_eq!(lock.version, 3);
        assert_eq!(lock.targets.len(), 2);
        let library = &lock.targets["net8.0/linux-x64"]["Newtonsoft.Json/12.0.3"];
        assert_eq!(library.kind, "package");
        assert!(library.compile.contains_key("lib/netstandard2.0/Newtonsoft.Json.dll"));
        assert_eq!(
            library.runtime_targets["runtimes/win/lib/netstandard2.0/Foo.dll"].rid,
            "win"
        );
        let content = &library.content_files["contentFiles/csx/netstandard2.0/main.csx"];
        assert_eq!(content.code_language.as_deref(), Some("csx"));
        assert_eq!(content.build_action.as_deref(), Some("Compile"));
        assert_eq!(
            lock.libraries["Newtonsoft.Json/12.0.3"].path.as_deref(),
            Some("newtonsoft.json/12.0.3")
        );
    }

    #[test]
    fn test_package_folders_keep_document_order() {
        let lock: LockFile = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(lock.package_folders, vec!["/z/primary/", "/a/fallback/"]);
    }

    #[test]
    fn test_split_library_key() {
        assert_eq!(split_library_key("Moq/4.14.5"), ("Moq", "4.14.5"));
        assert_eq!(split_library_key("Odd"), ("Odd", ""));
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(is_placeholder("lib/net461/_._"));
        assert!(is_placeholder("_._"));
        assert!(!is_placeholder("lib/net461/Foo.dll"));
    }

    #[test]
    fn test_missing_file_is_missing_lock_artifact() {
        let err = LockFile::read(Path::new("/definitely/not/here/project.assets.json")).unwrap_err();
        assert!(matches!(err, Error::MissingLockArtifact { .. }));
    }
}
