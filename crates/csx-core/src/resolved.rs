//! The resolved reference set handed to the compiler and the runtime loader.
//!
//! Transitive dependencies can pin different versions of the same package
//! or assembly. Resolution applies highest-version-wins twice: once per
//! package id, then once per assembly simple name, so every name maps to
//! exactly one path. Assemblies compare by the version in their own
//! metadata, falling back to the version of the package that shipped them.

use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::context::{ScriptDependency, ScriptDependencyContext};
use crate::metadata;
use crate::version::highest_version;

/// An assembly selected for a simple name.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeAssembly {
    /// Simple name (file stem), as written in the package.
    pub name: String,
    /// Assembly version, or the package version when unreadable.
    pub version: String,
    pub path: PathBuf,
}

impl PartialEq for RuntimeAssembly {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.path == other.path
    }
}

impl Eq for RuntimeAssembly {}

/// Conflict-free references for one script run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolvedDependencySet {
    compile_references: Vec<RuntimeAssembly>,
    runtime_assemblies: Vec<RuntimeAssembly>,
    native_assets: Vec<PathBuf>,
    script_files: Vec<PathBuf>,

    #[serde(skip)]
    by_name: FxHashMap<String, usize>,
}

impl ResolvedDependencySet {
    pub fn from_context(context: &ScriptDependencyContext) -> Self {
        Self::from_context_with(context, metadata::assembly_version)
    }

    /// Resolve with `read_version` supplying each assembly's own version.
    pub fn from_context_with<F>(context: &ScriptDependencyContext, read_version: F) -> Self
    where
        F: Fn(&Path) -> Option<String>,
    {
        let packages = select_packages(&context.dependencies);
        let mut versions = VersionCache::new(read_version);

        let compile_references = select_assemblies(
            packages
                .iter()
                .flat_map(|dep| assemblies(dep, &dep.compile_time_paths, &mut versions))
                .collect(),
        );
        let runtime_assemblies = select_assemblies(
            packages
                .iter()
                .flat_map(|dep| assemblies(dep, &dep.runtime_paths, &mut versions))
                .collect(),
        );

        let mut seen = FxHashSet::default();
        let native_assets = packages
            .iter()
            .flat_map(|dep| dep.native_asset_paths.iter())
            .filter(|path| seen.insert(*path))
            .cloned()
            .collect();

        let script_files = packages
            .iter()
            .flat_map(|dep| dep.script_paths.iter().cloned())
            .collect();

        let by_name = runtime_assemblies
            .iter()
            .enumerate()
            .map(|(i, assembly)| (assembly.name.to_lowercase(), i))
            .collect();

        Self {
            compile_references,
            runtime_assemblies,
            native_assets,
            script_files,
            by_name,
        }
    }

    /// Assemblies the compiler references, one per simple name.
    pub fn compile_references(&self) -> &[RuntimeAssembly] {
        &self.compile_references
    }

    /// Paths of [`Self::compile_references`].
    pub fn compile_paths(&self) -> impl Iterator<Item = &Path> {
        self.compile_references.iter().map(|a| a.path.as_path())
    }

    pub fn runtime_assemblies(&self) -> &[RuntimeAssembly] {
        &self.runtime_assemblies
    }

    pub fn native_assets(&self) -> &[PathBuf] {
        &self.native_assets
    }

    /// Script files shipped by packages, loaded before the entry script.
    pub fn script_files(&self) -> &[PathBuf] {
        &self.script_files
    }

    /// Runtime assembly for a simple name, case-insensitively.
    pub fn find(&self, simple_name: &str) -> Option<&RuntimeAssembly> {
        self.by_name
            .get(&simple_name.to_lowercase())
            .map(|&i| &self.runtime_assemblies[i])
    }

    pub fn is_empty(&self) -> bool {
        self.compile_references.is_empty()
            && self.runtime_assemblies.is_empty()
            && self.native_assets.is_empty()
            && self.script_files.is_empty()
    }
}

fn dependency_version<'b>(dep: &'b &ScriptDependency) -> &'b str {
    &dep.version
}

fn assembly_version(assembly: &RuntimeAssembly) -> &str {
    &assembly.version
}

/// One dependency per package id, highest version first encountered.
fn select_packages(dependencies: &[ScriptDependency]) -> Vec<&ScriptDependency> {
    group_by_name(dependencies.iter(), |dep| dep.name.as_str())
        .into_iter()
        .filter_map(|group| {
            if group.len() > 1 {
                tracing::debug!(
                    "Package {} restored at {} versions, keeping the highest",
                    group[0].name,
                    group.len()
                );
            }
            highest_version(group, dependency_version)
        })
        .collect()
}

fn select_assemblies(candidates: Vec<RuntimeAssembly>) -> Vec<RuntimeAssembly> {
    group_by_name(candidates.into_iter(), |assembly| assembly.name.as_str())
        .into_iter()
        .filter_map(|group| {
            let selected = highest_version(group, assembly_version)?;
            tracing::trace!("{} -> {}", selected.name, selected.path.display());
            Some(selected)
        })
        .collect()
}

/// Metadata versions, read once per path.
struct VersionCache<F> {
    read: F,
    seen: FxHashMap<PathBuf, Option<String>>,
}

impl<F: Fn(&Path) -> Option<String>> VersionCache<F> {
    fn new(read: F) -> Self {
        Self {
            read,
            seen: FxHashMap::default(),
        }
    }

    fn get(&mut self, path: &Path) -> Option<String> {
        if let Some(version) = self.seen.get(path) {
            return version.clone();
        }
        let version = (self.read)(path);
        self.seen.insert(path.to_path_buf(), version.clone());
        version
    }
}

fn assemblies<F: Fn(&Path) -> Option<String>>(
    dep: &ScriptDependency,
    paths: &[PathBuf],
    versions: &mut VersionCache<F>,
) -> Vec<RuntimeAssembly> {
    paths
        .iter()
        .filter_map(|path| {
            let name = path.file_stem()?.to_str()?.to_string();
            let version = versions.get(path).unwrap_or_else(|| dep.version.clone());
            Some(RuntimeAssembly {
                name,
                version,
                path: path.clone(),
            })
        })
        .collect()
}

/// Group items by case-insensitive name, in first-seen order.
fn group_by_name<T, F>(items: impl Iterator<Item = T>, name_of: F) -> Vec<Vec<T>>
where
    F: Fn(&T) -> &str,
{
    let mut groups: Vec<Vec<T>> = Vec::new();
    let mut index: FxHashMap<String, usize> = FxHashMap::default();

    for item in items {
        let key = name_of(&item).to_lowercase();
        match index.get(&key) {
            Some(&i) => groups[i].push(item),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![item]);
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dependency(name: &str, version: &str, dlls: &[&str]) -> ScriptDependency {
        let paths: Vec<PathBuf> = dlls
            .iter()
            .map(|dll| PathBuf::from(format!("/packages/{}/{}/lib/{}", name.to_lowercase(), version, dll)))
            .collect();
        ScriptDependency {
            name: name.to_string(),
            version: version.to_string(),
            compile_time_paths: paths.clone(),
            runtime_paths: paths,
            native_asset_paths: Vec::new(),
            script_paths: Vec::new(),
        }
    }

    #[test]
    fn test_highest_package_version_wins() {
        let context = ScriptDependencyContext {
            dependencies: vec![
                dependency("Library", "1.0.0", &["Library.dll"]),
                dependency("Library", "2.0.0", &["Library.dll"]),
            ],
        };

        let set = ResolvedDependencySet::from_context(&context);

        assert_eq!(set.runtime_assemblies().len(), 1);
        let library = &set.runtime_assemblies()[0];
        assert_eq!(library.version, "2.0.0");
        assert_eq!(library.path, PathBuf::from("/packages/library/2.0.0/lib/Library.dll"));
        assert_eq!(set.compile_references().len(), 1);
    }

    #[test]
    fn test_assembly_conflict_across_packages() {
        // Two packages bundle their own copy of Shared.dll.
        let context = ScriptDependencyContext {
            dependencies: vec![
                dependency("Alpha", "3.1.0", &["Alpha.dll", "Shared.dll"]),
                dependency("Beta", "10.0.0", &["Beta.dll", "shared.dll"]),
            ],
        };

        let set = ResolvedDependencySet::from_context(&context);

        assert_eq!(set.runtime_assemblies().len(), 3);
        let shared = set.find("SHARED").unwrap();
        assert_eq!(shared.version, "10.0.0");
        assert!(shared.path.starts_with("/packages/beta"));
    }

    #[test]
    fn test_assembly_metadata_version_beats_package_version() {
        let context = ScriptDependencyContext {
            dependencies: vec![
                dependency("Alpha", "3.1.0", &["Shared.dll"]),
                dependency("Beta", "10.0.0", &["Shared.dll"]),
            ],
        };

        let set = ResolvedDependencySet::from_context_with(&context, |path| {
            if path.starts_with("/packages/alpha") {
                Some("12.0.0.0".to_string())
            } else {
                Some("4.0.0.0".to_string())
            }
        });

        let shared = set.find("Shared").unwrap();
        assert_eq!(shared.version, "12.0.0.0");
        assert_eq!(shared.path, PathBuf::from("/packages/alpha/3.1.0/lib/Shared.dll"));
        assert_eq!(set.compile_references()[0].version, "12.0.0.0");
    }

    #[test]
    fn test_unreadable_metadata_falls_back_per_assembly() {
        let context = ScriptDependencyContext {
            dependencies: vec![
                dependency("Alpha", "3.1.0", &["Shared.dll"]),
                dependency("Beta", "10.0.0", &["Shared.dll"]),
            ],
        };

        // Only Alpha's copy carries readable metadata.
        let set = ResolvedDependencySet::from_context_with(&context, |path| {
            path.starts_with("/packages/alpha").then(|| "3.0.0.0".to_string())
        });

        let shared = set.find("Shared").unwrap();
        assert_eq!(shared.version, "10.0.0");
        assert!(shared.path.starts_with("/packages/beta"));
    }

    #[test]
    fn test_numeric_not_lexical_ordering() {
        let context = ScriptDependencyContext {
            dependencies: vec![
                dependency("Library", "10.0.0", &["Library.dll"]),
                dependency("library", "9.2.0", &["Library.dll"]),
            ],
        };

        let set = ResolvedDependencySet::from_context(&context);
        assert_eq!(set.find("library").unwrap().version, "10.0.0");
    }

    #[test]
    fn test_native_assets_deduplicated_and_scripts_kept() {
        let mut first = dependency("Native", "1.0.0", &[]);
        first.native_asset_paths = vec![PathBuf::from("/n/libfoo.so")];
        let mut second = dependency("Helpers", "1.0.0", &[]);
        second.native_asset_paths = vec![PathBuf::from("/n/libfoo.so")];
        second.script_paths = vec![PathBuf::from("/s/main.csx")];

        let set = ResolvedDependencySet::from_context(&ScriptDependencyContext {
            dependencies: vec![first, second],
        });

        assert_eq!(set.native_assets(), &[PathBuf::from("/n/libfoo.so")]);
        assert_eq!(set.script_files(), &[PathBuf::from("/s/main.csx")]);
        assert!(set.find("Native").is_none());
    }

    #[test]
    fn test_empty_context() {
        let set = ResolvedDependencySet::from_context(&ScriptDependencyContext::default());
        assert!(set.is_empty());
        assert_eq!(set.compile_paths().count(), 0);
    }
}
