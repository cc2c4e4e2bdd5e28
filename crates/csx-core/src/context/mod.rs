//! Dependency context read from the restore lock artifact.
//!
//! The reader turns `obj/project.assets.json` into one [`ScriptDependency`]
//! per package, with every asset path made absolute against the package
//! folder that holds it.

mod lock;
mod runtime_graph;

pub use lock::{
    ContentFileAsset, LockFile, LockLibrary, RuntimeTargetAsset, TargetLibrary, is_placeholder,
    split_library_key,
};
pub use runtime_graph::RuntimeGraph;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::environment::ScriptEnvironment;
use crate::error::{Error, Result};

const RUNTIME_GRAPH_FILE: &str = "runtime.json";
const SCRIPT_CONTENT_PREFIX: &str = "contentFiles/csx/";
const ANY_FRAMEWORK: &str = "any";
const SCRIPT_LANGUAGE: &str = "csx";

/// Assets contributed by one restored package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptDependency {
    pub name: String,
    pub version: String,
    pub compile_time_paths: Vec<PathBuf>,
    pub runtime_paths: Vec<PathBuf>,
    pub native_asset_paths: Vec<PathBuf>,
    pub script_paths: Vec<PathBuf>,
}

impl ScriptDependency {
    fn is_empty(&self) -> bool {
        self.compile_time_paths.is_empty()
            && self.runtime_paths.is_empty()
            && self.native_asset_paths.is_empty()
            && self.script_paths.is_empty()
    }
}

/// Every package of the runtime-specific target that contributes assets.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScriptDependencyContext {
    pub dependencies: Vec<ScriptDependency>,
}

/// Reads lock artifacts for one runtime identifier.
pub struct DependencyContextReader {
    runtime_identifier: String,
}

impl DependencyContextReader {
    pub fn new(env: &ScriptEnvironment) -> Self {
        Self {
            runtime_identifier: env.runtime_identifier().to_string(),
        }
    }

    pub fn read(&self, assets_path: &Path) -> Result<ScriptDependencyContext> {
        let lock = LockFile::read(assets_path)?;
        let (target_key, target) = self.select_target(&lock, assets_path)?;
        let framework = target_key.split('/').next().unwrap_or(target_key);
        let folders: Vec<PathBuf> = lock.package_folders.iter().map(PathBuf::from).collect();

        tracing::debug!(
            "Reading target {} from {} ({} package folder(s))",
            target_key,
            assets_path.display(),
            folders.len()
        );

        let graph = load_runtime_graph(&lock, &folders);
        let chain = graph.expand(&self.runtime_identifier);

        let mut dependencies = Vec::new();
        for (key, target_library) in target {
            if target_library.kind != "package" {
                continue;
            }
            let library = lock.libraries.get(key);
            let (name, version) = split_library_key(key);
            let resolver = LibraryAssets {
                name,
                target: target_library,
                library,
                chain: &chain,
                framework,
            };
            let dependency = resolver.resolve(version, &folders)?;
            if dependency.is_empty() {
                tracing::debug!("Skipping {} {}: no assets", name, version);
                continue;
            }
            dependencies.push(dependency);
        }

        Ok(ScriptDependencyContext { dependencies })
    }

    fn select_target<'a>(
        &self,
        lock: &'a LockFile,
        assets_path: &Path,
    ) -> Result<(&'a str, &'a BTreeMap<String, TargetLibrary>)> {
        let suffix = format!("/{}", self.runtime_identifier);

        let selected = lock
            .targets
            .iter()
            .find(|(key, _)| key.ends_with(&suffix))
            .or_else(|| {
                let (key, libraries) = lock.targets.iter().find(|(key, _)| key.contains('/'))?;
                tracing::warn!(
                    "No target for runtime {} in {}, using {} instead",
                    self.runtime_identifier,
                    assets_path.display(),
                    key
                );
                Some((key, libraries))
            });

        match selected {
            Some((key, libraries)) => Ok((key.as_str(), libraries)),
            None => Err(Error::MissingRuntimeTarget {
                path: assets_path.to_path_buf(),
                runtime_identifier: self.runtime_identifier.clone(),
            }),
        }
    }
}

/// Built-in RID graph merged with every package-provided `runtime.json`.
fn load_runtime_graph(lock: &LockFile, folders: &[PathBuf]) -> RuntimeGraph {
    let mut graph = RuntimeGraph::builtin();

    for (key, library) in &lock.libraries {
        if !library.files.iter().any(|f| f == RUNTIME_GRAPH_FILE) {
            continue;
        }
        let Some(dir) = package_dir(key, library, folders) else {
            continue;
        };
        let path = dir.join(RUNTIME_GRAPH_FILE);
        match std::fs::read_to_string(&path) {
            Ok(text) => match RuntimeGraph::parse(&text) {
                Ok(fragment) => graph.merge(fragment),
                Err(e) => tracing::warn!("Ignoring invalid runtime graph {}: {}", path.display(), e),
            },
            Err(e) => tracing::debug!("Could not read {}: {}", path.display(), e),
        }
    }

    graph
}

/// First package folder holding the library directory.
fn package_dir(key: &str, library: &LockLibrary, folders: &[PathBuf]) -> Option<PathBuf> {
    let relative = library
        .path
        .clone()
        .unwrap_or_else(|| key.to_lowercase());

    folders
        .iter()
        .map(|folder| folder.join(&relative))
        .find(|dir| dir.is_dir())
}

struct LibraryAssets<'a> {
    name: &'a str,
    target: &'a TargetLibrary,
    library: Option<&'a LockLibrary>,
    chain: &'a [String],
    framework: &'a str,
}

impl<'a> LibraryAssets<'a> {
    fn resolve(&self, version: &str, folders: &[PathBuf]) -> Result<ScriptDependency> {
        let compile = plain_assets(self.target.compile.keys());

        let rid_runtime = self.runtime_targets("runtime");
        let mut runtime: Vec<&str> = plain_assets(self.target.runtime.keys())
            .into_iter()
            .filter(|asset| {
                !rid_runtime
                    .iter()
                    .any(|specific| file_name(specific) == file_name(asset))
            })
            .collect();
        runtime.extend(rid_runtime);

        let mut native = plain_assets(self.target.native.keys());
        native.extend(self.runtime_targets("native"));

        let scripts = self.script_files();

        let mut dependency = ScriptDependency {
            name: self.name.to_string(),
            version: version.to_string(),
            compile_time_paths: Vec::new(),
            runtime_paths: Vec::new(),
            native_asset_paths: Vec::new(),
            script_paths: Vec::new(),
        };

        if compile.is_empty() && runtime.is_empty() && native.is_empty() && scripts.is_empty() {
            return Ok(dependency);
        }

        let key = format!("{}/{}", self.name, version);
        let dir = self
            .library
            .and_then(|library| package_dir(&key, library, folders))
            .ok_or_else(|| Error::MissingAsset {
                dependency: self.name.to_string(),
                path: PathBuf::from(
                    self.library
                        .and_then(|library| library.path.clone())
                        .unwrap_or_else(|| key.to_lowercase()),
                ),
            })?;

        dependency.compile_time_paths = self.existing(&dir, &compile)?;
        dependency.runtime_paths = self.existing(&dir, &runtime)?;
        dependency.native_asset_paths = self.existing(&dir, &native)?;
        dependency.script_paths = self.existing(&dir, &scripts)?;
        Ok(dependency)
    }

    /// `runtimeTargets` of one asset type for the nearest RID in the chain.
    fn runtime_targets(&self, asset_type: &str) -> Vec<&'a str> {
        let candidates: Vec<(usize, &str)> = self
            .target
            .runtime_targets
            .iter()
            .filter(|(path, asset)| asset.asset_type == asset_type && !is_placeholder(path))
            .filter_map(|(path, asset)| {
                self.chain
                    .iter()
                    .position(|rid| *rid == asset.rid)
                    .map(|rank| (rank, path.as_str()))
            })
            .collect();

        let Some(best) = candidates.iter().map(|(rank, _)| *rank).min() else {
            return Vec::new();
        };
        candidates
            .into_iter()
            .filter(|(rank, _)| *rank == best)
            .map(|(_, path)| path)
            .collect()
    }

    /// Script content files NuGet selected for the target.
    ///
    /// Older artifacts without a `contentFiles` section fall back to the
    /// package file list, preferring the target framework over `any`.
    fn script_files(&self) -> Vec<&'a str> {
        let selected: Vec<&'a str> = self
            .target
            .content_files
            .iter()
            .filter(|(path, asset)| {
                asset
                    .code_language
                    .as_deref()
                    .is_some_and(|language| language.eq_ignore_ascii_case(SCRIPT_LANGUAGE))
                    && path.ends_with(".csx")
                    && !is_placeholder(path)
            })
            .map(|(path, _)| path.as_str())
            .collect();
        if !selected.is_empty() {
            return selected;
        }

        let Some(library) = self.library else {
            return Vec::new();
        };

        let for_framework = |framework: &str| -> Vec<&'a str> {
            let prefix = format!("{SCRIPT_CONTENT_PREFIX}{framework}/");
            library
                .files
                .iter()
                .filter(|f| f.starts_with(&prefix) && f.ends_with(".csx"))
                .map(String::as_str)
                .collect()
        };

        let exact = for_framework(self.framework);
        if exact.is_empty() {
            for_framework(ANY_FRAMEWORK)
        } else {
            exact
        }
    }

    fn existing(&self, dir: &Path, assets: &[&str]) -> Result<Vec<PathBuf>> {
        assets
            .iter()
            .map(|asset| {
                let path = dir.join(asset);
                if path.exists() {
                    Ok(path)
                } else {
                    Err(Error::MissingAsset {
                        dependency: self.name.to_string(),
                        path,
                    })
                }
            })
            .collect()
    }
}

fn plain_assets<'a>(assets: impl Iterator<Item = &'a String>) -> Vec<&'a str> {
    assets
        .filter(|asset| !is_placeholder(asset))
        .map(String::as_str)
        .collect()
}

fn file_name(asset: &str) -> &str {
    asset.rsplit('/').next().unwrap_or(asset)
}
