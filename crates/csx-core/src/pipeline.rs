//! End-to-end resolution for one entry script.
//!
//! ```text
//! entry.csx ─> script graph ─> collected references ─> script.csproj
//!                                                          │ restore
//!                                                          v
//!     CompilationRequest <─ ResolvedDependencySet <─ project.assets.json
//! ```

use std::path::{Path, PathBuf};

use crate::collect::collect_references;
use crate::compiler::CompilationRequest;
use crate::context::DependencyContextReader;
use crate::environment::ScriptEnvironment;
use crate::error::Result;
use crate::graph::resolve_script_graph;
use crate::manifest::ProjectManifest;
use crate::paths::ScriptDirs;
use crate::resolved::ResolvedDependencySet;
use crate::restore::{RestoreOutcome, Restorer, default_restorer};

/// The generated project for an entry script.
#[derive(Debug, Clone)]
pub struct ScriptProject {
    /// Absolute path of the entry script.
    pub entry: PathBuf,
    /// Every script reachable through `#load`, entry first.
    pub graph: Vec<PathBuf>,
    pub manifest: ProjectManifest,
    pub dirs: ScriptDirs,
}

/// Drives every stage with one environment and one restorer.
pub struct ScriptPipeline<'a> {
    env: &'a ScriptEnvironment,
    restorer: Box<dyn Restorer>,
}

impl<'a> ScriptPipeline<'a> {
    /// Pipeline with the default restorer chain.
    pub fn new(env: &'a ScriptEnvironment, use_cache: bool) -> Self {
        Self::with_restorer(env, default_restorer(env, use_cache))
    }

    pub fn with_restorer(env: &'a ScriptEnvironment, restorer: Box<dyn Restorer>) -> Self {
        Self { env, restorer }
    }

    pub fn env(&self) -> &ScriptEnvironment {
        self.env
    }

    /// Walk the script graph, then write the manifest for its references.
    pub fn synthesize(&self, entry: &Path) -> Result<ScriptProject> {
        let graph = resolve_script_graph(&[entry])?;
        // The graph is never empty: the entry itself was read.
        let entry = graph[0].clone();

        let collected = collect_references(&graph)?;
        let manifest = ProjectManifest::from_collected(collected, self.env.target_framework());

        let script_dir = entry.parent().unwrap_or(Path::new("/"));
        let dirs = ScriptDirs::for_script_dir(
            self.env.cache_root(),
            script_dir,
            manifest.target_framework(),
        );
        dirs.ensure()?;
        manifest.save(&dirs.manifest_path)?;

        tracing::debug!(
            "Wrote {} ({} package reference(s), {} script file(s))",
            dirs.manifest_path.display(),
            manifest.package_references().len(),
            graph.len()
        );

        Ok(ScriptProject {
            entry,
            graph,
            manifest,
            dirs,
        })
    }

    pub fn restore(&self, project: &ScriptProject) -> Result<RestoreOutcome> {
        self.restorer
            .restore(&project.dirs.manifest_path, self.env.package_sources())
    }

    /// Read the lock artifact of a restored project.
    pub fn resolve(&self, project: &ScriptProject) -> Result<ResolvedDependencySet> {
        let context = DependencyContextReader::new(self.env).read(&project.dirs.assets_path)?;
        Ok(ResolvedDependencySet::from_context(&context))
    }

    pub fn compilation_request(
        &self,
        project: &ScriptProject,
        resolved: &ResolvedDependencySet,
    ) -> CompilationRequest {
        let mut local: Vec<PathBuf> = project
            .manifest
            .assembly_references()
            .iter()
            .map(|reference| reference.path().to_path_buf())
            .collect();
        local.sort();

        CompilationRequest::new(
            project.entry.clone(),
            &project.graph,
            resolved,
            local,
            project.manifest.target_framework(),
        )
    }

    /// Synthesize, restore and resolve `entry` in one go.
    pub fn prepare(&self, entry: &Path) -> Result<CompilationRequest> {
        let project = self.synthesize(entry)?;
        self.restore(&project)?;
        let resolved = self.resolve(&project)?;
        Ok(self.compilation_request(&project, &resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::fs;
    use tempfile::TempDir;

    struct NoopRestorer;

    impl Restorer for NoopRestorer {
        fn restore(&self, _: &Path, _: &[String]) -> Result<RestoreOutcome> {
            Ok(RestoreOutcome::Restored)
        }

        fn can_restore(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_synthesize_writes_manifest_under_cache_root() {
        let scripts = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        fs::write(
            scripts.path().join("main.csx"),
            "#! \"net6.0\"\n#r \"nuget: Newtonsoft.Json, 12.0.3\"\n#load \"helper.csx\"\n",
        )
        .unwrap();
        fs::write(scripts.path().join("helper.csx"), "#r \"nuget: Moq, 4.14.5\"\n").unwrap();

        let env = ScriptEnvironment::detect().with_cache_root(cache.path());
        let pipeline = ScriptPipeline::with_restorer(&env, Box::new(NoopRestorer));
        let project = pipeline.synthesize(&scripts.path().join("main.csx")).unwrap();

        assert_eq!(project.graph.len(), 2);
        assert_eq!(project.manifest.target_framework(), "net6.0");
        assert_eq!(project.manifest.package_references().len(), 2);
        assert!(project.dirs.manifest_path.starts_with(cache.path()));
        assert!(project.dirs.project_dir.ends_with("net6.0"));

        let written = ProjectManifest::load(&project.dirs.manifest_path).unwrap();
        assert_eq!(written, project.manifest);
    }

    #[test]
    fn test_resolve_without_lock_artifact() {
        let scripts = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        fs::write(scripts.path().join("main.csx"), "Console.WriteLine(1);\n").unwrap();

        let env = ScriptEnvironment::detect().with_cache_root(cache.path());
        let pipeline = ScriptPipeline::with_restorer(&env, Box::new(NoopRestorer));

        let err = pipeline.prepare(&scripts.path().join("main.csx")).unwrap_err();
        assert!(matches!(err, Error::MissingLockArtifact { .. }));
    }
}
