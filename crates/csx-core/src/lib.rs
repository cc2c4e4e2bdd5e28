//! Dependency resolution for C# scripts.
//!
//! This crate provides:
//! - Directive parsing (`#r "nuget: ..."`, `#load`, `#!` framework pragma)
//! - Script graph walking and reference collection
//! - Project manifest synthesis and cached package restore
//! - Lock artifact reading with runtime identifier fallback
//! - Highest-version-wins conflict resolution on assembly metadata versions
//! - Native asset loading and late-bound assembly redirects

pub mod collect;
pub mod compiler;
pub mod context;
pub mod directives;
pub mod environment;
pub mod error;
pub mod graph;
pub mod manifest;
pub mod metadata;
pub mod paths;
pub mod pipeline;
pub mod reference;
pub mod resolved;
pub mod restore;
pub mod runtime;
pub mod version;

pub use collect::{CollectedReferences, collect_references};
pub use compiler::{CompilationRequest, CompilerService, ScriptDiagnostics};
pub use context::{DependencyContextReader, RuntimeGraph, ScriptDependency, ScriptDependencyContext};
pub use directives::{ScriptDirectives, parse_directives};
pub use environment::{OsFamily, ScriptEnvironment};
pub use error::{Error, Result};
pub use graph::resolve_script_graph;
pub use manifest::ProjectManifest;
pub use paths::ScriptDirs;
pub use pipeline::{ScriptPipeline, ScriptProject};
pub use reference::{AssemblyReference, PackageReference, PackageVersion};
pub use resolved::{ResolvedDependencySet, RuntimeAssembly};
pub use restore::{
    CachedRestorer, DotnetRestorer, FallbackRestorer, ProfiledRestorer, RestoreOutcome, Restorer,
    default_restorer,
};
pub use runtime::{AssemblyHost, AssemblyRequest, AssemblyResolver, NativeAssetLoader};
pub use version::{NuGetVersion, compare_versions, highest_version};
