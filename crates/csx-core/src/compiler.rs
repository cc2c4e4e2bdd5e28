//! Boundary to the external script compiler.
//!
//! The compiler itself lives outside this crate. The pipeline hands it a
//! [`CompilationRequest`] carrying the entry script, the scripts it pulls in
//! and a reference set with one path per assembly name.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::resolved::ResolvedDependencySet;

/// Everything the compiler needs to build one script run.
#[derive(Debug, Clone, Serialize)]
pub struct CompilationRequest {
    pub entry_script: PathBuf,
    /// Package-provided scripts, then the files reached through `#load`.
    pub script_files: Vec<PathBuf>,
    /// Package compile references followed by local `#r` assemblies.
    pub references: Vec<PathBuf>,
    pub target_framework: String,
}

impl CompilationRequest {
    /// `graph` is the script graph in visit order, entry script first.
    pub fn new(
        entry_script: PathBuf,
        graph: &[PathBuf],
        resolved: &ResolvedDependencySet,
        local_assemblies: impl IntoIterator<Item = PathBuf>,
        target_framework: impl Into<String>,
    ) -> Self {
        let mut script_files = resolved.script_files().to_vec();
        script_files.extend(graph.iter().filter(|f| **f != entry_script).cloned());

        let mut references: Vec<PathBuf> = resolved.compile_paths().map(Path::to_path_buf).collect();
        for assembly in local_assemblies {
            if !references.contains(&assembly) {
                references.push(assembly);
            }
        }

        Self {
            entry_script,
            script_files,
            references,
            target_framework: target_framework.into(),
        }
    }
}

/// A compiler that turns a request into something runnable.
pub trait CompilerService {
    type Output;

    fn compile(&self, request: &CompilationRequest) -> Result<Self::Output>;
}

/// Introspection a compiler may offer on its own output.
pub trait ScriptDiagnostics: CompilerService {
    /// Debug symbols emitted for `output`, if the compiler produced any.
    fn debug_symbols(&self, output: &Self::Output) -> Option<Vec<u8>>;
}
