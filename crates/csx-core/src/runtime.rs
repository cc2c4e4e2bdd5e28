//! Runtime side of the resolved dependency set.
//!
//! [`NativeAssetLoader`] loads unmanaged libraries into the process before a
//! script runs. [`AssemblyResolver`] answers late-bound assembly requests raised
//! by the script host while it executes.

use std::path::{Path, PathBuf};

use libloading::Library;

use crate::environment::OsFamily;
use crate::error::Result;
use crate::resolved::{ResolvedDependencySet, RuntimeAssembly};
use crate::version::NuGetVersion;

/// Loads native assets and keeps them loaded for its own lifetime.
pub struct NativeAssetLoader {
    os: OsFamily,
    loaded: Vec<(PathBuf, Library)>,
}

impl NativeAssetLoader {
    pub fn new(os: OsFamily) -> Self {
        Self {
            os,
            loaded: Vec::new(),
        }
    }

    /// Whether native loading is supported on `os`.
    pub fn is_supported(os: OsFamily) -> bool {
        matches!(os, OsFamily::Windows | OsFamily::Linux | OsFamily::MacOs)
    }

    /// Load every native asset of `set`, returning how many were loaded.
    ///
    /// On unsupported platforms this loads nothing and returns 0.
    pub fn load_native_assets(&mut self, set: &ResolvedDependencySet) -> Result<usize> {
        if !Self::is_supported(self.os) {
            tracing::debug!(
                "Native asset loading is not supported on {:?}, skipping {} asset(s)",
                self.os,
                set.native_assets().len()
            );
            return Ok(0);
        }

        let mut count = 0;
        for path in set.native_assets() {
            if self.is_loaded(path) {
                continue;
            }
            self.load(path)?;
            count += 1;
        }
        Ok(count)
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        tracing::debug!("Loading native asset {}", path.display());
        // SAFETY: native assets come from restored packages the script
        // explicitly references; their initializers run like any dependency.
        let library = unsafe { Library::new(path) }?;
        self.loaded.push((path.to_path_buf(), library));
        Ok(())
    }

    pub fn is_loaded(&self, path: &Path) -> bool {
        self.loaded.iter().any(|(loaded, _)| loaded == path)
    }

    pub fn loaded_paths(&self) -> impl Iterator<Item = &Path> {
        self.loaded.iter().map(|(path, _)| path.as_path())
    }
}

/// An assembly the script host failed to bind by itself.
#[derive(Debug, Clone)]
pub struct AssemblyRequest {
    pub name: String,
    pub version: Option<NuGetVersion>,
}

impl AssemblyRequest {
    pub fn new(name: impl Into<String>, version: Option<NuGetVersion>) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

/// The process that executes scripts.
pub trait AssemblyHost {
    type Assembly;

    /// An assembly with this simple name that is already loaded.
    fn loaded_assembly(&self, name: &str) -> Option<Self::Assembly>;

    /// Load an assembly from disk.
    fn load_from(&self, path: &Path) -> Result<Self::Assembly>;
}

/// Redirects late-bound requests to the resolved set.
pub struct AssemblyResolver<'a> {
    set: &'a ResolvedDependencySet,
}

impl<'a> AssemblyResolver<'a> {
    pub fn new(set: &'a ResolvedDependencySet) -> Self {
        Self { set }
    }

    /// The resolved assembly a request should bind to, if any.
    ///
    /// A request is redirected when it names no version or when the resolved
    /// version is newer than the requested one.
    pub fn redirect(&self, request: &AssemblyRequest) -> Option<&'a RuntimeAssembly> {
        let resolved = self.set.find(&request.name)?;
        let Some(requested) = &request.version else {
            return Some(resolved);
        };

        match resolved.version.parse::<NuGetVersion>() {
            Ok(version) if version > *requested => Some(resolved),
            _ => None,
        }
    }

    /// Bind a request, preferring an assembly the host already loaded.
    pub fn resolve<H: AssemblyHost>(
        &self,
        request: &AssemblyRequest,
        host: &H,
    ) -> Result<Option<H::Assembly>> {
        let Some(resolved) = self.redirect(request) else {
            return Ok(None);
        };

        if let Some(assembly) = host.loaded_assembly(&resolved.name) {
            tracing::trace!("{} is already loaded", resolved.name);
            return Ok(Some(assembly));
        }

        tracing::debug!(
            "Redirecting {} to {}",
            request.name,
            resolved.path.display()
        );
        host.load_from(&resolved.path).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ScriptDependency, ScriptDependencyContext};
    use std::cell::RefCell;

    fn resolved_set() -> ResolvedDependencySet {
        let dll = PathBuf::from("/packages/newtonsoft.json/12.0.3/lib/Newtonsoft.Json.dll");
        ResolvedDependencySet::from_context(&ScriptDependencyContext {
            dependencies: vec![ScriptDependency {
                name: "Newtonsoft.Json".to_string(),
                version: "12.0.3".to_string(),
                compile_time_paths: vec![dll.clone()],
                runtime_paths: vec![dll],
                native_asset_paths: vec![PathBuf::from("/packages/native/libdoes-not-exist.so")],
                script_paths: Vec::new(),
            }],
        })
    }

    #[derive(Default)]
    struct FakeHost {
        loaded: Vec<String>,
        loads: RefCell<Vec<PathBuf>>,
    }

    impl AssemblyHost for FakeHost {
        type Assembly = String;

        fn loaded_assembly(&self, name: &str) -> Option<String> {
            self.loaded.iter().find(|n| n.as_str() == name).map(|n| format!("loaded:{n}"))
        }

        fn load_from(&self, path: &Path) -> Result<String> {
            self.loads.borrow_mut().push(path.to_path_buf());
            Ok(format!("file:{}", path.display()))
        }
    }

    fn version(s: &str) -> Option<NuGetVersion> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn test_redirect_unversioned_and_older_requests() {
        let set = resolved_set();
        let resolver = AssemblyResolver::new(&set);

        assert!(resolver.redirect(&AssemblyRequest::new("newtonsoft.json", None)).is_some());
        assert!(resolver.redirect(&AssemblyRequest::new("Newtonsoft.Json", version("11.0.0"))).is_some());
        assert!(resolver.redirect(&AssemblyRequest::new("Newtonsoft.Json", version("12.0.3"))).is_none());
        assert!(resolver.redirect(&AssemblyRequest::new("Newtonsoft.Json", version("13.0.1"))).is_none());
        assert!(resolver.redirect(&AssemblyRequest::new("Moq", None)).is_none());
    }

    #[test]
    fn test_resolve_prefers_loaded_assembly() {
        let set = resolved_set();
        let resolver = AssemblyResolver::new(&set);
        let host = FakeHost {
            loaded: vec!["Newtonsoft.Json".to_string()],
            ..Default::default()
        };

        let assembly = resolver
            .resolve(&AssemblyRequest::new("Newtonsoft.Json", None), &host)
            .unwrap();

        assert_eq!(assembly.as_deref(), Some("loaded:Newtonsoft.Json"));
        assert!(host.loads.borrow().is_empty());
    }

    #[test]
    fn test_resolve_loads_from_path() {
        let set = resolved_set();
        let resolver = AssemblyResolver::new(&set);
        let host = FakeHost::default();

        let assembly = resolver
            .resolve(&AssemblyRequest::new("Newtonsoft.Json", None), &host)
            .unwrap();

        assert!(assembly.unwrap().ends_with("Newtonsoft.Json.dll"));
        assert_eq!(host.loads.borrow().len(), 1);
    }

    #[test]
    fn test_native_loading_is_noop_on_unsupported_platform() {
        let set = resolved_set();
        let mut loader = NativeAssetLoader::new(OsFamily::Other);

        assert_eq!(loader.load_native_assets(&set).unwrap(), 0);
        assert_eq!(loader.loaded_paths().count(), 0);
    }

    #[test]
    fn test_native_loading_reports_missing_library() {
        let set = resolved_set();
        let mut loader = NativeAssetLoader::new(OsFamily::Linux);

        let err = loader.load_native_assets(&set).unwrap_err();
        assert!(matches!(err, crate::error::Error::NativeLoad(_)));
    }
}
