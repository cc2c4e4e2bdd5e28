//! Package restore for generated script projects.
//!
//! Restore is expressed as one capability, [`Restorer`], with small
//! implementations that wrap each other:
//!
//! ```text
//! ProfiledRestorer          timing
//!   └── CachedRestorer      skip restore when the manifest is unchanged
//!         └── FallbackRestorer
//!               ├── DotnetRestorer (dotnet restore -r <rid>)
//!               └── ...           further candidates, first available wins
//! ```
//!
//! [`default_restorer`] builds this chain from a [`ScriptEnvironment`].

mod cached;
mod dotnet;
mod fallback;
mod process;
mod profiled;

use std::path::Path;

use crate::environment::ScriptEnvironment;
use crate::error::Result;

pub use cached::CachedRestorer;
pub use dotnet::DotnetRestorer;
pub use fallback::FallbackRestorer;
pub use process::{CapturedOutput, run_captured};
pub use profiled::ProfiledRestorer;

/// What a restore call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The external tool ran.
    Restored,
    /// The cached manifest matched, nothing ran.
    CacheHit,
}

/// Something that can restore the packages of a project manifest.
pub trait Restorer {
    /// Restore the project at `manifest_path` using `package_sources` in
    /// addition to the tool's configured feeds.
    fn restore(&self, manifest_path: &Path, package_sources: &[String]) -> Result<RestoreOutcome>;

    /// Whether this restorer can run on this machine. Must not mutate state.
    fn can_restore(&self) -> bool;
}

impl<R: Restorer + ?Sized> Restorer for Box<R> {
    fn restore(&self, manifest_path: &Path, package_sources: &[String]) -> Result<RestoreOutcome> {
        (**self).restore(manifest_path, package_sources)
    }

    fn can_restore(&self) -> bool {
        (**self).can_restore()
    }
}

/// Profiled, optionally cached restorer over the dotnet candidate.
pub fn default_restorer(env: &ScriptEnvironment, use_cache: bool) -> Box<dyn Restorer> {
    let candidates = FallbackRestorer::new(vec![Box::new(DotnetRestorer::new(env))]);
    if use_cache {
        Box::new(ProfiledRestorer::new(CachedRestorer::new(candidates)))
    } else {
        Box::new(ProfiledRestorer::new(candidates))
    }
}
