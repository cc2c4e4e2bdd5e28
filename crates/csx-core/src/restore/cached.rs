//! Restore caching keyed on the manifest content.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::manifest::ProjectManifest;
use crate::paths::cache_path_for;

use super::{RestoreOutcome, Restorer};

/// Skips restore when the manifest equals the copy cached after the last
/// successful restore.
///
/// The cache copy lives at `<manifest>.cache` and is only written for
/// manifests whose package versions are all pinned. Package sources are not
/// part of the key.
pub struct CachedRestorer<R> {
    inner: R,
}

impl<R: Restorer> CachedRestorer<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    fn is_cache_hit(manifest: &ProjectManifest, cache_path: &Path) -> bool {
        if !cache_path.exists() {
            tracing::debug!("No cached manifest at {}", cache_path.display());
            return false;
        }

        match ProjectManifest::load(cache_path) {
            Ok(cached) => cached == *manifest,
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable cached manifest {}: {}",
                    cache_path.display(),
                    e
                );
                false
            }
        }
    }
}

impl<R: Restorer> Restorer for CachedRestorer<R> {
    fn restore(&self, manifest_path: &Path, package_sources: &[String]) -> Result<RestoreOutcome> {
        let manifest = ProjectManifest::load(manifest_path)?;
        let cache_path = cache_path_for(manifest_path);

        if Self::is_cache_hit(&manifest, &cache_path) {
            tracing::info!("Using cached restore for {}", manifest_path.display());
            return Ok(RestoreOutcome::CacheHit);
        }

        let outcome = self.inner.restore(manifest_path, package_sources)?;

        if manifest.is_cacheable() {
            manifest.save(&cache_path)?;
            tracing::debug!("Cached manifest at {}", cache_path.display());
        } else {
            tracing::warn!(
                "Unable to cache the restore of {}: found one or more floating or unpinned package versions",
                manifest_path.display()
            );
            // A stale copy would match again once the versions are pinned back.
            if cache_path.exists() {
                fs::remove_file(&cache_path)?;
            }
        }

        Ok(outcome)
    }

    fn can_restore(&self) -> bool {
        self.inner.can_restore()
    }
}
