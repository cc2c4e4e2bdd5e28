//! Restore timing.

use std::path::Path;
use std::time::Instant;

use crate::error::Result;

use super::{RestoreOutcome, Restorer};

/// Logs how long the wrapped restorer took.
pub struct ProfiledRestorer<R> {
    inner: R,
}

impl<R: Restorer> ProfiledRestorer<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Restorer> Restorer for ProfiledRestorer<R> {
    fn restore(&self, manifest_path: &Path, package_sources: &[String]) -> Result<RestoreOutcome> {
        let start = Instant::now();
        let result = self.inner.restore(manifest_path, package_sources);
        let elapsed = start.elapsed();

        match &result {
            Ok(outcome) => tracing::info!(
                "Restore of {} finished in {}ms ({:?})",
                manifest_path.display(),
                elapsed.as_millis(),
                outcome
            ),
            Err(_) => tracing::debug!(
                "Restore of {} failed after {}ms",
                manifest_path.display(),
                elapsed.as_millis()
            ),
        }

        result
    }

    fn can_restore(&self) -> bool {
        self.inner.can_restore()
    }
}
