//! Ordered restorer candidates.

use std::path::Path;

use crate::error::{Error, Result};

use super::{RestoreOutcome, Restorer};

/// Delegates to the first candidate whose [`Restorer::can_restore`] is true.
pub struct FallbackRestorer {
    candidates: Vec<Box<dyn Restorer>>,
}

impl FallbackRestorer {
    pub fn new(candidates: Vec<Box<dyn Restorer>>) -> Self {
        Self { candidates }
    }

    fn select(&self) -> Option<&dyn Restorer> {
        self.candidates
            .iter()
            .map(|candidate| &**candidate)
            .find(|candidate| candidate.can_restore())
    }
}

impl Restorer for FallbackRestorer {
    fn restore(&self, manifest_path: &Path, package_sources: &[String]) -> Result<RestoreOutcome> {
        let Some(restorer) = self.select() else {
            return Err(Error::NoRestorer(format!(
                "none of {} candidate(s) can restore {}",
                self.candidates.len(),
                manifest_path.display()
            )));
        };
        restorer.restore(manifest_path, package_sources)
    }

    fn can_restore(&self) -> bool {
        self.select().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Stub {
        available: bool,
        calls: Rc<Cell<usize>>,
    }

    impl Restorer for Stub {
        fn restore(&self, _: &Path, _: &[String]) -> Result<RestoreOutcome> {
            self.calls.set(self.calls.get() + 1);
            Ok(RestoreOutcome::Restored)
        }

        fn can_restore(&self) -> bool {
            self.available
        }
    }

    fn stub(available: bool) -> (Box<dyn Restorer>, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let stub = Stub {
            available,
            calls: Rc::clone(&calls),
        };
        (Box::new(stub), calls)
    }

    #[test]
    fn test_first_available_candidate_wins() {
        let (unavailable, unavailable_calls) = stub(false);
        let (first, first_calls) = stub(true);
        let (second, second_calls) = stub(true);
        let restorer = FallbackRestorer::new(vec![unavailable, first, second]);

        assert!(restorer.can_restore());
        restorer.restore(Path::new("script.csproj"), &[]).unwrap();

        assert_eq!(unavailable_calls.get(), 0);
        assert_eq!(first_calls.get(), 1);
        assert_eq!(second_calls.get(), 0);
    }

    #[test]
    fn test_no_candidate_available() {
        let (unavailable, _) = stub(false);
        let restorer = FallbackRestorer::new(vec![unavailable]);

        assert!(!restorer.can_restore());
        let err = restorer.restore(Path::new("script.csproj"), &[]).unwrap_err();
        assert!(matches!(err, Error::NoRestorer(_)));
    }
}
