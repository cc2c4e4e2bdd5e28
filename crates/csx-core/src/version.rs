//! NuGet version model and the highest-version-wins policy.
//!
//! Versions follow the NuGet grammar:
//!
//! ```text
//! major[.minor[.patch[.revision]]][-prerelease][+metadata]
//! ```
//!
//! Ordering is numeric on the four release components. A release sorts
//! above any prerelease of the same numbers, prerelease labels compare
//! segment by segment (numeric segments numerically, others
//! case-insensitively) and build metadata is ignored.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A parsed NuGet package or assembly version.
#[derive(Debug, Clone)]
pub struct NuGetVersion {
    release: [u64; 4],
    prerelease: Vec<String>,
    original: String,
}

impl NuGetVersion {
    /// Major component.
    pub fn major(&self) -> u64 {
        self.release[0]
    }

    /// Minor component.
    pub fn minor(&self) -> u64 {
        self.release[1]
    }

    /// Patch component.
    pub fn patch(&self) -> u64 {
        self.release[2]
    }

    /// Whether this version carries a prerelease label.
    pub fn is_prerelease(&self) -> bool {
        !self.prerelease.is_empty()
    }

    /// The version string as it was written.
    pub fn as_str(&self) -> &str {
        &self.original
    }
}

impl FromStr for NuGetVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let original = s.trim();
        let invalid = || Error::Parse(format!("invalid version '{}'", original));

        let without_metadata = original.split('+').next().unwrap_or_default();
        let (numbers, prerelease) = match without_metadata.split_once('-') {
            Some((numbers, label)) => (numbers, Some(label)),
            None => (without_metadata, None),
        };

        let mut release = [0u64; 4];
        let parts: Vec<&str> = numbers.split('.').collect();
        if parts.is_empty() || parts.len() > 4 {
            return Err(invalid());
        }
        for (slot, part) in release.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| invalid())?;
        }

        let prerelease = match prerelease {
            Some(label) => {
                let segments: Vec<String> = label.split('.').map(str::to_string).collect();
                if segments.iter().any(|s| s.is_empty()) {
                    return Err(invalid());
                }
                segments
            }
            None => Vec::new(),
        };

        Ok(Self {
            release,
            prerelease,
            original: original.to_string(),
        })
    }
}

impl fmt::Display for NuGetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl Ord for NuGetVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.release
            .cmp(&other.release)
            .then_with(|| compare_prerelease(&self.prerelease, &other.prerelease))
    }
}

impl PartialOrd for NuGetVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for NuGetVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NuGetVersion {}

fn compare_prerelease(a: &[String], b: &[String]) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }

    for (left, right) in a.iter().zip(b) {
        let ordering = match (left.parse::<u64>(), right.parse::<u64>()) {
            (Ok(l), Ok(r)) => l.cmp(&r),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => left.to_lowercase().cmp(&right.to_lowercase()),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    a.len().cmp(&b.len())
}

/// Compare two version strings, treating unparseable versions as lowest.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (a.parse::<NuGetVersion>(), b.parse::<NuGetVersion>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Pick the item with the highest version.
///
/// Ties keep the first item encountered.
pub fn highest_version<T, I, F>(items: I, version_of: F) -> Option<T>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> &str,
{
    let mut best: Option<T> = None;
    for item in items {
        best = match best {
            Some(current)
                if compare_versions(version_of(&item), version_of(&current))
                    != Ordering::Greater =>
            {
                Some(current)
            }
            _ => Some(item),
        };
    }
    best
}
