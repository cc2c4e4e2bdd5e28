//! Runtime identifier fallback graph.
//!
//! Each RID imports more general RIDs; expanding a RID gives the ordered
//! chain of identifiers whose assets are compatible with it, most specific
//! first. Packages can extend the graph by shipping a `runtime.json`:
//!
//! ```text
//! { "runtimes": { "win10-x64": { "#import": ["win10", "win-x64"] } } }
//! ```

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Deserialize;

/// Built-in imports for the identifiers hosts commonly report.
const BUILTIN: &[(&str, &[&str])] = &[
    ("any", &[]),
    ("win", &["any"]),
    ("win-x86", &["win"]),
    ("win-x64", &["win"]),
    ("win-arm64", &["win"]),
    ("win7", &["win"]),
    ("win7-x64", &["win7", "win-x64"]),
    ("win10", &["win"]),
    ("win10-x64", &["win10", "win-x64"]),
    ("win10-arm64", &["win10", "win-arm64"]),
    ("unix", &["any"]),
    ("unix-x64", &["unix"]),
    ("unix-arm", &["unix"]),
    ("unix-arm64", &["unix"]),
    ("linux", &["unix"]),
    ("linux-x64", &["linux", "unix-x64"]),
    ("linux-arm", &["linux", "unix-arm"]),
    ("linux-arm64", &["linux", "unix-arm64"]),
    ("linux-musl", &["linux"]),
    ("linux-musl-x64", &["linux-musl", "linux-x64"]),
    ("linux-musl-arm64", &["linux-musl", "linux-arm64"]),
    ("osx", &["unix"]),
    ("osx-x64", &["osx", "unix-x64"]),
    ("osx-arm64", &["osx", "unix-arm64"]),
    ("freebsd", &["unix"]),
    ("freebsd-x64", &["freebsd", "unix-x64"]),
];

#[derive(Debug, Deserialize)]
struct RuntimeJson {
    #[serde(default)]
    runtimes: HashMap<String, RuntimeDescription>,
}

#[derive(Debug, Deserialize)]
struct RuntimeDescription {
    #[serde(default, rename = "#import")]
    imports: Vec<String>,
}

/// RID import graph.
#[derive(Debug, Clone, Default)]
pub struct RuntimeGraph {
    imports: HashMap<String, Vec<String>>,
}

impl RuntimeGraph {
    /// Graph with the built-in identifiers.
    pub fn builtin() -> Self {
        let imports = BUILTIN
            .iter()
            .map(|(rid, imports)| {
                (
                    rid.to_string(),
                    imports.iter().map(|i| i.to_string()).collect(),
                )
            })
            .collect();
        Self { imports }
    }

    /// Parse a package `runtime.json`.
    pub fn parse(json: &str) -> serde_json::Result<Self> {
        let parsed: RuntimeJson = serde_json::from_str(json)?;
        let imports = parsed
            .runtimes
            .into_iter()
            .map(|(rid, description)| (rid, description.imports))
            .collect();
        Ok(Self { imports })
    }

    /// Add the imports of `other`, keeping existing edges first.
    pub fn merge(&mut self, other: RuntimeGraph) {
        for (rid, imports) in other.imports {
            let existing = self.imports.entry(rid).or_default();
            for import in imports {
                if !existing.contains(&import) {
                    existing.push(import);
                }
            }
        }
    }

    /// Breadth-first fallback chain for `rid`, starting with `rid` itself
    /// and always ending with `any`.
    pub fn expand(&self, rid: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([rid.to_string()]);

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(imports) = self.imports.get(&current) {
                queue.extend(imports.iter().cloned());
            }
            chain.push(current);
        }

        // "any" always sorts last, even when it was reached early.
        chain.retain(|r| r != "any");
        chain.push("any".to_string());
        chain
    }
}
