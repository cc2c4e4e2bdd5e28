//! Project manifest synthesis.
//!
//! The generated project is a minimal SDK-style `.csproj` whose only job is
//! to drive a package restore. It carries the package references, local
//! assembly references and the target framework of a script graph.
//!
//! Manifests compare structurally (reference sets and framework, order
//! independent), which is what the restore cache keys on.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::collect::CollectedReferences;
use crate::error::{Error, Result};
use crate::reference::{AssemblyReference, PackageReference};

static PACKAGE_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<PackageReference\b([^>]*?)/?>").expect("package element pattern is valid")
});

static ASSEMBLY_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<Reference\b([^>]*?)/?>").expect("assembly element pattern is valid")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_][\w.-]*)\s*=\s*"([^"]*)""#).expect("attribute pattern is valid")
});

static TARGET_FRAMEWORK_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<TargetFramework>\s*([^<]*?)\s*</TargetFramework>")
        .expect("target framework pattern is valid")
});

/// In-memory form of the generated project file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectManifest {
    package_references: HashSet<PackageReference>,
    assembly_references: HashSet<AssemblyReference>,
    target_framework: String,
}

impl ProjectManifest {
    /// Empty manifest targeting `target_framework`.
    pub fn create(target_framework: impl Into<String>) -> Self {
        Self {
            package_references: HashSet::new(),
            assembly_references: HashSet::new(),
            target_framework: target_framework.into(),
        }
    }

    /// Manifest for a collected script graph.
    ///
    /// `default_framework` applies when no script declared one.
    pub fn from_collected(collected: CollectedReferences, default_framework: &str) -> Self {
        Self {
            package_references: collected.package_references,
            assembly_references: collected.assembly_references,
            target_framework: collected
                .target_framework
                .unwrap_or_else(|| default_framework.to_string()),
        }
    }

    /// Parse a rendered project file.
    pub fn parse(text: &str) -> Result<Self> {
        let target_framework = TARGET_FRAMEWORK_ELEMENT
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| unescape(m.as_str()))
            .ok_or_else(|| Error::Parse("project file has no <TargetFramework>".to_string()))?;

        let mut manifest = Self::create(target_framework);

        for caps in PACKAGE_ELEMENT.captures_iter(text) {
            let attributes = &caps[1];
            let Some(id) = attribute(attributes, "Include") else {
                continue;
            };
            let version = attribute(attributes, "Version").unwrap_or_default();
            manifest.add_package_reference(PackageReference::new(id, version));
        }

        for caps in ASSEMBLY_ELEMENT.captures_iter(text) {
            if let Some(path) = attribute(&caps[1], "Include") {
                manifest.add_assembly_reference(AssemblyReference::new(path));
            }
        }

        Ok(manifest)
    }

    /// Read and parse a project file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Render and write the project file.
    ///
    /// The content goes to a sibling temporary file first and is renamed
    /// into place, so readers never see a partial manifest.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        fs::write(&tmp_path, self.render())?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Render the project file text.
    ///
    /// Entries are sorted so the same manifest always renders identically.
    pub fn render(&self) -> String {
        let mut packages: Vec<&PackageReference> = self.package_references.iter().collect();
        packages.sort_by_key(|r| (r.id().to_ascii_lowercase(), r.version().to_string()));

        let mut assemblies: Vec<&AssemblyReference> = self.assembly_references.iter().collect();
        assemblies.sort_by(|a, b| a.path().cmp(b.path()));

        let mut xml = String::new();
        xml.push_str("<Project Sdk=\"Microsoft.NET.Sdk\">\n");
        xml.push_str("  <PropertyGroup>\n");
        xml.push_str("    <OutputType>Exe</OutputType>\n");
        xml.push_str(&format!(
            "    <TargetFramework>{}</TargetFramework>\n",
            escape(&self.target_framework)
        ));
        xml.push_str("    <EnableDefaultCompileItems>false</EnableDefaultCompileItems>\n");
        xml.push_str("    <EnableDefaultContentItems>false</EnableDefaultContentItems>\n");
        xml.push_str("  </PropertyGroup>\n");

        xml.push_str("  <ItemGroup>\n");
        for package in packages {
            xml.push_str(&format!(
                "    <PackageReference Include=\"{}\" Version=\"{}\" />\n",
                escape(package.id()),
                escape(package.version().as_str())
            ));
        }
        xml.push_str("  </ItemGroup>\n");

        xml.push_str("  <ItemGroup>\n");
        for assembly in assemblies {
            xml.push_str(&format!(
                "    <Reference Include=\"{}\" />\n",
                escape(&assembly.path().to_string_lossy())
            ));
        }
        xml.push_str("  </ItemGroup>\n");
        xml.push_str("</Project>\n");

        xml
    }

    pub fn add_package_reference(&mut self, reference: PackageReference) {
        self.package_references.insert(reference);
    }

    pub fn add_assembly_reference(&mut self, reference: AssemblyReference) {
        self.assembly_references.insert(reference);
    }

    pub fn package_references(&self) -> &HashSet<PackageReference> {
        &self.package_references
    }

    pub fn assembly_references(&self) -> &HashSet<AssemblyReference> {
        &self.assembly_references
    }

    pub fn target_framework(&self) -> &str {
        &self.target_framework
    }

    /// True when every package version is pinned, so a restore result can
    /// be reused as long as the manifest doesn't change.
    pub fn is_cacheable(&self) -> bool {
        self.package_references.iter().all(PackageReference::is_pinned)
    }
}

fn attribute(attributes: &str, name: &str) -> Option<String> {
    ATTRIBUTE
        .captures_iter(attributes)
        .find(|caps| caps[1].eq_ignore_ascii_case(name))
        .map(|caps| unescape(&caps[2]))
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
