//! Directive parsing for C# script source.
//!
//! Recognizes the pragma-like lines that drive dependency resolution:
//!
//! ```text
//! #r "nuget: Newtonsoft.Json, 12.0.3"     package reference
//! #load "nuget: Some.Scripts, 1.0.0"      package reference (script package)
//! #load "helpers/common.csx"              file load
//! #r "lib/Local.dll"                      local assembly reference
//! #! "net8.0"                             target framework
//! ```
//!
//! Matching is line-anchored (optional leading whitespace) and
//! case-insensitive on the directive and the `nuget:` prefix. Lines that
//! don't fit the grammar are skipped without error.

use std::sync::LazyLock;

use regex::Regex;

use crate::reference::PackageReference;

static PACKAGE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?im)^[ \t]*#(?:r|load)[ \t]*"[ \t]*nuget[ \t]*:[ \t]*([^,"\s]+)[ \t]*,[ \t]*([^"\r\n]*?)[ \t]*""#)
        .expect("package directive pattern is valid")
});

static LOAD_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?im)^[ \t]*#load[ \t]*"([^"\r\n]+)""#).expect("load directive pattern is valid")
});

static ASSEMBLY_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?im)^[ \t]*#r[ \t]*"([^"\r\n]+)""#).expect("assembly directive pattern is valid")
});

static TARGET_FRAMEWORK_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*#![ \t]*"([^"\r\n]+)""#)
        .expect("target framework pattern is valid")
});

/// Everything the directive scan found in one script file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptDirectives {
    /// `#r "nuget: ..."` and `#load "nuget: ..."` references, in source order.
    pub package_references: Vec<PackageReference>,

    /// Target framework from `#! "<tfm>"`, first occurrence.
    pub target_framework: Option<String>,

    /// File paths from `#load "<path>"`, as written.
    pub load_paths: Vec<String>,

    /// Local assembly paths from `#r "<file>.dll"`, as written.
    pub assembly_paths: Vec<String>,
}

/// Scan script text for directives.
pub fn parse_directives(source: &str) -> ScriptDirectives {
    let package_references = PACKAGE_DIRECTIVE
        .captures_iter(source)
        .filter_map(|caps| {
            let id = caps.get(1)?.as_str();
            let version = caps.get(2)?.as_str();
            Some(PackageReference::new(id, version))
        })
        .collect();

    let target_framework = TARGET_FRAMEWORK_DIRECTIVE
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|tfm| !tfm.is_empty());

    let load_paths = LOAD_DIRECTIVE
        .captures_iter(source)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|path| !path.is_empty() && !has_reference_scheme(path))
        .map(str::to_string)
        .collect();

    let assembly_paths = ASSEMBLY_DIRECTIVE
        .captures_iter(source)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|path| !has_reference_scheme(path) && path.to_ascii_lowercase().ends_with(".dll"))
        .map(str::to_string)
        .collect();

    ScriptDirectives {
        package_references,
        target_framework,
        load_paths,
        assembly_paths,
    }
}

/// `nuget:` and `sdk:` references are resolved by restore, not the filesystem.
fn has_reference_scheme(path: &str) -> bool {
    let lower = path.trim_start().to_ascii_lowercase();
    ["nuget", "sdk"].iter().any(|scheme| {
        lower
            .strip_prefix(scheme)
            .is_some_and(|rest| rest.trim_start().starts_with(':'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_package_reference() {
        let directives = parse_directives(r#"#r "nuget: Newtonsoft.Json, 12.0.3""#);

        assert_eq!(
            directives.package_references,
            vec![PackageReference::new("Newtonsoft.Json", "12.0.3")]
        );
    }

    #[test]
    fn test_whitespace_and_case_variants() {
        let source = r#"
  #r "NuGet :Moq ,4.14.5"
	#R "nuget:AutoMapper,6.1.0"
#r    "  nuget: Serilog, [2.10.0]  "
"#;
        let directives = parse_directives(source);
        let ids: Vec<_> = directives
            .package_references
            .iter()
            .map(|r| (r.id().to_string(), r.version().to_string()))
            .collect();

        assert_eq!(
            ids,
            vec![
                ("Moq".to_string(), "4.14.5".to_string()),
                ("AutoMapper".to_string(), "6.1.0".to_string()),
                ("Serilog".to_string(), "[2.10.0]".to_string()),
            ]
        );
    }

    #[test]
    fn test_version_range_keeps_comma() {
        let directives = parse_directives(r#"#r "nuget: Foo, [1.0, 2.0)""#);

        assert_eq!(directives.package_references.len(), 1);
        assert_eq!(directives.package_references[0].version().as_str(), "[1.0, 2.0)");
        assert!(!directives.package_references[0].is_pinned());
    }

    #[test]
    fn test_nuget_load_is_package_not_file() {
        let source = r#"
#load "nuget: Some.Scripts, 1.0.0"
#load "helper.csx"
#load "sdk: Microsoft.NET.Sdk.Web"
"#;
        let directives = parse_directives(source);

        assert_eq!(
            directives.package_references,
            vec![PackageReference::new("Some.Scripts", "1.0.0")]
        );
        assert_eq!(directives.load_paths, vec!["helper.csx"]);
    }

    #[test]
    fn test_target_framework() {
        let source = "#!\"net6.0\"\n#! \"net8.0\"\nConsole.WriteLine();";
        let directives = parse_directives(source);

        assert_eq!(directives.target_framework.as_deref(), Some("net6.0"));
    }

    #[test]
    fn test_shebang_is_not_a_framework() {
        let directives = parse_directives("#!/usr/bin/env dotnet-script\n");
        assert_eq!(directives.target_framework, None);
    }

    #[test]
    fn test_assembly_reference() {
        let source = r#"
#r "lib/Local.dll"
#r "System.Net.Http"
#r "nuget: Foo, 1.0.0"
"#;
        let directives = parse_directives(source);

        assert_eq!(directives.assembly_paths, vec!["lib/Local.dll"]);
    }

    #[test]
    fn test_malformed_lines_are_ignored() {
        let source = r##"
#r "nuget: MissingVersion"
#r "nuget: Unterminated, 1.0.0
// #r "nuget: Commented, 1.0.0"
var x = "#r \"nuget: Inline, 1.0.0\"";
#load helper.csx
"##;
        let directives = parse_directives(source);

        assert!(directives.package_references.is_empty());
        assert!(directives.load_paths.is_empty());
    }

    #[test]
    fn test_parse_is_deterministic() {
        let source = "#r \"nuget: A, 1.0.0\"\n#load \"b.csx\"\n";
        assert_eq!(parse_directives(source), parse_directives(source));
    }
}
