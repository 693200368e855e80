//! Identity consistency check over a generated project tree.
//!
//! Reads the build descriptors of a finished tree and checks that every place
//! naming the application agrees with [`ApplicationMetadata`]:
//!
//! | File | Reference | Role |
//! |---|---|---|
//! | `AndroidManifest.xml` | `package="…"` | namespace |
//! | `AndroidManifest.xml` | `android.app.lib_name` meta-data | library name |
//! | `build.gradle(.kts)` | `namespace` | namespace |
//! | `build.gradle(.kts)` | `applicationId` | application id |
//! | `*.java` / `*.kt` | `System.loadLibrary("…")` | library name |
//! | `*.java` / `*.kt` | `package …` of a loading class | namespace |
//! | `CMakeLists.txt` | `add_library(… SHARED …)` | native target |
//!
//! The check never writes. It runs against the staged tree before commit and
//! can be run on its own against any existing project.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::error::{ForgeError, Result};
use crate::metadata::ApplicationMetadata;

/// What an identity reference names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentityRole {
    /// Manifest/gradle namespace or source package; must equal the package.
    Namespace,
    /// Gradle `applicationId`; must equal the package.
    ApplicationId,
    /// Library loaded at runtime; must equal the application name.
    LibraryName,
    /// Shared library built by CMake; one of them must equal the application name.
    NativeTarget,
}

impl IdentityRole {
    /// Roles that must be declared at least once in a generated project.
    pub const REQUIRED: [IdentityRole; 3] = [
        IdentityRole::Namespace,
        IdentityRole::ApplicationId,
        IdentityRole::LibraryName,
    ];

    fn expected<'a>(&self, metadata: &'a ApplicationMetadata) -> &'a str {
        match self {
            Self::Namespace | Self::ApplicationId => metadata.package(),
            Self::LibraryName | Self::NativeTarget => metadata.name(),
        }
    }
}

impl fmt::Display for IdentityRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Namespace => "package namespace",
            Self::ApplicationId => "application id",
            Self::LibraryName => "native library name",
            Self::NativeTarget => "native shared-library target",
        })
    }
}

/// One place in the tree that names the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityReference {
    pub role: IdentityRole,
    /// Path relative to the project root.
    pub path: PathBuf,
    /// 1-based line number.
    pub line: usize,
    pub value: String,
}

/// Every identity reference found in a verified tree.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IdentityReport {
    pub references: Vec<IdentityReference>,
}

impl IdentityReport {
    pub fn count(&self, role: IdentityRole) -> usize {
        self.references.iter().filter(|r| r.role == role).count()
    }
}

/// Check the tree at `root` against `metadata`.
pub fn verify(root: &Path, metadata: &ApplicationMetadata) -> Result<IdentityReport> {
    let references = collect_references(root)?;

    for reference in &references {
        if reference.role == IdentityRole::NativeTarget {
            continue;
        }
        let expected = reference.role.expected(metadata);
        if reference.value != expected {
            return Err(ForgeError::IdentityMismatch {
                role: reference.role,
                path: reference.path.clone(),
                expected: expected.to_string(),
                found: reference.value.clone(),
            });
        }
    }

    // CMake trees may build helper libraries too; only require that the
    // loaded one is among them.
    let targets: Vec<&IdentityReference> = references
        .iter()
        .filter(|r| r.role == IdentityRole::NativeTarget)
        .collect();
    if !targets.is_empty() && !targets.iter().any(|r| r.value == metadata.name()) {
        return Err(ForgeError::IdentityMismatch {
            role: IdentityRole::NativeTarget,
            path: targets[0].path.clone(),
            expected: metadata.name().to_string(),
            found: targets
                .iter()
                .map(|r| r.value.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        });
    }

    let report = IdentityReport { references };
    for role in IdentityRole::REQUIRED {
        if report.count(role) == 0 {
            return Err(ForgeError::IdentityMissing { role });
        }
    }

    tracing::debug!(
        "identity verified: {} references in {}",
        report.references.len(),
        root.display()
    );
    Ok(report)
}

/// Scan every descriptor and source file below `root`, in path order.
pub fn collect_references(root: &Path) -> Result<Vec<IdentityReference>> {
    let mut references = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() || !is_descriptor(entry.path()) {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let Ok(text) = std::fs::read_to_string(entry.path()) else {
            tracing::warn!("skipping non-UTF-8 descriptor {}", relative.display());
            continue;
        };
        references.extend(scan_file(relative, &text));
    }
    Ok(references)
}

fn is_descriptor(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    matches!(
        name,
        "AndroidManifest.xml" | "build.gradle" | "build.gradle.kts" | "CMakeLists.txt"
    ) || matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("java" | "kt")
    )
}

/// Extract identity references from one file's text.
pub fn scan_file(relative: &Path, text: &str) -> Vec<IdentityReference> {
    let name = relative.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let found = match name {
        "AndroidManifest.xml" => scan_manifest(text),
        "build.gradle" | "build.gradle.kts" => scan_gradle(text),
        "CMakeLists.txt" => scan_cmake(text),
        _ => scan_source(text),
    };
    found
        .into_iter()
        .map(|(role, at, value)| IdentityReference {
            role,
            path: relative.to_path_buf(),
            line: line_of(text, at),
            value,
        })
        .collect()
}

type Found = (IdentityRole, usize, String);

fn scan_manifest(text: &str) -> Vec<Found> {
    let mut found = Vec::new();
    for (at, element) in elements(text, "<manifest") {
        if let Some(package) = xml_attr(element, "package") {
            found.push((IdentityRole::Namespace, at, package.to_string()));
        }
    }
    for (at, element) in elements(text, "<meta-data") {
        if xml_attr(element, "android:name") == Some("android.app.lib_name") {
            let value = xml_attr(element, "android:value").unwrap_or_default();
            found.push((IdentityRole::LibraryName, at, value.to_string()));
        }
    }
    found
}

fn scan_gradle(text: &str) -> Vec<Found> {
    let mut found = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let code = line.split("//").next().unwrap_or("").trim();
        for (keyword, role) in [
            ("namespace", IdentityRole::Namespace),
            ("applicationId", IdentityRole::ApplicationId),
        ] {
            let Some(rest) = code.strip_prefix(keyword) else {
                continue;
            };
            if !rest.starts_with([' ', '\t', '=', '(']) {
                continue;
            }
            let rest = rest.trim_start_matches([' ', '\t', '=', '(']);
            if let Some(value) = quoted(rest) {
                found.push((role, offset, value.to_string()));
            }
        }
        offset += line.len();
    }
    found
}

fn scan_source(text: &str) -> Vec<Found> {
    const LOAD: &str = "System.loadLibrary(";

    let mut found: Vec<Found> = text
        .match_indices(LOAD)
        .filter_map(|(at, _)| {
            let value = quoted(text[at + LOAD.len()..].trim_start())?;
            Some((IdentityRole::LibraryName, at, value.to_string()))
        })
        .collect();

    // only classes that load the library are bound to the application package
    if !found.is_empty() {
        let mut offset = 0;
        for line in text.split_inclusive('\n') {
            if let Some(rest) = line.trim_start().strip_prefix("package ") {
                let package = rest.trim().trim_end_matches(';').trim();
                found.push((IdentityRole::Namespace, offset, package.to_string()));
                break;
            }
            offset += line.len();
        }
    }
    found
}

fn scan_cmake(text: &str) -> Vec<Found> {
    const ADD_LIBRARY: &str = "add_library(";

    // CMake commands are case-insensitive; ASCII lowering keeps byte offsets
    let lowered = text.to_ascii_lowercase();
    let project_name = lowered
        .find("project(")
        .and_then(|at| text[at + "project(".len()..].split([' ', '\t', '\n', ')']).find(|s| !s.is_empty()));

    lowered
        .match_indices(ADD_LIBRARY)
        .filter_map(|(at, _)| {
            let args = &text[at + ADD_LIBRARY.len()..];
            let args = &args[..args.find(')').unwrap_or(args.len())];
            let mut args = args.split_whitespace();
            let name = args.next()?;
            if !args.next()?.eq_ignore_ascii_case("SHARED") {
                return None;
            }
            let name = match (name, project_name) {
                ("${PROJECT_NAME}", Some(project)) => project,
                _ => name,
            };
            Some((IdentityRole::NativeTarget, at, name.to_string()))
        })
        .collect()
}

/// Start offsets and bodies (up to the closing `>`) of every `tag` element.
fn elements<'a>(text: &'a str, tag: &str) -> Vec<(usize, &'a str)> {
    text.match_indices(tag)
        .filter(|(at, _)| {
            text[at + tag.len()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_whitespace() || c == '>' || c == '/')
        })
        .map(|(at, _)| {
            let body = &text[at..];
            (at, &body[..body.find('>').map_or(body.len(), |end| end + 1)])
        })
        .collect()
}

/// Value of attribute `name` inside an element body.
fn xml_attr<'a>(element: &'a str, name: &str) -> Option<&'a str> {
    let mut search_from = 0;
    while let Some(found) = element[search_from..].find(name) {
        let at = search_from + found;
        search_from = at + name.len();
        if !element[..at].ends_with(char::is_whitespace) {
            continue;
        }
        let Some(rest) = element[search_from..].trim_start().strip_prefix('=') else {
            continue;
        };
        return quoted(rest.trim_start());
    }
    None
}

/// Contents of a leading `"…"` or `'…'` string.
fn quoted(s: &str) -> Option<&str> {
    let quote = s.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let body = &s[1..];
    body.find(quote).map(|end| &body[..end])
}

fn line_of(text: &str, at: usize) -> usize {
    text[..at].bytes().filter(|b| *b == b'\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sandbox() -> ApplicationMetadata {
        ApplicationMetadata::new("Sandbox", "1.0.0").unwrap()
    }

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    fn consistent_tree(root: &Path) {
        write(
            root,
            "app/build.gradle",
            "android {\n    namespace 'com.sierra.Sandbox'\n    defaultConfig {\n        applicationId = \"com.sierra.Sandbox\"\n    }\n}\n",
        );
        write(
            root,
            "app/src/main/AndroidManifest.xml",
            "<manifest xmlns:android=\"http://schemas.android.com/apk/res/android\">\n  <meta-data\n      android:name=\"android.app.lib_name\"\n      android:value=\"Sandbox\" />\n</manifest>\n",
        );
        write(
            root,
            "app/src/main/java/com/sierra/Sandbox/SandboxActivity.java",
            "package com.sierra.Sandbox;\n\nclass SandboxActivity {\n    static { System.loadLibrary(\"Sandbox\"); }\n}\n",
        );
        write(
            root,
            "app/src/main/cpp/CMakeLists.txt",
            "project(Sandbox)\nadd_library(${PROJECT_NAME} SHARED main.cpp)\nadd_library(helpers STATIC h.cpp)\n",
        );
    }

    #[test]
    fn test_consistent_tree_passes() {
        let dir = tempfile::tempdir().unwrap();
        consistent_tree(dir.path());
        let report = verify(dir.path(), &sandbox()).unwrap();
        assert_eq!(report.count(IdentityRole::Namespace), 2);
        assert_eq!(report.count(IdentityRole::ApplicationId), 1);
        assert_eq!(report.count(IdentityRole::LibraryName), 2);
        assert_eq!(report.count(IdentityRole::NativeTarget), 1);
    }

    #[test]
    fn test_diverging_load_library_is_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        consistent_tree(dir.path());
        write(
            dir.path(),
            "app/src/main/java/com/sierra/Sandbox/SandboxActivity.java",
            "package com.sierra.Sandbox;\nclass A { static { System.loadLibrary(\"Sierra\"); } }\n",
        );
        let err = verify(dir.path(), &sandbox()).unwrap_err();
        match err {
            ForgeError::IdentityMismatch {
                role,
                expected,
                found,
                ..
            } => {
                assert_eq!(role, IdentityRole::LibraryName);
                assert_eq!(expected, "Sandbox");
                assert_eq!(found, "Sierra");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_diverging_application_id_is_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        consistent_tree(dir.path());
        write(
            dir.path(),
            "app/build.gradle",
            "namespace 'com.sierra.Sandbox'\napplicationId 'com.sierra.Other'\n",
        );
        let err = verify(dir.path(), &sandbox()).unwrap_err();
        assert!(matches!(
            err,
            ForgeError::IdentityMismatch {
                role: IdentityRole::ApplicationId,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_cmake_target_is_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        consistent_tree(dir.path());
        write(
            dir.path(),
            "app/src/main/cpp/CMakeLists.txt",
            "add_library(Engine SHARED e.cpp)\n",
        );
        let err = verify(dir.path(), &sandbox()).unwrap_err();
        assert!(matches!(
            err,
            ForgeError::IdentityMismatch {
                role: IdentityRole::NativeTarget,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_application_id_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        consistent_tree(dir.path());
        write(dir.path(), "app/build.gradle", "namespace 'com.sierra.Sandbox'\n");
        let err = verify(dir.path(), &sandbox()).unwrap_err();
        assert!(matches!(
            err,
            ForgeError::IdentityMissing {
                role: IdentityRole::ApplicationId
            }
        ));
    }

    #[test]
    fn test_verify_never_writes() {
        let dir = tempfile::tempdir().unwrap();
        consistent_tree(dir.path());
        let before: Vec<_> = WalkDir::new(dir.path())
            .sort_by_file_name()
            .into_iter()
            .map(|e| e.unwrap().path().to_path_buf())
            .collect();
        verify(dir.path(), &sandbox()).unwrap();
        let after: Vec<_> = WalkDir::new(dir.path())
            .sort_by_file_name()
            .into_iter()
            .map(|e| e.unwrap().path().to_path_buf())
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_scan_gradle_forms() {
        let refs = scan_file(
            Path::new("build.gradle.kts"),
            "// namespace 'ignored'\nnamespace = \"com.a.B\"\nnamespaceSuffix 'x'\napplicationId(\"com.a.B\")\n",
        );
        let values: Vec<_> = refs.iter().map(|r| (r.role, r.line, r.value.as_str())).collect();
        assert_eq!(
            values,
            vec![
                (IdentityRole::Namespace, 2, "com.a.B"),
                (IdentityRole::ApplicationId, 4, "com.a.B"),
            ]
        );
    }

    #[test]
    fn test_scan_manifest_package_attribute() {
        let refs = scan_file(
            Path::new("AndroidManifest.xml"),
            "<manifest package=\"com.sierra.Sandbox\">\n<meta-data android:name=\"other\" android:value=\"x\"/>\n</manifest>",
        );
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].role, IdentityRole::Namespace);
        assert_eq!(refs[0].value, "com.sierra.Sandbox");
    }

    #[test]
    fn test_source_without_load_has_no_namespace() {
        let refs = scan_file(Path::new("Util.java"), "package com.other.util;\nclass Util {}\n");
        assert!(refs.is_empty());
    }

    #[test]
    fn test_scan_cmake_keywords_any_case() {
        let refs = scan_file(
            Path::new("CMakeLists.txt"),
            "project(Sandbox)\nADD_LIBRARY(Sandbox shared main.cpp)\nadd_library(Helper STATIC h.cpp)\n",
        );
        let values: Vec<_> = refs.iter().map(|r| (r.role, r.line, r.value.as_str())).collect();
        assert_eq!(values, vec![(IdentityRole::NativeTarget, 2, "Sandbox")]);
    }
}
