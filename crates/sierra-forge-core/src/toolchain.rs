//! Probes for the external toolchain that builds a generated project.
//!
//! Generation does not need any of these tools; the results are reported as
//! warnings so users learn early that `gradle assembleDebug` will not work.

use crate::version::{detect_version, Version};

/// Information about a missing prerequisite tool.
#[derive(Debug, Clone)]
pub struct PrerequisiteError {
    pub tool_name: String,
    pub install_instructions: String,
}

/// Warning about a tool version being below the recommended minimum.
#[derive(Debug, Clone)]
pub struct VersionWarning {
    pub tool_name: String,
    pub found_version: String,
    pub minimum_version: String,
}

struct Tool {
    name: &'static str,
    install: &'static str,
    minimum: Version,
}

const TOOLS: &[Tool] = &[
    Tool {
        name: "cmake",
        install: "https://cmake.org/download/ (or the Android SDK cmake package)",
        minimum: Version {
            major: 3,
            minor: 22,
            patch: 1,
        },
    },
    Tool {
        name: "java",
        install: "https://adoptium.net/ (JDK 17)",
        minimum: Version {
            major: 17,
            minor: 0,
            patch: 0,
        },
    },
    Tool {
        name: "gradle",
        install: "https://gradle.org/install/",
        minimum: Version {
            major: 8,
            minor: 2,
            patch: 0,
        },
    },
];

/// Check that the tools needed to build the generated project are on `PATH`.
pub fn check_prerequisites() -> std::result::Result<(), Vec<PrerequisiteError>> {
    let missing: Vec<PrerequisiteError> = TOOLS
        .iter()
        .filter(|tool| which::which(tool.name).is_err())
        .map(|tool| PrerequisiteError {
            tool_name: tool.name.into(),
            install_instructions: tool.install.into(),
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(missing)
    }
}

/// Check installed tool versions against recommended minimums.
///
/// Tools that are missing or print no recognizable version are skipped.
pub fn check_versions() -> Vec<VersionWarning> {
    TOOLS
        .iter()
        .filter(|tool| which::which(tool.name).is_ok())
        .filter_map(|tool| {
            let found = detect_version(tool.name)?;
            (found < tool.minimum).then(|| VersionWarning {
                tool_name: tool.name.into(),
                found_version: found.to_string(),
                minimum_version: tool.minimum.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tools_carry_install_hints() {
        if let Err(missing) = check_prerequisites() {
            for m in missing {
                assert!(TOOLS.iter().any(|t| t.name == m.tool_name));
                assert!(!m.install_instructions.is_empty());
            }
        }
    }

    #[test]
    fn test_version_warnings_are_below_minimum() {
        for w in check_versions() {
            let found = Version::parse(&w.found_version).unwrap();
            let minimum = Version::parse(&w.minimum_version).unwrap();
            assert!(found < minimum);
        }
    }
}
