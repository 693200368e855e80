//! Version parsing for application version names and external tool output.
//!
//! The same `X.Y.Z` scanner serves two callers: the token model derives the
//! Android `versionCode` from an application's version name, and the toolchain
//! probe reads the version printed by `cmake --version` and friends.

use std::fmt;
use std::process::Command;

/// A semver-like version with major.minor.patch components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    /// Parse the first `X.Y.Z` pattern found in a string.
    ///
    /// Handles common formats:
    /// - `"1.0.0"`
    /// - `"v2.3.1-beta"`
    /// - `"cmake version 3.28.1"`
    /// - `"openjdk 17.0.9 2023-10-17"`
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        (0..bytes.len())
            .filter(|&i| bytes[i].is_ascii_digit() && (i == 0 || !bytes[i - 1].is_ascii_digit()))
            .find_map(|i| Self::parse_at(s, i))
    }

    /// Try to parse `X.Y.Z` starting at byte offset `start`.
    fn parse_at(s: &str, start: usize) -> Option<Self> {
        let mut parts = s[start..].splitn(3, '.');
        let major = number(parts.next()?)?;
        let minor = number(parts.next()?)?;
        // patch may carry a suffix ("0-beta1", "1 2023-10-17")
        let patch_str: String = parts
            .next()?
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        let patch = number(&patch_str)?;

        Some(Self {
            major,
            minor,
            patch,
        })
    }

    /// Android `versionCode` for this version: `major * 10000 + minor * 100 + patch`.
    ///
    /// Returns `None` when minor or patch exceed two digits, since the encoding
    /// would no longer be monotonic.
    pub fn version_code(&self) -> Option<u32> {
        if self.minor > 99 || self.patch > 99 {
            return None;
        }
        self.major
            .checked_mul(10_000)?
            .checked_add(self.minor * 100 + self.patch)
    }
}

/// Digits only; `u32::from_str` alone would also take a leading `+`.
fn number(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Run `tool --version` and parse the output.
///
/// Returns `None` if the tool is not found, exits with error, or
/// produces output that doesn't contain an `X.Y.Z` pattern.
pub fn detect_version(tool: &str) -> Option<Version> {
    let output = Command::new(tool).arg("--version").output().ok()?;

    // java prints its version to stderr, so both streams are always tried
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if output.status.success() {
        Version::parse(&stdout).or_else(|| Version::parse(&stderr))
    } else {
        Version::parse(&stderr)
    }
}
