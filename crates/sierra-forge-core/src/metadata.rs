//! Application identity supplied once per generation run.

use crate::error::{ForgeError, Result};
use crate::version::Version;

/// Namespace prefix every generated application package lives under.
pub const PACKAGE_PREFIX: &str = "com.sierra";

/// Identity values for one concrete application instantiation.
///
/// Construct through [`ApplicationMetadata::new`], which validates the name and
/// version before anything else in the pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationMetadata {
    name: String,
    version_name: String,
    version: Version,
    package: String,
}

impl ApplicationMetadata {
    pub fn new(name: impl Into<String>, version_name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let version_name = version_name.into();

        validate_name(&name)?;
        let version = validate_version_name(&version_name)?;
        let package = format!("{PACKAGE_PREFIX}.{name}");

        Ok(Self {
            name,
            version_name,
            version,
            package,
        })
    }

    /// Application name; also the shared-library name and the package's last segment.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version_name(&self) -> &str {
        &self.version_name
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Fully-qualified package, e.g. `com.sierra.Sandbox`.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Android `versionCode` derived from the version name.
    pub fn version_code(&self) -> u32 {
        // validated in `new`
        self.version.version_code().unwrap_or_default()
    }
}

/// Keywords of the languages the name is spliced into (Java/Kotlin packages and classes).
const RESERVED_NAMES: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "false", "final", "finally",
    "float", "for", "goto", "if", "implements", "import", "instanceof", "int", "interface",
    "long", "native", "new", "null", "package", "private", "protected", "public", "return",
    "short", "static", "super", "switch", "synchronized", "this", "throw", "throws", "transient",
    "true", "try", "void", "volatile", "while", "fun", "val", "var", "object",
];

fn validate_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| ForgeError::InvalidApplicationName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let first = name.chars().next().ok_or_else(|| invalid("name is empty"))?;
    if first.is_ascii_digit() {
        return Err(invalid("name must not start with a digit"));
    }
    if let Some(c) = name.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(invalid(&format!(
            "character '{c}' is not allowed (use ASCII letters, digits and '_')"
        )));
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(invalid("name is a reserved Java/Kotlin keyword"));
    }
    Ok(())
}

fn validate_version_name(version_name: &str) -> Result<Version> {
    let invalid = |reason: &str| ForgeError::InvalidVersionName {
        version: version_name.to_string(),
        reason: reason.to_string(),
    };

    if version_name.is_empty() {
        return Err(invalid("version name is empty"));
    }
    if let Some(c) = version_name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+' | '_')))
    {
        return Err(invalid(&format!("character '{c}' is not allowed")));
    }
    let version = Version::parse(version_name).ok_or_else(|| invalid("expected an X.Y.Z version"))?;
    if version.version_code().is_none() {
        return Err(invalid(
            "minor and patch must be below 100 to derive a version code",
        ));
    }
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sandbox_metadata() {
        let meta = ApplicationMetadata::new("Sandbox", "1.0.0").unwrap();
        assert_eq!(meta.name(), "Sandbox");
        assert_eq!(meta.package(), "com.sierra.Sandbox");
        assert_eq!(meta.version_code(), 10_000);
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = ApplicationMetadata::new("", "1.0.0").unwrap_err();
        assert!(matches!(err, ForgeError::InvalidApplicationName { .. }));
    }

    #[test]
    fn test_name_constraints() {
        for bad in ["1Game", "my-game", "my game", "Sandbox.App", "class", "Sänd"] {
            let err = ApplicationMetadata::new(bad, "1.0.0").unwrap_err();
            assert!(
                matches!(err, ForgeError::InvalidApplicationName { .. }),
                "{bad} should be rejected"
            );
        }
        for good in ["Sandbox", "_private", "Game2", "my_game"] {
            assert!(ApplicationMetadata::new(good, "1.0.0").is_ok(), "{good}");
        }
    }

    #[test]
    fn test_version_constraints() {
        for bad in ["", "1.0", "1.0.0 beta", "1/0/0", "1.100.0", "1.+2.3"] {
            let err = ApplicationMetadata::new("Sandbox", bad).unwrap_err();
            assert!(
                matches!(err, ForgeError::InvalidVersionName { .. }),
                "{bad} should be rejected"
            );
        }
        let meta = ApplicationMetadata::new("Sandbox", "2.4.1-rc1").unwrap();
        assert_eq!(meta.version_code(), 20_401);
    }
}
