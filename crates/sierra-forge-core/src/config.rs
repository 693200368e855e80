//! Optional `sierra-forge.json` generation config.
//!
//! Every field can also be given on the command line; CLI values win. Relative
//! `template` and `output` paths are resolved against the directory holding
//! the config file, not the working directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ForgeError, Result};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "sierra-forge.json";

/// Version name used when neither the config nor the CLI provides one.
pub const DEFAULT_VERSION_NAME: &str = "1.0.0";

/// Generation settings read from `sierra-forge.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForgeConfig {
    /// Application name.
    pub name: Option<String>,
    /// Application version name, e.g. `1.0.0`.
    pub version_name: Option<String>,
    /// Template root; the built-in Android template when absent.
    pub template: Option<PathBuf>,
    /// Output root; `./<name>` when absent.
    pub output: Option<PathBuf>,
    /// Replace a non-empty output root.
    pub overwrite: bool,
}

impl ForgeConfig {
    /// Load a config file. Relative paths inside it are made relative to the
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ForgeError::ConfigNotFound {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut config: Self =
            serde_json::from_str(&contents).map_err(|e| ForgeError::ConfigParse {
                path: path.to_path_buf(),
                source: e,
            })?;

        let base = path.parent().unwrap_or(Path::new(""));
        config.template = config.template.map(|p| base.join(p));
        config.output = config.output.map(|p| base.join(p));
        Ok(config)
    }

    /// Load `path` if it exists. A missing file is only an error when the
    /// user named it explicitly.
    pub fn load_or_default(path: &Path, explicit: bool) -> Result<Self> {
        if !explicit && !path.exists() {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| ForgeError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn version_name_or_default(&self) -> &str {
        self.version_name.as_deref().unwrap_or(DEFAULT_VERSION_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_implicit_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = ForgeConfig::load_or_default(&dir.path().join(CONFIG_FILE), false).unwrap();
        assert_eq!(config, ForgeConfig::default());
        assert_eq!(config.version_name_or_default(), DEFAULT_VERSION_NAME);
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ForgeConfig::load_or_default(&dir.path().join("custom.json"), true).unwrap_err();
        assert!(matches!(err, ForgeError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_relative_paths_follow_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"{ "name": "Sandbox", "version_name": "2.0.1", "template": "tmpl", "output": "out/Sandbox" }"#,
        )
        .unwrap();

        let config = ForgeConfig::load(&path).unwrap();
        assert_eq!(config.name.as_deref(), Some("Sandbox"));
        assert_eq!(config.version_name_or_default(), "2.0.1");
        assert_eq!(config.template, Some(dir.path().join("tmpl")));
        assert_eq!(config.output, Some(dir.path().join("out/Sandbox")));
        assert!(!config.overwrite);
    }

    #[test]
    fn test_malformed_config_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "name": "Sandbox", "colour": "blue" }"#).unwrap();
        let err = ForgeConfig::load(&path).unwrap_err();
        assert!(matches!(err, ForgeError::ConfigParse { .. }));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let config = ForgeConfig {
            name: Some("Sandbox".into()),
            version_name: Some("1.0.0".into()),
            overwrite: true,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ForgeConfig::load(&path).unwrap(), config);
    }
}
