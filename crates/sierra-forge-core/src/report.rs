//! Digest report of a generated project.
//!
//! Records every output file with its SHA-256 so that two generations can be
//! compared without diffing trees. Saved as pretty JSON when the CLI is given
//! `--report`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ForgeError, Result};
use crate::metadata::ApplicationMetadata;
use crate::templates::renderer::RenderedFile;

/// One file of the generated tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDigest {
    /// `/`-separated path relative to the project root.
    pub path: String,
    /// Whether tokens were substituted (`false` for copied binaries).
    pub rendered: bool,
    pub size: u64,
    /// Hex-encoded SHA-256 of the written content.
    pub sha256: String,
}

/// What a generation produced, in output-path order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub name: String,
    pub version_name: String,
    pub package: String,
    pub template: String,
    pub files: Vec<FileDigest>,
}

impl GenerationReport {
    pub fn new(metadata: &ApplicationMetadata, template: &str, files: &[RenderedFile]) -> Self {
        let mut files: Vec<FileDigest> = files
            .iter()
            .map(|file| FileDigest {
                path: file
                    .output_path
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/"),
                rendered: file.rendered,
                size: file.content.len() as u64,
                sha256: hex::encode(Sha256::digest(&file.content)),
            })
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));

        Self {
            name: metadata.name().to_string(),
            version_name: metadata.version_name().to_string(),
            package: metadata.package().to_string(),
            template: template.to_string(),
            files,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Save the report as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ForgeError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ForgeError::ConfigNotFound {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&contents).map_err(|e| ForgeError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
