//! Unified error types for sierra-forge.

use std::path::PathBuf;
use thiserror::Error;

use crate::finalizer::IdentityRole;

/// All errors that can occur while generating or verifying a project.
///
/// Every variant aborts the whole generation. None of them leave a partially
/// written output tree behind.
#[derive(Error, Debug)]
pub enum ForgeError {
    // --- Configuration ---

    /// The configuration file (`sierra-forge.json`) was not found.
    #[error("config file not found at {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file exists but contains invalid JSON.
    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // --- Metadata ---

    /// The application name is not usable as a namespace segment, a shared
    /// library name and a class/directory name at the same time.
    #[error("invalid application name '{name}': {reason}")]
    InvalidApplicationName { name: String, reason: String },

    /// The version name does not contain an `X.Y.Z` version or has characters
    /// that cannot appear in build descriptors.
    #[error("invalid version name '{version}': {reason}")]
    InvalidVersionName { version: String, reason: String },

    // --- Templates ---

    /// The template root does not exist or contains no files.
    #[error("template not found (or empty): {0}")]
    TemplateNotFound(PathBuf),

    /// A `${TOKEN}` in a renderable file (or path) has no value in the token mapping.
    #[error("unresolved token '${{{token}}}' in {path} at byte {offset}")]
    UnresolvedToken {
        token: String,
        path: PathBuf,
        offset: usize,
    },

    // --- Assembly ---

    /// The output root is occupied, or two template files render to the same path.
    #[error("path collision at {path}: {reason}")]
    PathCollision { path: PathBuf, reason: String },

    /// A rendered path segment is empty, a dot segment, or contains a separator.
    #[error("template path {path} renders to invalid segment '{segment}'")]
    InvalidPathSegment { path: PathBuf, segment: String },

    /// Committing failed and the replaced output tree could not be moved
    /// back; it was left at `path`.
    #[error("commit failed and the previous output could not be restored; it is kept at {path}")]
    PreviousOutputKept {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // --- Finalizer ---

    /// An identity reference in the generated tree does not match the metadata.
    #[error("{role} mismatch in {path}: expected '{expected}', found '{found}'")]
    IdentityMismatch {
        role: IdentityRole,
        path: PathBuf,
        expected: String,
        found: String,
    },

    /// The generated tree declares no identity of the given role at all.
    #[error("no {role} declared anywhere in the generated project")]
    IdentityMissing { role: IdentityRole },

    // --- General ---

    /// A filesystem I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A catch-all for errors from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Alias for `Result<T, ForgeError>`.
pub type Result<T> = std::result::Result<T, ForgeError>;
