//! Enumerates a template tree into ordered render units.
//!
//! Each file is read once and classified as renderable text or opaque bytes.
//! The resulting list is sorted by relative path so that every later stage
//! sees the units in the same order on every run and platform.

use std::fs::Permissions;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{ForgeError, Result};
use crate::templates::embedded::{self, EmbeddedFile};

/// Extensions that are always rendered (given valid UTF-8).
const TEXT_EXTENSIONS: &[&str] = &[
    "xml", "gradle", "kts", "properties", "pro", "java", "kt", "c", "cc", "cpp", "cxx", "h",
    "hh", "hpp", "hxx", "m", "mm", "cmake", "txt", "md", "json", "toml", "yml", "yaml", "ini",
    "cfg", "sh", "bat", "py", "mk", "glsl", "vert", "frag", "comp", "geom", "tesc", "tese",
    "hlsl", "metal",
];

/// Extension-less files that are always rendered.
const TEXT_FILE_NAMES: &[&str] = &["gradlew", "Makefile", ".gitignore", ".gitattributes"];

/// Extensions that are always copied verbatim.
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "bmp", "ico", "ttf", "otf", "woff", "woff2", "so",
    "a", "o", "dll", "dylib", "jar", "aar", "apk", "dex", "class", "zip", "gz", "keystore",
    "jks", "ogg", "mp3", "wav", "spv", "ktx", "ktx2",
];

/// Version-control metadata is never part of a template.
const SKIPPED_DIRS: &[&str] = &[".git", ".hg", ".svn"];

/// How many leading bytes are inspected when sniffing unknown files.
const SNIFF_LEN: usize = 8 * 1024;

/// Where template files come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// The Android project skeleton compiled into the binary.
    Embedded,
    /// A template tree on disk.
    Directory(PathBuf),
}

impl TemplateSource {
    pub fn describe(&self) -> String {
        match self {
            Self::Embedded => "built-in Android template".to_string(),
            Self::Directory(path) => path.display().to_string(),
        }
    }
}

/// Content of a template file after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateContent {
    /// Text that goes through token substitution.
    Text(String),
    /// Bytes that are copied verbatim.
    Opaque(Vec<u8>),
}

/// One render unit: a template file and its renderability.
#[derive(Debug, Clone)]
pub struct TemplateFile {
    relative_path: PathBuf,
    content: TemplateContent,
    permissions: Option<Permissions>,
}

impl TemplateFile {
    pub fn new(relative_path: impl Into<PathBuf>, content: TemplateContent) -> Self {
        Self {
            relative_path: relative_path.into(),
            content,
            permissions: None,
        }
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    pub fn content(&self) -> &TemplateContent {
        &self.content
    }

    pub fn is_renderable(&self) -> bool {
        matches!(self.content, TemplateContent::Text(_))
    }

    /// Permission bits of the source file; `None` for embedded templates.
    pub fn permissions(&self) -> Option<&Permissions> {
        self.permissions.as_ref()
    }
}

/// Resolve a template source into render units ordered by relative path.
pub fn resolve(source: &TemplateSource) -> Result<Vec<TemplateFile>> {
    match source {
        TemplateSource::Embedded => Ok(resolve_embedded(embedded::ANDROID_PROJECT)),
        TemplateSource::Directory(root) => resolve_dir(root),
    }
}

/// Read every file below `root`.
///
/// Fails with [`ForgeError::TemplateNotFound`] if `root` is not a directory or
/// holds no files.
pub fn resolve_dir(root: &Path) -> Result<Vec<TemplateFile>> {
    if !root.is_dir() {
        return Err(ForgeError::TemplateNotFound(root.to_path_buf()));
    }

    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !(entry.file_type().is_dir()
                && SKIPPED_DIRS.iter().any(|d| entry.file_name() == *d))
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative_path = path
            .strip_prefix(root)
            .map_err(|e| anyhow::anyhow!("{} escapes template root: {e}", path.display()))?
            .to_path_buf();

        let bytes = std::fs::read(path)?;
        let permissions = entry.metadata().map_err(std::io::Error::from)?.permissions();
        let content = classify(&relative_path, bytes);
        tracing::debug!(
            "template unit {} ({})",
            relative_path.display(),
            if matches!(content, TemplateContent::Text(_)) { "render" } else { "copy" }
        );

        files.push(TemplateFile::new(relative_path, content).with_permissions(permissions));
    }

    if files.is_empty() {
        return Err(ForgeError::TemplateNotFound(root.to_path_buf()));
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(files)
}

/// Convert compiled-in template entries into render units.
pub fn resolve_embedded(entries: &[EmbeddedFile]) -> Vec<TemplateFile> {
    let mut files: Vec<TemplateFile> = entries
        .iter()
        .map(|entry| {
            TemplateFile::new(
                PathBuf::from(entry.path),
                TemplateContent::Text(entry.contents.to_string()),
            )
        })
        .collect();
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    files
}

/// Decide whether a file is rendered or copied.
///
/// Known binary extensions are opaque, known text extensions and names are
/// renderable, everything else is sniffed. Text that is not valid UTF-8 is
/// always treated as opaque.
pub fn classify(relative_path: &Path, bytes: Vec<u8>) -> TemplateContent {
    let extension = relative_path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let file_name = relative_path.file_name().and_then(|n| n.to_str()).unwrap_or("");

    let is_binary_ext = extension
        .as_deref()
        .is_some_and(|ext| BINARY_EXTENSIONS.contains(&ext));
    if is_binary_ext {
        return TemplateContent::Opaque(bytes);
    }

    let is_text_ext = extension
        .as_deref()
        .is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext))
        || TEXT_FILE_NAMES.contains(&file_name);

    if !is_text_ext && bytes[..bytes.len().min(SNIFF_LEN)].contains(&0) {
        return TemplateContent::Opaque(bytes);
    }

    match String::from_utf8(bytes) {
        Ok(text) => TemplateContent::Text(text),
        Err(e) => {
            if is_text_ext {
                tracing::warn!(
                    "{} is not valid UTF-8, copying without substitution",
                    relative_path.display()
                );
            }
            TemplateContent::Opaque(e.into_bytes())
        }
    }
}
