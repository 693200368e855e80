//! Writes rendered units into a project tree, all or nothing.
//!
//! Files are written into a hidden staging directory created next to the
//! output root (on the same filesystem), and the staged tree becomes the
//! output root through a single rename in [`StagedProject::commit`]. Dropping
//! a [`StagedProject`] without committing removes the staging directory, so a
//! failed generation never leaves a partial tree at the output root.
//!
//! ## Path renames
//!
//! Every segment of a template path is rendered with the same token rules as
//! file content:
//!
//! ```text
//! app/src/main/java/com/sierra/${APPLICATION_NAME}/${APPLICATION_NAME}Activity.java
//!   -> app/src/main/java/com/sierra/Sandbox/SandboxActivity.java
//! ```

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use tempfile::TempDir;

use crate::error::{ForgeError, Result};
use crate::templates::renderer::{RenderedFile, TemplateRenderer};
use crate::tokens::TokenMapping;

const STAGING_PREFIX: &str = ".sierra-forge-staging-";
const BACKUP_PREFIX: &str = ".sierra-forge-previous-";

/// Compute the output path of a template file by rendering each segment.
pub fn output_path(relative: &Path, tokens: &TokenMapping) -> Result<PathBuf> {
    let renderer = TemplateRenderer::new(tokens);
    let invalid = |segment: &str| ForgeError::InvalidPathSegment {
        path: relative.to_path_buf(),
        segment: segment.to_string(),
    };

    let mut output = PathBuf::new();
    let mut base = 0;
    for component in relative.components() {
        let segment = match component {
            Component::Normal(segment) => segment,
            Component::CurDir => continue,
            other => return Err(invalid(&other.as_os_str().to_string_lossy())),
        };

        let Some(text) = segment.to_str() else {
            // non-UTF-8 segments cannot hold tokens
            output.push(segment);
            base += segment.len() + 1;
            continue;
        };

        let rendered = renderer.render_str(text, relative).map_err(|e| match e {
            ForgeError::UnresolvedToken {
                token,
                path,
                offset,
            } => ForgeError::UnresolvedToken {
                token,
                path,
                offset: base + offset,
            },
            other => other,
        })?;

        if rendered.is_empty()
            || rendered == "."
            || rendered == ".."
            || rendered.contains(|c: char| c == '/' || c == '\\')
        {
            return Err(invalid(&rendered));
        }
        output.push(rendered);
        base += text.len() + 1;
    }

    if output.as_os_str().is_empty() {
        return Err(invalid(""));
    }
    Ok(output)
}

/// Fail unless generation may write `output_root`.
///
/// A missing or empty directory is always fine. Anything else is a
/// [`ForgeError::PathCollision`] unless `overwrite` is set.
pub fn check_output_root(output_root: &Path, overwrite: bool) -> Result<()> {
    if overwrite || !output_root.exists() {
        return Ok(());
    }

    if !output_root.is_dir() {
        return Err(ForgeError::PathCollision {
            path: output_root.to_path_buf(),
            reason: "output path exists and is not a directory".into(),
        });
    }

    if let Some(entry) = std::fs::read_dir(output_root)?.next() {
        return Err(ForgeError::PathCollision {
            path: entry?.path(),
            reason: "output directory is not empty and overwrite was not authorized".into(),
        });
    }
    Ok(())
}

/// Fail if two units render to the same path, or one unit's path is a
/// directory of another.
pub fn check_unique_paths(files: &[RenderedFile]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for file in files {
        if !seen.insert(file.output_path.as_path()) {
            return Err(ForgeError::PathCollision {
                path: file.output_path.clone(),
                reason: "two template files render to the same output path".into(),
            });
        }
    }
    for file in files {
        if let Some(dir) = file
            .output_path
            .ancestors()
            .skip(1)
            .find(|dir| seen.contains(dir))
        {
            return Err(ForgeError::PathCollision {
                path: dir.to_path_buf(),
                reason: format!(
                    "rendered file is also a directory of {}",
                    file.output_path.display()
                ),
            });
        }
    }
    Ok(())
}

/// A fully written project waiting to be moved into place.
#[derive(Debug)]
pub struct StagedProject {
    staging: TempDir,
    output_root: PathBuf,
    /// Absolute, symlink-resolved form of `output_root`; all filesystem
    /// operations of the commit use this path.
    target: PathBuf,
    file_count: usize,
}

impl StagedProject {
    /// Root of the staged tree. Read-only consumers (the finalizer) look here
    /// before anything is committed.
    pub fn root(&self) -> &Path {
        self.staging.path()
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }

    /// Move the staged tree to the output root.
    ///
    /// With `overwrite`, an existing output root is moved aside first and
    /// restored if the final rename fails; it is deleted only once the new
    /// tree is in place. Parent directories created for the output root are
    /// removed again when the rename fails.
    pub fn commit(self, overwrite: bool) -> Result<PathBuf> {
        check_output_root(&self.target, overwrite)?;

        let parent = parent_dir(&self.target)?;
        let mut previous: Option<(TempDir, PathBuf)> = None;
        let mut removed_empty = false;
        if self.target.is_dir() && std::fs::read_dir(&self.target)?.next().is_none() {
            std::fs::remove_dir(&self.target)?;
            removed_empty = true;
        } else if self.target.exists() {
            let backup = tempfile::Builder::new()
                .prefix(BACKUP_PREFIX)
                .tempdir_in(&parent)?;
            let moved = backup.path().join("previous");
            std::fs::rename(&self.target, &moved)?;
            tracing::debug!("moved previous output aside to {}", moved.display());
            previous = Some((backup, moved));
        }

        let created = first_missing_ancestor(&parent);
        std::fs::create_dir_all(&parent)?;

        let moved_in = set_tree_root_permissions(self.staging.path())
            .and_then(|()| Ok(std::fs::rename(self.staging.path(), &self.target)?));
        if let Err(e) = moved_in {
            if let Some(top) = &created {
                remove_created_dirs(&parent, top);
            }
            if let Some((backup, moved)) = previous {
                restore_previous(backup, &moved, &self.target)?;
            } else if removed_empty {
                std::fs::create_dir(&self.target)?;
            }
            return Err(e);
        }

        // staging path is gone after the rename; dropping the guards removes
        // only the moved-aside previous tree
        drop(previous);
        tracing::info!(
            "committed {} files to {}",
            self.file_count,
            self.output_root.display()
        );
        Ok(self.output_root)
    }
}

/// Write every rendered file into a fresh staging directory for `output_root`.
///
/// The staging directory is created next to the resolved output root, never
/// inside it, so an existing empty root (including `.`) can be replaced.
pub fn stage(files: &[RenderedFile], output_root: &Path) -> Result<StagedProject> {
    check_unique_paths(files)?;

    let target = resolve_target(output_root)?;
    let anchor = existing_ancestor(&parent_dir(&target)?);
    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(&anchor)?;
    tracing::debug!("staging project in {}", staging.path().display());

    for file in files {
        let dest = staging.path().join(&file.output_path);
        if let Some(dir) = dest.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&dest, &file.content)?;
        if let Some(permissions) = &file.permissions {
            std::fs::set_permissions(&dest, permissions.clone())?;
        }
    }

    Ok(StagedProject {
        staging,
        output_root: output_root.to_path_buf(),
        target,
        file_count: files.len(),
    })
}

/// Absolute form of `output_root` with symlinks and dot segments resolved.
/// Components below the nearest existing ancestor are appended as given.
fn resolve_target(output_root: &Path) -> Result<PathBuf> {
    let mut missing = Vec::new();
    let mut existing = output_root;
    loop {
        let lookup = if existing.as_os_str().is_empty() {
            Path::new(".")
        } else {
            existing
        };
        match lookup.canonicalize() {
            Ok(mut target) => {
                target.extend(missing.iter().rev());
                return Ok(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let Some(name) = existing.file_name() else {
                    return Err(e.into());
                };
                missing.push(name.to_os_string());
                existing = existing.parent().unwrap_or(Path::new(""));
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn parent_dir(target: &Path) -> Result<PathBuf> {
    target
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| ForgeError::PathCollision {
            path: target.to_path_buf(),
            reason: "output root has no parent directory".into(),
        })
}

/// Nearest existing ancestor, so staging never creates directories that a
/// failed run would leave behind.
fn existing_ancestor(path: &Path) -> PathBuf {
    path.ancestors()
        .find(|dir| dir.is_dir())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/"))
}

/// Topmost ancestor of `path` that does not exist yet.
fn first_missing_ancestor(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .take_while(|dir| !dir.exists())
        .last()
        .map(Path::to_path_buf)
}

/// Remove the empty directories from `dir` up to and including `top`.
fn remove_created_dirs(dir: &Path, top: &Path) {
    for created in dir.ancestors() {
        if let Err(e) = std::fs::remove_dir(created) {
            tracing::warn!("could not remove {}: {e}", created.display());
            break;
        }
        if created == top {
            break;
        }
    }
}

/// Move a set-aside output tree back to `target`. If that fails the backup
/// directory is kept on disk and its location is part of the error.
fn restore_previous(backup: TempDir, moved: &Path, target: &Path) -> Result<()> {
    if let Err(source) = std::fs::rename(moved, target) {
        let kept = backup.keep();
        tracing::error!(
            "failed to restore previous output, it is kept at {}: {source}",
            kept.display()
        );
        return Err(ForgeError::PreviousOutputKept {
            path: kept.join("previous"),
            source,
        });
    }
    Ok(())
}

/// Temp directories are created owner-only; the committed project root gets
/// regular directory permissions.
#[cfg(unix)]
fn set_tree_root_permissions(root: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(root, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_tree_root_permissions(_root: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ApplicationMetadata;

    fn tokens() -> TokenMapping {
        TokenMapping::from_metadata(&ApplicationMetadata::new("Sandbox", "1.0.0").unwrap())
    }

    fn rendered(path: &str, content: &str) -> RenderedFile {
        RenderedFile {
            output_path: PathBuf::from(path),
            content: content.as_bytes().to_vec(),
            rendered: true,
            permissions: None,
        }
    }

    fn staging_leftovers(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(STAGING_PREFIX))
            .count()
    }

    #[test]
    fn test_output_path_renames_segments() {
        let path = output_path(
            Path::new("java/com/sierra/${APPLICATION_NAME}/${APPLICATION_NAME}Activity.java"),
            &tokens(),
        )
        .unwrap();
        assert_eq!(
            path,
            PathBuf::from("java/com/sierra/Sandbox/SandboxActivity.java")
        );
    }

    #[test]
    fn test_output_path_unknown_token_offset_is_path_relative() {
        let err = output_path(Path::new("src/${NOPE}/a.txt"), &tokens()).unwrap_err();
        assert!(matches!(
            err,
            ForgeError::UnresolvedToken { ref token, offset: 4, .. } if token == "NOPE"
        ));
    }

    #[test]
    fn test_output_path_rejects_escaping_segments() {
        let err = output_path(Path::new("../outside.txt"), &tokens()).unwrap_err();
        assert!(matches!(err, ForgeError::InvalidPathSegment { .. }));
    }

    #[test]
    fn test_duplicate_output_paths_collide() {
        let files = vec![rendered("a/b.txt", "1"), rendered("a/b.txt", "2")];
        let err = check_unique_paths(&files).unwrap_err();
        assert!(matches!(err, ForgeError::PathCollision { .. }));

        let files = vec![rendered("a", "1"), rendered("a/b.txt", "2")];
        let err = check_unique_paths(&files).unwrap_err();
        assert!(matches!(err, ForgeError::PathCollision { ref path, .. } if path == Path::new("a")));
    }

    #[test]
    fn test_non_empty_output_root_collides_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("Sandbox");
        assert!(check_output_root(&out, false).is_ok());

        std::fs::create_dir(&out).unwrap();
        assert!(check_output_root(&out, false).is_ok());

        std::fs::write(out.join("keep.txt"), "x").unwrap();
        let err = check_output_root(&out, false).unwrap_err();
        assert!(matches!(err, ForgeError::PathCollision { .. }));
        assert!(check_output_root(&out, true).is_ok());
    }

    #[test]
    fn test_stage_and_commit() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/Sandbox");
        let files = vec![rendered("a/one.txt", "one"), rendered("two.txt", "two")];

        let staged = stage(&files, &out).unwrap();
        assert!(!out.exists());
        assert!(!dir.path().join("nested").exists());
        assert_eq!(
            std::fs::read_to_string(staged.root().join("a/one.txt")).unwrap(),
            "one"
        );

        let committed = staged.commit(false).unwrap();
        assert_eq!(committed, out);
        assert_eq!(std::fs::read_to_string(out.join("two.txt")).unwrap(), "two");
        assert_eq!(staging_leftovers(dir.path()), 0);
    }

    #[test]
    fn test_dropped_stage_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("Sandbox");
        let staged = stage(&[rendered("a.txt", "a")], &out).unwrap();
        assert_eq!(staging_leftovers(dir.path()), 1);
        drop(staged);
        assert_eq!(staging_leftovers(dir.path()), 0);
        assert!(!out.exists());
    }

    #[test]
    fn test_commit_with_overwrite_replaces_previous_tree() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("Sandbox");
        std::fs::create_dir(&out).unwrap();
        std::fs::write(out.join("stale.txt"), "old").unwrap();

        let staged = stage(&[rendered("fresh.txt", "new")], &out).unwrap();
        assert!(matches!(
            staged.commit(false).unwrap_err(),
            ForgeError::PathCollision { .. }
        ));
        assert!(out.join("stale.txt").exists());

        let staged = stage(&[rendered("fresh.txt", "new")], &out).unwrap();
        staged.commit(true).unwrap();
        assert!(!out.join("stale.txt").exists());
        assert_eq!(std::fs::read_to_string(out.join("fresh.txt")).unwrap(), "new");
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_existing_empty_root_is_staged_beside_it() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("Sandbox");
        std::fs::create_dir(&out).unwrap();

        let staged = stage(&[rendered("a.txt", "a")], &out).unwrap();
        assert_eq!(
            staged.root().parent(),
            Some(dir.path().canonicalize().unwrap().as_path())
        );
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
        staged.commit(false).unwrap();
        assert_eq!(std::fs::read_to_string(out.join("a.txt")).unwrap(), "a");
        assert_eq!(staging_leftovers(dir.path()), 0);
    }

    #[test]
    fn test_current_dir_resolves_to_absolute_root() {
        let cwd = std::env::current_dir().unwrap().canonicalize().unwrap();
        let target = resolve_target(Path::new(".")).unwrap();
        assert_eq!(target, cwd);
        assert_ne!(parent_dir(&target).unwrap(), cwd);
        assert_eq!(
            resolve_target(Path::new("not-yet/created")).unwrap(),
            cwd.join("not-yet/created")
        );
    }

    #[test]
    fn test_failed_commit_removes_created_parents() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/deeper/Sandbox");
        let staged = stage(&[rendered("a.txt", "a")], &out).unwrap();
        // the staged tree disappears, so moving it into place fails
        std::fs::remove_dir_all(staged.root()).unwrap();

        assert!(matches!(staged.commit(false).unwrap_err(), ForgeError::Io(_)));
        assert!(!dir.path().join("nested").exists());
    }

    #[test]
    fn test_failed_restore_keeps_previous_tree() {
        let dir = tempfile::tempdir().unwrap();
        let backup = tempfile::Builder::new()
            .prefix(BACKUP_PREFIX)
            .tempdir_in(dir.path())
            .unwrap();
        let moved = backup.path().join("previous");
        std::fs::create_dir(&moved).unwrap();
        std::fs::write(moved.join("mine.txt"), "keep").unwrap();

        // an occupied target cannot be replaced by a rename
        let target = dir.path().join("Sandbox");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("other.txt"), "x").unwrap();

        let err = restore_previous(backup, &moved, &target).unwrap_err();
        let ForgeError::PreviousOutputKept { path, .. } = err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(path, moved);
        assert_eq!(std::fs::read_to_string(path.join("mine.txt")).unwrap(), "keep");
    }

    #[test]
    fn test_restore_moves_previous_tree_back() {
        let dir = tempfile::tempdir().unwrap();
        let backup = tempfile::tempdir_in(dir.path()).unwrap();
        let moved = backup.path().join("previous");
        std::fs::create_dir(&moved).unwrap();
        std::fs::write(moved.join("mine.txt"), "keep").unwrap();

        let target = dir.path().join("Sandbox");
        restore_previous(backup, &moved, &target).unwrap();
        assert_eq!(std::fs::read_to_string(target.join("mine.txt")).unwrap(), "keep");
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_are_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("Sandbox");
        let mut file = rendered("gradlew", "#!/bin/sh\n");
        file.permissions = Some(std::fs::Permissions::from_mode(0o755));

        stage(&[file], &out).unwrap().commit(false).unwrap();
        let mode = std::fs::metadata(out.join("gradlew")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
