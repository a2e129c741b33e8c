//! Path confinement for user-supplied paths.
//!
//! [`SandboxPathResolver::normalize`] is purely lexical and runs before any
//! filesystem access. [`SandboxPathResolver::resolve`] then joins against the
//! canonical sandbox root and re-checks containment after resolving symlinks.

use std::io;
use std::path::{Path, PathBuf};

use seedbox_core::error::{AppError, ErrorKind};
use seedbox_core::result::AppResult;

/// Converts user-supplied relative paths into confined filesystem paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct SandboxPathResolver;

impl SandboxPathResolver {
    /// Collapse `.` and `..` segments into a safe relative path.
    ///
    /// Leading separators are stripped, so `/a/b` is `a/b` inside the
    /// sandbox. A `..` that would climb above the sandbox root, a NUL byte,
    /// or a drive/UNC prefix fails with `PathTraversal`. The empty string
    /// denotes the root itself.
    pub fn normalize(raw: &str) -> AppResult<String> {
        if raw.contains('\0') {
            return Err(AppError::path_traversal("Path contains a NUL byte"));
        }

        let unified = raw.replace('\\', "/");
        let mut segments: Vec<&str> = Vec::new();

        for segment in unified.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(AppError::path_traversal(format!(
                            "Path escapes the sandbox: {raw}"
                        )));
                    }
                }
                s if segments.is_empty() && is_drive_prefix(s) => {
                    return Err(AppError::path_traversal(format!(
                        "Drive-qualified paths are not allowed: {raw}"
                    )));
                }
                s => segments.push(s),
            }
        }

        Ok(segments.join("/"))
    }

    /// Canonicalize `root`, join the normalized `raw`, and verify the result
    /// stays at or below the canonical root.
    pub async fn resolve(root: &Path, raw: &str) -> AppResult<PathBuf> {
        let normalized = Self::normalize(raw)?;
        let canonical_root = canonical_root(root).await?;
        Self::contain(&canonical_root, &normalized).await
    }

    /// Containment check against an already-canonical root.
    pub(crate) async fn contain(canonical_root: &Path, normalized: &str) -> AppResult<PathBuf> {
        let joined = if normalized.is_empty() {
            canonical_root.to_path_buf()
        } else {
            canonical_root.join(normalized)
        };

        let resolved = canonicalize_existing_prefix(&joined).await?;

        // Path::starts_with compares whole components, so /root2 never
        // matches /root.
        if !resolved.starts_with(canonical_root) {
            return Err(AppError::path_traversal(format!(
                "Path escapes the sandbox: {normalized}"
            )));
        }

        Ok(resolved)
    }
}

fn is_drive_prefix(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Canonicalize a sandbox root, mapping failures to storage errors.
pub(crate) async fn canonical_root(root: &Path) -> AppResult<PathBuf> {
    tokio::fs::canonicalize(root).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Sandbox root is not accessible: {}", root.display()),
            e,
        )
    })
}

/// Canonicalize the longest existing prefix of `path` and re-append the
/// remaining components, so symlinks anywhere on the existing part are
/// followed before the containment check.
async fn canonicalize_existing_prefix(path: &Path) -> AppResult<PathBuf> {
    let mut existing = path.to_path_buf();
    let mut rest: Vec<std::ffi::OsString> = Vec::new();

    loop {
        match tokio::fs::canonicalize(&existing).await {
            Ok(canonical) => {
                let mut out = canonical;
                for component in rest.iter().rev() {
                    out.push(component);
                }
                return Ok(out);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let Some(name) = existing.file_name().map(|n| n.to_os_string()) else {
                    return Err(AppError::path_traversal("Path has no resolvable ancestor"));
                };
                rest.push(name);
                if !existing.pop() {
                    return Err(AppError::path_traversal("Path has no resolvable ancestor"));
                }
            }
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::PathTraversal,
                    format!("Path cannot be resolved: {}", existing.display()),
                    e,
                ));
            }
        }
    }
}
