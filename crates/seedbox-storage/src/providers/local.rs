//! Local filesystem sandbox.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, Take};
use tracing::{debug, warn};

use seedbox_core::error::{AppError, ErrorKind};
use seedbox_core::result::AppResult;

use crate::listing::{DirEntry, DirListing, FileEntry, FileMeta};
use crate::mime::mime_for;
use crate::sandbox::{SandboxPathResolver, canonical_root};

/// One user's sandbox, rooted at a canonical directory.
#[derive(Debug, Clone)]
pub struct LocalSandbox {
    root: PathBuf,
}

impl LocalSandbox {
    /// Open an existing directory as a sandbox. The root is canonicalized once.
    pub async fn open(root: &Path) -> AppResult<Self> {
        Ok(Self {
            root: canonical_root(root).await?,
        })
    }

    /// Canonical sandbox root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Normalize and confine a user-supplied path.
    pub async fn resolve(&self, raw: &str) -> AppResult<(String, PathBuf)> {
        let normalized = SandboxPathResolver::normalize(raw)?;
        let absolute = SandboxPathResolver::contain(&self.root, &normalized).await?;
        Ok((normalized, absolute))
    }

    /// List one directory; sub-directories and files each sorted by name.
    pub async fn list_dir(&self, raw: &str) -> AppResult<DirListing> {
        let (cwd, absolute) = self.resolve(raw).await?;
        let meta = stat(&absolute, &cwd).await?;
        if !meta.is_dir() {
            return Err(AppError::validation(format!("Not a directory: {cwd}")));
        }

        let mut dirs = Vec::new();
        let mut files = Vec::new();
        let mut reader = fs::read_dir(&absolute).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to list directory: {cwd}"), e)
        })?;

        while let Some(entry) = reader.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read directory entry", e)
        })? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = join_relative(&cwd, &name);
            let file_type = match entry.file_type().await {
                Ok(t) => t,
                Err(e) => {
                    debug!(path = %path, error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            if file_type.is_dir() {
                dirs.push(DirEntry { name, path });
            } else if file_type.is_file() {
                let size = entry.metadata().await.map(|m| m.len()).unwrap_or(0);
                let mime = mime_for(&name);
                files.push(FileEntry {
                    name,
                    path,
                    size,
                    mime,
                });
            }
        }

        dirs.sort_by(|a, b| a.name.cmp(&b.name));
        files.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(DirListing {
            parent: parent_of(&cwd),
            cwd,
            dirs,
            files,
        })
    }

    /// Resolve a regular file for delivery.
    pub async fn stat_file(&self, raw: &str) -> AppResult<FileMeta> {
        let (relative, absolute) = self.resolve(raw).await?;
        let meta = stat(&absolute, &relative).await?;
        if !meta.is_file() {
            return Err(AppError::validation(format!("Not a file: {relative}")));
        }

        let name = absolute
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| relative.clone());

        Ok(FileMeta {
            mime: mime_for(&name),
            size: meta.len(),
            absolute,
            relative,
            name,
        })
    }

    /// Open `file` positioned at `start`, limited to `len` bytes.
    pub async fn open_range(&self, file: &FileMeta, start: u64, len: u64) -> AppResult<Take<fs::File>> {
        let mut handle = fs::File::open(&file.absolute).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("File not found: {}", file.relative))
            } else {
                AppError::with_source(
                    ErrorKind::StreamIo,
                    format!("Failed to open file: {}", file.relative),
                    e,
                )
            }
        })?;

        if start > 0 {
            handle.seek(SeekFrom::Start(start)).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::StreamIo,
                    format!("Failed to seek in file: {}", file.relative),
                    e,
                )
            })?;
        }

        Ok(handle.take(len))
    }

    /// Delete a file, or a directory recursively, then prune empty parents.
    /// The sandbox root itself can never be deleted.
    pub async fn delete(&self, raw: &str) -> AppResult<()> {
        let (relative, absolute) = self.resolve(raw).await?;
        if relative.is_empty() || absolute == self.root {
            return Err(AppError::path_traversal("Refusing to delete the sandbox root"));
        }

        let meta = fs::symlink_metadata(&absolute).await.map_err(|e| not_found_or_storage(e, &relative))?;
        let result = if meta.is_dir() {
            fs::remove_dir_all(&absolute).await
        } else {
            fs::remove_file(&absolute).await
        };
        result.map_err(|e| not_found_or_storage(e, &relative))?;

        debug!(path = %relative, directory = meta.is_dir(), "Deleted sandbox entry");
        self.prune_empty_parents(&absolute).await;
        Ok(())
    }

    /// Sum the sizes of every regular file below the root. Symlinks are not
    /// followed; entries that vanish mid-walk are skipped.
    pub async fn used_bytes(&self) -> AppResult<u64> {
        let mut total = 0u64;
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut reader = match fs::read_dir(&dir).await {
                Ok(r) => r,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(AppError::with_source(
                        ErrorKind::Storage,
                        format!("Failed to walk {}", dir.display()),
                        e,
                    ));
                }
            };

            loop {
                let entry = match reader.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(dir = %dir.display(), error = %e, "Directory walk interrupted");
                        break;
                    }
                };
                let Ok(file_type) = entry.file_type().await else {
                    continue;
                };
                if file_type.is_dir() {
                    pending.push(entry.path());
                } else if file_type.is_file() {
                    if let Ok(meta) = entry.metadata().await {
                        total = total.saturating_add(meta.len());
                    }
                }
            }
        }

        Ok(total)
    }

    async fn prune_empty_parents(&self, removed: &Path) {
        let mut current = removed.parent().map(Path::to_path_buf);
        while let Some(dir) = current {
            if dir == self.root || !dir.starts_with(&self.root) {
                break;
            }
            if fs::remove_dir(&dir).await.is_err() {
                break;
            }
            debug!(path = %dir.display(), "Pruned empty directory");
            current = dir.parent().map(Path::to_path_buf);
        }
    }
}

async fn stat(absolute: &Path, relative: &str) -> AppResult<std::fs::Metadata> {
    fs::metadata(absolute)
        .await
        .map_err(|e| not_found_or_storage(e, relative))
}

fn not_found_or_storage(e: std::io::Error, relative: &str) -> AppError {
    if e.kind() == std::io::ErrorKind::NotFound {
        AppError::not_found(format!("Path not found: {relative}"))
    } else {
        AppError::with_source(ErrorKind::Storage, format!("Filesystem error on {relative}"), e)
    }
}

fn join_relative(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}

fn parent_of(cwd: &str) -> Option<String> {
    if cwd.is_empty() {
        return None;
    }
    Some(cwd.rsplit_once('/').map(|(p, _)| p.to_string()).unwrap_or_default())
}
