//! # File lookup
//!
//! Stats the resolved path once, then falls back to:
//! - the configured index files, in order, when a directory was requested with
//!   a trailing slash;
//! - `path.<ext>` for each configured extension, in order, when an
//!   extensionless path without a trailing slash does not exist.
//!
//! Candidates that turn out to be directories are skipped. Metadata is never
//! re-read after this stage.

use std::ffi::OsString;
use std::fs::Metadata;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{debug, error};
use tokio::fs;

use crate::config::SendOptions;
use crate::exception::Terminal;
use crate::path::ResolvedPath;

/// The part of a stat result the pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    pub size: u64,
    /// `None` when the platform can't report a modification time.
    pub modified: Option<SystemTime>,
    pub is_dir: bool,
}

impl From<&Metadata> for FileMetadata {
    fn from(meta: &Metadata) -> Self {
        Self {
            size: meta.len(),
            modified: meta.modified().ok(),
            is_dir: meta.is_dir(),
        }
    }
}

/// A file that was found, with the path that was actually stat'ed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub path: PathBuf,
    pub metadata: FileMetadata,
}

pub async fn locate(
    resolved: &ResolvedPath,
    options: &SendOptions,
    id: u128,
) -> Result<Located, Terminal> {
    let path = resolved.path();

    match fs::metadata(path).await {
        Ok(meta) => {
            let metadata = FileMetadata::from(&meta);
            if resolved.has_trailing_slash() {
                if metadata.is_dir {
                    return locate_index(path, options, id).await;
                }
                // A file addressed as "file/" is ENOTDIR on POSIX.
                debug!("[ID{}]{} is not a directory", id, path.display());
                return Err(Terminal::NotFound);
            }
            Ok(Located {
                path: path.to_path_buf(),
                metadata,
            })
        }
        Err(e) if e.kind() == ErrorKind::NotFound
            && path.extension().is_none()
            && !resolved.has_trailing_slash() =>
        {
            locate_with_extension(path, options, id).await
        }
        Err(e) => Err(classify(&e, path, id)),
    }
}

async fn locate_index(dir: &Path, options: &SendOptions, id: u128) -> Result<Located, Terminal> {
    for name in options.index_list() {
        let candidate = dir.join(name);
        if let Some(found) = stat_file(candidate).await {
            debug!("[ID{}]Index file {}", id, found.path.display());
            return Ok(found);
        }
    }
    debug!("[ID{}]No index file in {}", id, dir.display());
    Err(Terminal::NotFound)
}

async fn locate_with_extension(
    path: &Path,
    options: &SendOptions,
    id: u128,
) -> Result<Located, Terminal> {
    for extension in options.extension_list() {
        let mut candidate = OsString::from(path.as_os_str());
        candidate.push(".");
        candidate.push(extension);
        if let Some(found) = stat_file(PathBuf::from(candidate)).await {
            debug!("[ID{}]Extension fallback {}", id, found.path.display());
            return Ok(found);
        }
    }
    debug!("[ID{}]No extension fallback for {}", id, path.display());
    Err(Terminal::NotFound)
}

/// Stat a fallback candidate. Any failure, or a directory, means "try the next one".
async fn stat_file(candidate: PathBuf) -> Option<Located> {
    let meta = fs::metadata(&candidate).await.ok()?;
    let metadata = FileMetadata::from(&meta);
    if metadata.is_dir {
        return None;
    }
    Some(Located {
        path: candidate,
        metadata,
    })
}

/// Name-too-long and not-a-directory are benign misses; anything else is ours.
fn classify(e: &io::Error, path: &Path, id: u128) -> Terminal {
    match e.kind() {
        ErrorKind::NotFound | ErrorKind::NotADirectory | ErrorKind::InvalidFilename => {
            debug!("[ID{}]{} not found: {}", id, path.display(), e);
            Terminal::NotFound
        }
        _ => {
            error!("[ID{}]Couldn't stat {}: {}", id, path.display(), e);
            Terminal::InternalError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::parse_path;
    use std::fs as std_fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        std_fs::write(dir.path().join("name.txt"), "tobi").unwrap();
        std_fs::write(dir.path().join("page.html"), "<p>page</p>").unwrap();
        std_fs::create_dir(dir.path().join("docs")).unwrap();
        std_fs::write(dir.path().join("docs").join("default.htm"), "default").unwrap();
        std_fs::write(dir.path().join("docs").join("index.html"), "index").unwrap();
        std_fs::create_dir(dir.path().join("nested")).unwrap();
        std_fs::create_dir(dir.path().join("nested").join("index.html")).unwrap();
        std_fs::create_dir(dir.path().join("folder.html")).unwrap();
        dir
    }

    async fn run(raw: &str, options: &SendOptions) -> Result<Located, Terminal> {
        let resolved = parse_path(raw, options, 0).unwrap();
        locate(&resolved, options, 0).await
    }

    #[tokio::test]
    async fn test_plain_file() {
        let dir = fixture();
        let options = SendOptions::new().root(dir.path());
        let found = run("/name.txt", &options).await.unwrap();
        assert_eq!(found.path, dir.path().join("name.txt"));
        assert_eq!(found.metadata.size, 4);
        assert!(!found.metadata.is_dir);
        assert!(found.metadata.modified.is_some());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = fixture();
        let options = SendOptions::new().root(dir.path());
        assert_eq!(run("/missing.txt", &options).await, Err(Terminal::NotFound));
    }

    #[tokio::test]
    async fn test_index_order() {
        let dir = fixture();
        let options = SendOptions::new()
            .root(dir.path())
            .index(["default.htm", "index.html"]);
        let found = run("/docs/", &options).await.unwrap();
        assert_eq!(found.path, dir.path().join("docs").join("default.htm"));

        let options = SendOptions::new()
            .root(dir.path())
            .index(["missing.html", "index.html"]);
        let found = run("/docs/", &options).await.unwrap();
        assert_eq!(found.path, dir.path().join("docs").join("index.html"));
    }

    #[tokio::test]
    async fn test_index_skips_directories() {
        let dir = fixture();
        let options = SendOptions::new().root(dir.path());
        assert_eq!(run("/nested/", &options).await, Err(Terminal::NotFound));
    }

    #[tokio::test]
    async fn test_no_index_configured() {
        let dir = fixture();
        let options = SendOptions::new().root(dir.path()).index(Vec::<String>::new());
        assert_eq!(run("/docs/", &options).await, Err(Terminal::NotFound));
    }

    #[tokio::test]
    async fn test_directory_without_slash_is_returned_as_directory() {
        let dir = fixture();
        let options = SendOptions::new().root(dir.path());
        let found = run("/docs", &options).await.unwrap();
        assert!(found.metadata.is_dir);
    }

    #[tokio::test]
    async fn test_file_with_trailing_slash() {
        let dir = fixture();
        let options = SendOptions::new().root(dir.path());
        assert_eq!(run("/name.txt/", &options).await, Err(Terminal::NotFound));
    }

    #[tokio::test]
    async fn test_extension_fallback() {
        let dir = fixture();
        let options = SendOptions::new()
            .root(dir.path())
            .extensions(["html", "txt"]);
        let found = run("/page", &options).await.unwrap();
        assert_eq!(found.path, dir.path().join("page.html"));

        let found = run("/name", &options).await.unwrap();
        assert_eq!(found.path, dir.path().join("name.txt"));

        assert_eq!(run("/absent", &options).await, Err(Terminal::NotFound));
    }

    #[tokio::test]
    async fn test_extension_fallback_skips_directories() {
        let dir = fixture();
        let options = SendOptions::new().root(dir.path()).extensions(["html"]);
        assert_eq!(run("/folder", &options).await, Err(Terminal::NotFound));
    }

    #[tokio::test]
    async fn test_extension_fallback_needs_extensionless_path() {
        let dir = fixture();
        let options = SendOptions::new().root(dir.path()).extensions(["txt"]);
        assert_eq!(run("/name.md", &options).await, Err(Terminal::NotFound));
    }

    #[tokio::test]
    async fn test_not_a_directory_in_path() {
        let dir = fixture();
        let options = SendOptions::new().root(dir.path());
        assert_eq!(run("/name.txt/inner.txt", &options).await, Err(Terminal::NotFound));
    }

    #[tokio::test]
    async fn test_name_too_long() {
        let dir = fixture();
        let options = SendOptions::new().root(dir.path());
        let long = format!("/{}.txt", "a".repeat(4096));
        assert_eq!(run(&long, &options).await, Err(Terminal::NotFound));
    }
}
