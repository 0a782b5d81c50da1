use super::models::FileSystem;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::fs;

impl FileSystem {
    /// Resolves `root` against the working directory and makes sure it exists
    pub async fn ensure_root(root: &Path) -> io::Result<PathBuf> {
        let abs_path = Self::get_absolute_path(root)?;
        if !fs::try_exists(&abs_path).await? {
            fs::create_dir_all(&abs_path).await?;
            tracing::debug!("    Created: {} (storage root)", abs_path.display());
        } else {
            tracing::debug!("    Exists:  {} (storage root)", abs_path.display());
        }
        Ok(abs_path)
    }

    /// Creates exactly one directory level.
    ///
    /// Unlike `create_dir_all` this fails with `ErrorKind::AlreadyExists` when the
    /// directory is already there, so callers can tell a race from a fresh create.
    pub async fn create_directory_strict(path: &Path) -> io::Result<()> {
        fs::create_dir(path).await?;
        tracing::debug!("    Created: {}", path.display());
        Ok(())
    }

    /// `Ok(false)` when nothing exists at `path`; a regular file is not a directory
    pub async fn is_directory(path: &Path) -> io::Result<bool> {
        match fs::metadata(path).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Writes `data` to `path`, creating parents, and returns once the bytes are on disk.
    ///
    /// Every call gets its own temp file next to `path`; it is renamed into place on
    /// success and removed on any failure.
    pub async fn write_synced(path: &Path, data: &[u8]) -> io::Result<()> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).await?;

        let target = path.to_path_buf();
        let data = data.to_vec();
        tokio::task::spawn_blocking(move || -> io::Result<()> {
            let mut tmp = tempfile::Builder::new()
                .prefix(".arstore-")
                .suffix(".tmp")
                .tempfile_in(&parent)?;
            tmp.write_all(&data)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(io::Error::other)?
    }

    pub fn get_absolute_path(path: &Path) -> io::Result<PathBuf> {
        let abs_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        Ok(abs_path)
    }

    pub fn get_absolute_path_string(path: &str) -> io::Result<String> {
        let path_buf = PathBuf::from(path);
        let abs = Self::get_absolute_path(&path_buf)?;
        Ok(abs.to_string_lossy().to_string())
    }
}
