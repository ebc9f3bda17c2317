//! File system accessor used by both phases.
//!
//! Paths handed to an [`AssetFs`] are project-relative (as written in
//! `filever.toml`) or absolute. [`LocalFs`] resolves relative paths against
//! the project root, so asset map keys stay in the short relative form.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use jwalk::{Parallelism, WalkDir};

use crate::utils::glob::{self, GlobError};

/// File system operations the revisioner and rewriter depend on.
pub trait AssetFs: Sync {
    /// Files matching `patterns` under `cwd`, relative to `cwd`.
    fn glob(&self, cwd: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, GlobError>;
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
    /// Write `contents`, creating missing parent directories.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
    /// Copy `from` to `to`, creating missing parent directories.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    /// Total byte size of all files below `path`.
    fn dir_size(&self, path: &Path) -> io::Result<u64>;
}

/// [`AssetFs`] backed by the local disk.
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: PathBuf,
}

impl LocalFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a project-relative path. Absolute paths are returned as-is.
    #[inline]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl AssetFs for LocalFs {
    fn glob(&self, cwd: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, GlobError> {
        glob::expand(&self.resolve(cwd), patterns)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(path))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let target = self.resolve(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, contents)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        let target = self.resolve(to);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(self.resolve(from), target).map(|_| ())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(self.resolve(from), self.resolve(to))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(self.resolve(path))
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.resolve(path).is_dir()
    }

    fn dir_size(&self, path: &Path) -> io::Result<u64> {
        let dir = self.resolve(path);
        if !dir.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("`{}` is not a directory", dir.display()),
            ));
        }

        let mut total = 0;
        for entry in WalkDir::new(&dir).parallelism(Parallelism::Serial) {
            let mut entry = entry.map_err(io::Error::other)?;
            if let Some(err) = entry.read_children_error.take() {
                return Err(io::Error::other(err));
            }
            if entry.file_type().is_file() {
                total += entry.metadata().map_err(io::Error::other)?.len();
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_relative_and_absolute() {
        let fs = LocalFs::new("/project");
        assert_eq!(fs.resolve(Path::new("dist/a.css")), PathBuf::from("/project/dist/a.css"));
        assert_eq!(fs.resolve(Path::new("/abs/a.css")), PathBuf::from("/abs/a.css"));
    }

    #[test]
    fn test_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let local = LocalFs::new(dir.path());
        local.write(Path::new("out/nested/index.html"), b"<html>").unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("out/nested/index.html")).unwrap(),
            "<html>"
        );
    }

    #[test]
    fn test_copy_keeps_source() {
        let dir = TempDir::new().unwrap();
        let local = LocalFs::new(dir.path());
        fs::write(dir.path().join("a.css"), "a{}").unwrap();

        local.copy(Path::new("a.css"), Path::new("rev/a.1.css")).unwrap();
        assert!(local.exists(Path::new("a.css")));
        assert!(local.exists(Path::new("rev/a.1.css")));
        assert!(local.is_dir(Path::new("rev")));
    }

    #[test]
    fn test_dir_size() {
        let dir = TempDir::new().unwrap();
        let local = LocalFs::new(dir.path());
        local.write(Path::new("d/a.txt"), b"12345").unwrap();
        local.write(Path::new("d/sub/b.txt"), b"123").unwrap();

        assert_eq!(local.dir_size(Path::new("d")).unwrap(), 8);
        assert!(local.dir_size(Path::new("missing")).is_err());
    }

    #[test]
    fn test_dir_size_on_busy_rayon_workers() {
        use rayon::prelude::*;

        let dir = TempDir::new().unwrap();
        let local = LocalFs::new(dir.path());
        local.write(Path::new("d/a.txt"), b"1234").unwrap();
        local.write(Path::new("d/sub/b.txt"), b"5678").unwrap();

        let sizes: Vec<u64> = (0..64)
            .into_par_iter()
            .map(|_| local.dir_size(Path::new("d")).unwrap())
            .collect();
        assert!(sizes.iter().all(|&size| size == 8));
    }

    #[cfg(unix)]
    #[test]
    fn test_glob_keeps_absolute_literal() {
        let dir = TempDir::new().unwrap();
        let local = LocalFs::new("/nonexistent-root");
        let file = dir.path().join("app.css");
        fs::write(&file, "a{}").unwrap();

        let files = local
            .glob(Path::new(""), &[file.to_string_lossy().into_owned()])
            .unwrap();
        assert_eq!(files, vec![file]);
    }
}
