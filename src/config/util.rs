//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from `start`.
///
/// Walks up parent directories until finding `config_name`; an absolute
/// `config_name` is returned as is when it exists.
///
/// ```text
/// /home/user/site/dist/css/    ← start
/// /home/user/site/filever.toml ← found
/// ```
pub fn find_config_file(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_in_parent() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("dist/css");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("filever.toml"), "").unwrap();

        let found = find_config_file(&nested, Path::new("filever.toml")).unwrap();
        assert_eq!(found, dir.path().join("filever.toml"));
    }

    #[test]
    fn test_absolute_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        assert_eq!(find_config_file(dir.path(), &path), None);

        fs::write(&path, "").unwrap();
        assert_eq!(find_config_file(Path::new("/"), &path), Some(path));
    }
}
