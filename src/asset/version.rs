//! Version phase: rename or copy assets to `<stem>.<suffix>.<ext>`.
//!
//! Destinations are checked and created for every group before any file is
//! touched. Files are then hashed and moved in parallel; their entries are
//! folded into the returned [`AssetMap`] in input order once all work is done.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use super::{AssetMap, RevisionError};
use crate::config::{FileGroup, Settings};
use crate::logger::ProgressLine;
use crate::utils::{glob, path::AssetFs, plural_count};
use crate::{debug, log};

/// Where the digest input comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HashStrategy {
    /// The file's own bytes.
    #[default]
    Content,
    /// Decimal total size of a directory tree (`root`, else the file's
    /// parent). Any change that keeps the size identical keeps the suffix.
    DirSize { root: Option<PathBuf> },
}

/// One file scheduled for revisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
struct WorkItem {
    source: PathBuf,
    /// Copy target directory; `None` renames in place.
    dest_dir: Option<PathBuf>,
}

/// Result of revisioning one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionEntry {
    pub original: PathBuf,
    pub suffix: String,
    pub revisioned: PathBuf,
}

/// Revisioner bound to a file system and the effective task options.
pub struct Revisioner<'a, F: AssetFs> {
    fs: &'a F,
    settings: Settings,
    strategy: HashStrategy,
    quiet: bool,
}

impl<'a, F: AssetFs> Revisioner<'a, F> {
    pub fn new(fs: &'a F, settings: Settings, strategy: HashStrategy) -> Self {
        Self {
            fs,
            settings,
            strategy,
            quiet: false,
        }
    }

    /// Suppress the progress line (tests, `check`).
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Revision every file of `groups` and return the resulting map.
    pub fn run(&self, groups: &[FileGroup]) -> Result<AssetMap, RevisionError> {
        let items = self.plan(groups)?;
        self.prepare_destinations(&items)?;
        let sizes = self.measure_dirs(&items)?;

        let progress = (!self.quiet && !items.is_empty())
            .then(|| ProgressLine::new(&[("version", items.len())]));

        let entries = items
            .par_iter()
            .map(|item| {
                let entry = self.revision(item, &sizes);
                if let Some(p) = &progress {
                    p.inc("version");
                }
                entry
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(p) = progress {
            p.finish();
        }

        let mut map = AssetMap::new();
        for entry in &entries {
            let new_name = entry.revisioned.file_name().unwrap_or_default();
            log!("version"; "✔ {} changed to {}", entry.original.display(), new_name.to_string_lossy());
            debug!("version"; "suffix {} for {}", entry.suffix, entry.revisioned.display());
            map.insert(&entry.original, &entry.revisioned);
        }
        Ok(map)
    }

    /// Expand globs into work items.
    fn plan(&self, groups: &[FileGroup]) -> Result<Vec<WorkItem>, RevisionError> {
        let mut items = Vec::new();

        for group in groups {
            let cwd = group.cwd();

            for pattern in group.src.iter().filter(|p| glob::is_literal(p)) {
                let path = cwd.join(pattern);
                if !self.fs.exists(&path) {
                    return Err(RevisionError::MissingSource(path));
                }
            }

            let files = self
                .fs
                .glob(cwd, &group.src)
                .map_err(|source| RevisionError::Glob {
                    patterns: group.src.clone(),
                    source,
                })?;

            if files.is_empty() {
                log!("warning"; "no files matched {:?}", group.src);
            }

            items.extend(files.into_iter().map(|rel| {
                let dest_dir = group.dest.as_ref().map(|dest| {
                    if group.expand {
                        // `dest/<rel>` names the file; its directory is the target.
                        dest.join(&rel)
                            .parent()
                            .map_or_else(|| dest.clone(), Path::to_path_buf)
                    } else {
                        dest.clone()
                    }
                });
                WorkItem {
                    source: cwd.join(rel),
                    dest_dir,
                }
            }));
        }

        Ok(items)
    }

    /// Validate all destinations, then create the missing ones.
    fn prepare_destinations(&self, items: &[WorkItem]) -> Result<(), RevisionError> {
        let dests: BTreeSet<&Path> = items.iter().filter_map(|i| i.dest_dir.as_deref()).collect();

        for dest in &dests {
            if self.fs.exists(dest) && !self.fs.is_dir(dest) {
                return Err(RevisionError::DestinationNotDir(dest.to_path_buf()));
            }
        }

        for dest in dests {
            if !self.fs.exists(dest) {
                log!("version"; "destination dir {} does not exist: creating", dest.display());
                self.fs
                    .create_dir_all(dest)
                    .map_err(|source| RevisionError::CreateDir {
                        path: dest.to_path_buf(),
                        source,
                    })?;
            }
        }
        Ok(())
    }

    /// Directory totals for `dir-size`, taken before any file is copied or
    /// renamed so every file of the run sees the same sizes.
    fn measure_dirs(&self, items: &[WorkItem]) -> Result<FxHashMap<PathBuf, u64>, RevisionError> {
        let mut sizes = FxHashMap::default();
        let HashStrategy::DirSize { root } = &self.strategy else {
            return Ok(sizes);
        };

        for item in items {
            if !self.fs.exists(&item.source) {
                return Err(RevisionError::MissingSource(item.source.clone()));
            }
            let dir = size_dir(root.as_deref(), &item.source);
            if sizes.contains_key(dir) {
                continue;
            }
            let size = self
                .fs
                .dir_size(dir)
                .map_err(RevisionError::io("measure", dir))?;
            debug!("version"; "{} measured {} bytes", dir.display(), size);
            sizes.insert(dir.to_path_buf(), size);
        }
        Ok(sizes)
    }

    fn revision(
        &self,
        item: &WorkItem,
        sizes: &FxHashMap<PathBuf, u64>,
    ) -> Result<RevisionEntry, RevisionError> {
        let suffix = self.suffix_for(&item.source, sizes)?;
        let new_name = revisioned_name(&item.source, &suffix);

        let revisioned = match &item.dest_dir {
            Some(dir) => {
                let target = dir.join(&new_name);
                self.fs
                    .copy(&item.source, &target)
                    .map_err(RevisionError::io("copy", &item.source))?;
                target
            }
            None => {
                let target = item.source.with_file_name(&new_name);
                self.fs
                    .rename(&item.source, &target)
                    .map_err(RevisionError::io("rename", &item.source))?;
                target
            }
        };

        Ok(RevisionEntry {
            original: item.source.clone(),
            suffix,
            revisioned,
        })
    }

    /// Hex digest prefix for `source` under the configured strategy.
    fn suffix_for(
        &self,
        source: &Path,
        sizes: &FxHashMap<PathBuf, u64>,
    ) -> Result<String, RevisionError> {
        let Settings {
            algorithm, length, ..
        } = self.settings;

        match &self.strategy {
            HashStrategy::Content => {
                let bytes = self
                    .fs
                    .read(source)
                    .map_err(RevisionError::io("read", source))?;
                Ok(algorithm.suffix(&bytes, length))
            }
            HashStrategy::DirSize { root } => {
                let dir = size_dir(root.as_deref(), source);
                let size = match sizes.get(dir) {
                    Some(&size) => size,
                    None => self
                        .fs
                        .dir_size(dir)
                        .map_err(RevisionError::io("measure", dir))?,
                };
                Ok(algorithm.suffix(size.to_string().as_bytes(), length))
            }
        }
    }
}

/// Directory measured for `source`: `root` if set, else the file's parent.
fn size_dir<'p>(root: Option<&'p Path>, source: &'p Path) -> &'p Path {
    root.or_else(|| source.parent()).unwrap_or(Path::new(""))
}

/// `<stem>.<suffix>.<ext>`; a file without extension keeps the trailing dot.
///
/// ```ignore
/// revisioned_name("css/app.css", "a1b2c3d4")  -> "app.a1b2c3d4.css"
/// revisioned_name("lib/jquery.min.js", "00ff") -> "jquery.min.00ff.js"
/// revisioned_name("CNAME", "00ff")             -> "CNAME.00ff."
/// ```
pub fn revisioned_name(path: &Path, suffix: &str) -> String {
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let ext = path.extension().unwrap_or_default().to_string_lossy();
    format!("{stem}.{suffix}.{ext}")
}

/// Run the version phase and log a summary.
pub fn revision_files<F: AssetFs>(
    fs: &F,
    groups: &[FileGroup],
    settings: Settings,
    strategy: HashStrategy,
) -> Result<AssetMap, RevisionError> {
    if strategy != HashStrategy::Content {
        debug!("version"; "using directory size digests; content changes of equal size keep their suffix");
    }
    let map = Revisioner::new(fs, settings, strategy).run(groups)?;
    log!("version"; "revisioned {}", plural_count(map.len(), "file"));
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::hash::Algorithm;
    use crate::utils::path::LocalFs;
    use regex::Regex;
    use std::fs;
    use tempfile::TempDir;

    fn group(src: &[&str], dest: Option<&str>) -> FileGroup {
        FileGroup {
            src: src.iter().map(|s| s.to_string()).collect(),
            dest: dest.map(PathBuf::from),
            ..Default::default()
        }
    }

    fn revisioner(fs: &LocalFs) -> Revisioner<'_, LocalFs> {
        Revisioner::new(fs, Settings::default(), HashStrategy::Content).quiet(true)
    }

    fn setup(files: &[(&str, &str)]) -> (TempDir, LocalFs) {
        let dir = TempDir::new().unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let local = LocalFs::new(dir.path());
        (dir, local)
    }

    #[test]
    fn test_revisioned_name() {
        assert_eq!(revisioned_name(Path::new("css/app.css"), "a1b2c3d4"), "app.a1b2c3d4.css");
        assert_eq!(revisioned_name(Path::new("lib/jquery.min.js"), "00ff"), "jquery.min.00ff.js");
        assert_eq!(revisioned_name(Path::new("CNAME"), "00ff"), "CNAME.00ff.");
    }

    #[test]
    fn test_rename_in_place() {
        let (dir, local) = setup(&[("css/app.css", "body { color: red; }")]);
        let map = revisioner(&local).run(&[group(&["css/*.css"], None)]).unwrap();

        let suffix = Algorithm::Md5.suffix(b"body { color: red; }", 8);
        let expected = format!("css/app.{suffix}.css");
        assert_eq!(map.get("css/app.css"), Some(expected.as_str()));
        assert!(!dir.path().join("css/app.css").exists());
        assert!(dir.path().join(&expected).exists());

        let name = Regex::new(r"^app\.[0-9a-f]{8}\.css$").unwrap();
        assert!(name.is_match(expected.rsplit('/').next().unwrap()));
    }

    #[cfg(unix)]
    #[test]
    fn test_absolute_literal_source() {
        let (dir, local) = setup(&[("css/app.css", "a{}")]);
        let source = dir.path().join("css/app.css");
        let src = source.to_string_lossy().into_owned();
        let map = revisioner(&local).run(&[group(&[src.as_str()], None)]).unwrap();

        let suffix = Algorithm::Md5.suffix(b"a{}", 8);
        let expected = dir.path().join(format!("css/app.{suffix}.css"));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&src), Some(expected.to_string_lossy().as_ref()));
        assert!(!source.exists());
        assert!(expected.exists());
    }

    #[test]
    fn test_identical_content_same_suffix() {
        let (_dir, local) = setup(&[("a/x.js", "same"), ("b/y.js", "same")]);
        let map = revisioner(&local).run(&[group(&["**/*.js"], None)]).unwrap();

        let suffix = |v: &str| v.split('.').nth(1).unwrap().to_string();
        let x = suffix(map.get("a/x.js").unwrap());
        let y = suffix(map.get("b/y.js").unwrap());
        assert_eq!(x, y);
    }

    #[test]
    fn test_copy_to_destination_creates_dir() {
        let (dir, local) = setup(&[("src/app.js", "console.log(1)")]);
        let map = revisioner(&local)
            .run(&[group(&["src/app.js"], Some("dist/rev"))])
            .unwrap();

        let value = map.get("src/app.js").unwrap();
        assert!(value.starts_with("dist/rev/app."));
        assert!(dir.path().join("src/app.js").exists());
        assert!(dir.path().join(value).exists());
    }

    #[test]
    fn test_expand_mirrors_subdirectories() {
        let (dir, local) = setup(&[("build/js/a.js", "a"), ("build/js/vendor/b.js", "b")]);
        let mut g = group(&["js/**/*.js"], Some("public"));
        g.cwd = Some(PathBuf::from("build"));
        g.expand = true;

        let map = revisioner(&local).run(&[g]).unwrap();
        assert!(map.get("build/js/a.js").unwrap().starts_with("public/js/a."));
        assert!(map.get("build/js/vendor/b.js").unwrap().starts_with("public/js/vendor/b."));
        assert!(dir.path().join(map.get("build/js/vendor/b.js").unwrap()).exists());
    }

    #[test]
    fn test_destination_is_file_aborts_before_any_rename() {
        let (dir, local) = setup(&[("a.css", "a"), ("b.css", "b"), ("taken", "file")]);
        let groups = [group(&["a.css"], None), group(&["b.css"], Some("taken"))];

        let err = revisioner(&local).run(&groups).unwrap_err();
        assert!(matches!(err, RevisionError::DestinationNotDir(ref p) if p == Path::new("taken")));
        assert!(dir.path().join("a.css").exists());
        assert!(dir.path().join("b.css").exists());
    }

    #[test]
    fn test_missing_literal_source_is_fatal() {
        let (_dir, local) = setup(&[]);
        let err = revisioner(&local)
            .run(&[group(&["missing.css"], None)])
            .unwrap_err();
        assert!(matches!(err, RevisionError::MissingSource(_)));
    }

    #[test]
    fn test_dir_size_strategy() {
        let (_dir, local) = setup(&[("dist/a.css", "1234"), ("dist/b.css", "5678")]);
        let strategy = HashStrategy::DirSize {
            root: Some(PathBuf::from("dist")),
        };
        let map = Revisioner::new(&local, Settings::default(), strategy)
            .quiet(true)
            .run(&[group(&["dist/*.css"], Some("out"))])
            .unwrap();

        let suffix = Algorithm::Md5.suffix(b"8", 8);
        assert_eq!(map.get("dist/a.css"), Some(format!("out/a.{suffix}.css").as_str()));
        assert_eq!(map.get("dist/b.css"), Some(format!("out/b.{suffix}.css").as_str()));
    }

    #[test]
    fn test_dir_size_measured_before_copies_into_root() {
        let (dir, local) = setup(&[
            ("dist/a.css", "1234"),
            ("dist/b.css", "5678"),
            ("dist/c.css", "90"),
        ]);
        let strategy = HashStrategy::DirSize {
            root: Some(PathBuf::from("dist")),
        };
        let map = Revisioner::new(&local, Settings::default(), strategy)
            .quiet(true)
            .run(&[group(&["dist/*.css"], Some("dist/rev"))])
            .unwrap();

        let suffix = Algorithm::Md5.suffix(b"10", 8);
        for name in ["a", "b", "c"] {
            let expected = format!("dist/rev/{name}.{suffix}.css");
            assert_eq!(map.get(&format!("dist/{name}.css")), Some(expected.as_str()));
            assert!(dir.path().join(&expected).exists());
        }
    }

    #[test]
    fn test_dir_size_defaults_to_parent() {
        let (_dir, local) = setup(&[("a/x.css", "123"), ("b/y.css", "12345")]);
        let strategy = HashStrategy::DirSize { root: None };
        let map = Revisioner::new(&local, Settings::default(), strategy)
            .quiet(true)
            .run(&[group(&["*/*.css"], None)])
            .unwrap();

        let x = format!("a/x.{}.css", Algorithm::Md5.suffix(b"3", 8));
        let y = format!("b/y.{}.css", Algorithm::Md5.suffix(b"5", 8));
        assert_eq!(map.get("a/x.css"), Some(x.as_str()));
        assert_eq!(map.get("b/y.css"), Some(y.as_str()));
    }

    #[test]
    fn test_custom_length_and_algorithm() {
        let (_dir, local) = setup(&[("app.css", "x")]);
        let settings = Settings {
            algorithm: Algorithm::Sha256,
            length: 12,
            ..Default::default()
        };
        let map = Revisioner::new(&local, settings, HashStrategy::Content)
            .quiet(true)
            .run(&[group(&["app.css"], None)])
            .unwrap();

        let expected = format!("app.{}.css", Algorithm::Sha256.suffix(b"x", 12));
        assert_eq!(map.get("app.css"), Some(expected.as_str()));
    }
}
