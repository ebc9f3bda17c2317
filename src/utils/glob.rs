//! Glob expansion for task file lists.
//!
//! Patterns are matched against `/`-separated paths relative to the base
//! directory. A leading `!` turns a pattern into an exclusion. `*` stays
//! within one path segment, `**` crosses segments. Absolute patterns match
//! absolute paths and their results stay absolute.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use jwalk::{Parallelism, WalkDir};
use thiserror::Error;

use super::path::slash::to_slash;

const GLOB_META: &[char] = &['*', '?', '[', '{'];

#[derive(Debug, Error)]
pub enum GlobError {
    #[error("invalid glob pattern")]
    Pattern(#[from] globset::Error),

    #[error("failed to walk `{path}`")]
    Walk {
        path: PathBuf,
        #[source]
        source: jwalk::Error,
    },
}

/// Expand `patterns` under `base`, returning matching files relative to `base`.
///
/// Results are sorted and de-duplicated. A pattern without glob syntax
/// matches itself when the file exists. Matches of absolute patterns stay
/// absolute. Any walk error aborts the expansion.
pub fn expand(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, GlobError> {
    let (excludes, includes): (Vec<&str>, Vec<&str>) = patterns
        .iter()
        .map(String::as_str)
        .partition(|p| p.starts_with('!'));

    let include_set = build_set(includes.iter().copied())?;
    let exclude_set = build_set(excludes.iter().map(|p| &p[1..]))?;

    let mut found = BTreeSet::new();
    for pattern in &includes {
        let absolute = Path::new(pattern).is_absolute();
        let keep = |path: PathBuf| match path.strip_prefix(base) {
            Ok(rel) if !absolute => rel.to_path_buf(),
            _ => path,
        };

        let walk_root = base.join(static_prefix(pattern));
        if walk_root.is_file() {
            found.insert(keep(walk_root));
            continue;
        }
        if !walk_root.is_dir() {
            continue;
        }
        // Callers may already run on a rayon worker; a serial walk never
        // waits on the shared pool.
        for entry in WalkDir::new(&walk_root).parallelism(Parallelism::Serial) {
            let mut entry = entry.map_err(|source| GlobError::Walk {
                path: walk_root.clone(),
                source,
            })?;
            if let Some(source) = entry.read_children_error.take() {
                return Err(GlobError::Walk {
                    path: entry.path(),
                    source,
                });
            }
            if entry.file_type().is_file() {
                found.insert(keep(entry.path()));
            }
        }
    }

    Ok(found
        .into_iter()
        .filter(|path| {
            let key = to_slash(&path.to_string_lossy(), std::path::MAIN_SEPARATOR);
            include_set.is_match(&key) && !exclude_set.is_match(&key)
        })
        .collect())
}

/// A plain path: no glob syntax and not an exclusion.
pub fn is_literal(pattern: &str) -> bool {
    !pattern.starts_with('!') && !pattern.contains(GLOB_META)
}

/// Check pattern syntax without touching the file system.
pub fn validate(pattern: &str) -> Result<(), globset::Error> {
    compile(pattern.strip_prefix('!').unwrap_or(pattern)).map(|_| ())
}

fn compile(pattern: &str) -> Result<Glob, globset::Error> {
    GlobBuilder::new(pattern.trim_start_matches("./"))
        .literal_separator(true)
        .build()
}

fn build_set<'a>(patterns: impl Iterator<Item = &'a str>) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(compile(pattern)?);
    }
    builder.build()
}

/// Leading path segments that contain no glob syntax.
///
/// ```ignore
/// static_prefix("dist/css/*.css") -> "dist/css"
/// static_prefix("**/*.js")        -> ""
/// static_prefix("dist/app.js")    -> "dist/app.js"
/// static_prefix("/srv/www/*.css")  -> "/srv/www"
/// ```
fn static_prefix(pattern: &str) -> PathBuf {
    let segments: Vec<&str> = pattern
        .trim_start_matches("./")
        .split('/')
        .take_while(|segment| !segment.contains(GLOB_META))
        .collect();
    PathBuf::from(segments.join("/"))
}
