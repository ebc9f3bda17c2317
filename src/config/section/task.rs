//! `[[task]]` entries: the two phases of a run.
//!
//! # Example
//!
//! ```toml
//! [[task]]
//! phase = "version"
//! files = [
//!     { src = ["dist/css/*.css", "!dist/css/*.min.css"] },
//!     { src = ["js/**/*.js"], cwd = "dist", dest = "dist/rev", expand = true },
//! ]
//!
//! [[task]]
//! phase = "replace"
//! files = [{ src = ["dist/*.html"] }]
//! patterns = [{ label = "css", regex = '<link[^>]+href="([^"]+)"' }]
//! hash = '(\.[0-9a-f]{8})\.\w+$'
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::OptionsConfig;
use crate::asset::HashStrategy;
use crate::rewrite::{HashPattern, PatternError, RefPattern};
use crate::utils::{encoding::Encoding, hash::Algorithm};

/// Phase a task belongs to. There are exactly two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Version,
    Replace,
}

impl Phase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::Replace => "replace",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured task, selected by its `phase` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum Task {
    Version(VersionTask),
    Replace(ReplaceTask),
}

impl Task {
    pub const fn phase(&self) -> Phase {
        match self {
            Self::Version(_) => Phase::Version,
            Self::Replace(_) => Phase::Replace,
        }
    }

    pub fn files(&self) -> &[FileGroup] {
        match self {
            Self::Version(t) => &t.files,
            Self::Replace(t) => &t.files,
        }
    }

    /// Label for logs: the configured name, else `<phase>#<index>`.
    pub fn label(&self, index: usize) -> String {
        let name = match self {
            Self::Version(t) => t.name.as_deref(),
            Self::Replace(t) => t.name.as_deref(),
        };
        name.map_or_else(|| format!("{}#{index}", self.phase()), str::to_string)
    }

    /// Task-level option overrides.
    pub fn options(&self) -> OptionsConfig {
        match self {
            Self::Version(t) => OptionsConfig {
                encoding: None,
                algorithm: t.algorithm,
                length: t.length,
            },
            Self::Replace(t) => OptionsConfig {
                encoding: t.encoding,
                algorithm: None,
                length: None,
            },
        }
    }
}

/// A set of source files plus an optional destination.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGroup {
    /// Glob patterns; a leading `!` excludes.
    pub src: Vec<String>,
    /// Directory globs are matched in (relative to the project root).
    pub cwd: Option<PathBuf>,
    /// Version: destination directory. Replace: output file, or output
    /// directory when `expand` is set.
    pub dest: Option<PathBuf>,
    /// Mirror each file's path relative to `cwd` below `dest`.
    pub expand: bool,
}

impl FileGroup {
    pub fn cwd(&self) -> &Path {
        self.cwd.as_deref().unwrap_or(Path::new(""))
    }
}

/// How the version phase derives the digest input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// File bytes.
    #[default]
    Content,
    /// Aggregate size of a directory tree; coarse, not content-addressed.
    DirSize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionTask {
    pub name: Option<String>,
    pub files: Vec<FileGroup>,
    pub strategy: StrategyKind,
    /// Directory measured by `dir-size`; defaults to each file's parent.
    pub size_root: Option<PathBuf>,
    pub algorithm: Option<Algorithm>,
    pub length: Option<usize>,
}

impl VersionTask {
    pub fn hash_strategy(&self) -> HashStrategy {
        match self.strategy {
            StrategyKind::Content => HashStrategy::Content,
            StrategyKind::DirSize => HashStrategy::DirSize {
                root: self.size_root.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaceTask {
    pub name: Option<String>,
    pub files: Vec<FileGroup>,
    /// Applied in order, first match only per file.
    pub patterns: Vec<PatternEntry>,
    /// Strips a previously embedded hash from a captured link.
    pub hash: Option<String>,
    pub encoding: Option<Encoding>,
}

impl ReplaceTask {
    /// Compile the reference patterns in configured order.
    pub fn ref_patterns(&self) -> Result<Vec<RefPattern>, PatternError> {
        self.patterns
            .iter()
            .map(|p| RefPattern::new(&p.label, &p.regex, p.capture))
            .collect()
    }

    pub fn hash_pattern(&self) -> Result<Option<HashPattern>, PatternError> {
        self.hash.as_deref().map(HashPattern::new).transpose()
    }
}

/// A labelled reference pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternEntry {
    pub label: String,
    pub regex: String,
    /// Capture group holding the link; the whole match is used when the
    /// group does not participate or is empty.
    #[serde(default = "default_capture")]
    pub capture: usize,
}

const fn default_capture() -> usize {
    1
}
