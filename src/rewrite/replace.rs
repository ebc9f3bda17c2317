//! Replace phase: point asset references at their revisioned names.
//!
//! For each target file, every pattern is tried once, in order, against the
//! current content. The captured link is reduced to its hash-free base form,
//! looked up in the asset map by suffix, and replaced by its hashed
//! equivalent unless it already is that.

use std::path::{Path, PathBuf};

use owo_colors::OwoColorize;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use super::link::hash_link;
use super::pattern::{HashPattern, LinkPattern};
use crate::asset::{AssetMap, RevisionError};
use crate::config::FileGroup;
use crate::utils::{encoding::Encoding, glob, path::AssetFs};
use crate::{debug, log};

/// What one pattern did to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The pattern does not match the content.
    NoMatch,
    /// Matched, but no asset map key ends with the base link.
    NoAsset { link: String },
    /// The reference already points at the hashed name.
    AlreadyLinked { label: String, link: String },
    /// The reference was rewritten.
    Linked {
        label: String,
        from: String,
        to: String,
    },
}

/// Counters for one run of the replace phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// Files written back.
    pub updated: usize,
    /// Links rewritten across all files.
    pub linked: usize,
    /// References found already pointing at the hashed name.
    pub already_linked: usize,
    /// Target paths that did not exist.
    pub missing: usize,
}

impl RewriteReport {
    fn merge(mut self, other: Self) -> Self {
        self.updated += other.updated;
        self.linked += other.linked;
        self.already_linked += other.already_linked;
        self.missing += other.missing;
        self
    }
}

/// One target file and where its rewritten content goes.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    source: PathBuf,
    output: PathBuf,
}

/// Rewriter over a read-only asset map.
pub struct Rewriter<'a, F: AssetFs, P: LinkPattern + Sync> {
    fs: &'a F,
    map: &'a AssetMap,
    patterns: &'a [P],
    hash: Option<&'a HashPattern>,
    encoding: Encoding,
}

impl<'a, F: AssetFs, P: LinkPattern + Sync> Rewriter<'a, F, P> {
    pub fn new(fs: &'a F, map: &'a AssetMap, patterns: &'a [P]) -> Self {
        Self {
            fs,
            map,
            patterns,
            hash: None,
            encoding: Encoding::default(),
        }
    }

    pub fn with_hash(mut self, hash: Option<&'a HashPattern>) -> Self {
        self.hash = hash;
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Rewrite every target of `groups`.
    ///
    /// Targets are processed in parallel unless two of them write the same
    /// output, in which case they run in order and the last one wins.
    pub fn run(&self, groups: &[FileGroup]) -> Result<RewriteReport, RevisionError> {
        let (targets, missing) = self.collect_targets(groups)?;

        let mut outputs = FxHashSet::default();
        let shared_output = !targets.iter().all(|t| outputs.insert(t.output.as_path()));

        let report = if shared_output {
            targets
                .iter()
                .map(|t| self.rewrite_file(t))
                .try_fold(RewriteReport::default(), |acc, r| r.map(|r| acc.merge(r)))?
        } else {
            targets
                .par_iter()
                .map(|t| self.rewrite_file(t))
                .try_reduce(RewriteReport::default, |a, b| Ok(a.merge(b)))?
        };

        Ok(RewriteReport { missing, ..report })
    }

    /// Expand groups into targets, warning about literal paths that are missing.
    fn collect_targets(&self, groups: &[FileGroup]) -> Result<(Vec<Target>, usize), RevisionError> {
        let mut targets = Vec::new();
        let mut missing = 0;

        for group in groups {
            let cwd = group.cwd();

            for pattern in group.src.iter().filter(|p| glob::is_literal(p)) {
                let path = cwd.join(pattern);
                if !self.fs.exists(&path) {
                    log!("warning"; "source file \"{}\" not found", path.display());
                    missing += 1;
                }
            }

            let files = self
                .fs
                .glob(cwd, &group.src)
                .map_err(|source| RevisionError::Glob {
                    patterns: group.src.clone(),
                    source,
                })?;

            if files.is_empty() && !group.src.iter().all(|p| glob::is_literal(p)) {
                log!("warning"; "no files matched {:?}", group.src);
            }

            targets.extend(files.into_iter().map(|rel| {
                let source = cwd.join(&rel);
                let output = match &group.dest {
                    Some(dest) if group.expand => dest.join(&rel),
                    Some(dest) => dest.clone(),
                    None => source.clone(),
                };
                Target { source, output }
            }));
        }

        Ok((targets, missing))
    }

    fn rewrite_file(&self, target: &Target) -> Result<RewriteReport, RevisionError> {
        let bytes = self
            .fs
            .read(&target.source)
            .map_err(RevisionError::io("read", &target.source))?;
        let content = self
            .encoding
            .decode(bytes)
            .ok_or_else(|| RevisionError::Decode {
                path: target.source.clone(),
                encoding: self.encoding,
            })?;

        let (content, outcomes) = self.rewrite_content(&target.source, &target.output, content);

        let mut report = RewriteReport::default();
        for outcome in &outcomes {
            match outcome {
                LinkOutcome::Linked { .. } => report.linked += 1,
                LinkOutcome::AlreadyLinked { .. } => report.already_linked += 1,
                LinkOutcome::NoMatch | LinkOutcome::NoAsset { .. } => {}
            }
        }

        if report.linked > 0 {
            let bytes = self
                .encoding
                .encode(content)
                .ok_or_else(|| RevisionError::Encode {
                    path: target.output.clone(),
                    encoding: self.encoding,
                })?;
            self.fs
                .write(&target.output, &bytes)
                .map_err(RevisionError::io("write", &target.output))?;
            report.updated = 1;
        }

        Ok(report)
    }

    /// Apply every pattern once to `content`, returning the new content and
    /// one outcome per pattern.
    fn rewrite_content(
        &self,
        source: &Path,
        output: &Path,
        mut content: String,
    ) -> (String, Vec<LinkOutcome>) {
        let mut announced = false;
        let mut outcomes = Vec::with_capacity(self.patterns.len());

        for pattern in self.patterns {
            let outcome = self.apply_pattern(pattern, &mut content);

            if !announced && matches!(outcome, LinkOutcome::Linked { .. } | LinkOutcome::AlreadyLinked { .. }) {
                announced = true;
                if output == source {
                    log!("replace"; "updating {}", source.display().cyan());
                } else {
                    log!("replace"; "updating {} -> {}", source.display().cyan(), output.display().cyan());
                }
            }

            match &outcome {
                LinkOutcome::NoMatch => {
                    debug!("replace"; "not matching {}: {}", source.display(), pattern.label());
                }
                LinkOutcome::NoAsset { link } => {
                    debug!("replace"; "no asset for {} in {}", link, source.display());
                }
                LinkOutcome::AlreadyLinked { label, link } => {
                    log!("replace"; "already linked {}: {}", label, link.green());
                }
                LinkOutcome::Linked { label, from, to } => {
                    log!("replace"; "linking {}: {} -> {}", label, from, to.green());
                }
            }

            outcomes.push(outcome);
        }

        (content, outcomes)
    }

    /// First match of `pattern` only; `content` is edited in place.
    fn apply_pattern(&self, pattern: &P, content: &mut String) -> LinkOutcome {
        let Some(found) = pattern.find_link(content) else {
            return LinkOutcome::NoMatch;
        };

        debug!("replace"; "{} matched `{}`", pattern.label(), &content[found.span.clone()]);
        let last_link = &content[found.link.clone()];
        let base_link = match self.hash {
            Some(hash) => hash.strip(last_link),
            None => last_link.to_string(),
        };

        let Some((key, value)) = self.map.find_by_suffix(&base_link) else {
            return LinkOutcome::NoAsset {
                link: last_link.to_string(),
            };
        };

        let Some(hashed) = hash_link(key, value, &base_link) else {
            debug!("replace"; "no usable window for {} in {} -> {}", base_link, key, value);
            return LinkOutcome::NoAsset {
                link: last_link.to_string(),
            };
        };

        let label = pattern.label().to_string();
        if hashed == last_link {
            return LinkOutcome::AlreadyLinked {
                label,
                link: hashed.to_string(),
            };
        }

        let from = if base_link == last_link {
            last_link.to_string()
        } else {
            format!("{last_link} -> {base_link}")
        };
        let to = hashed.to_string();

        // The link lies inside the matched span; splicing it directly
        // rewrites the matched text and the content in one step.
        content.replace_range(found.link, &to);

        LinkOutcome::Linked { label, from, to }
    }
}
