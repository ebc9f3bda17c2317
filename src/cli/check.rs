//! `check` command: list what each task would touch without changing files.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::{FileverConfig, Task};
use crate::utils::{
    glob,
    path::{AssetFs, LocalFs},
    plural_count,
};
use crate::{debug, log};

/// Files matched by one task, per group.
#[derive(Debug, Default)]
pub struct TaskMatches {
    pub label: String,
    pub groups: Vec<Vec<PathBuf>>,
    /// Literal sources that do not exist.
    pub missing: Vec<PathBuf>,
}

impl TaskMatches {
    pub fn total(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }
}

/// Expand every task's globs against the project root.
pub fn collect_matches(config: &FileverConfig) -> Result<Vec<TaskMatches>> {
    let fs = LocalFs::new(config.get_root());

    config
        .tasks
        .iter()
        .enumerate()
        .map(|(index, task)| -> Result<TaskMatches> {
            let label = task.label(index);
            let mut matches = TaskMatches {
                label: label.clone(),
                ..Default::default()
            };

            for group in task.files() {
                let cwd = group.cwd();
                let files = fs
                    .glob(cwd, &group.src)
                    .with_context(|| format!("task `{label}`: failed to expand {:?}", group.src))?;
                matches.missing.extend(
                    group
                        .src
                        .iter()
                        .filter(|p| glob::is_literal(p))
                        .map(|p| cwd.join(p))
                        .filter(|p| !fs.exists(p)),
                );
                matches
                    .groups
                    .push(files.into_iter().map(|f| cwd.join(f)).collect());
            }

            Ok(matches)
        })
        .collect()
}

/// Print a per-task summary. Returns the number of missing literal sources.
pub fn check_tasks(config: &FileverConfig) -> Result<usize> {
    log!("check"; "config {} is valid", config.config_path.display());

    let matches = collect_matches(config)?;
    let mut missing = 0;

    for (task, found) in config.tasks.iter().zip(&matches) {
        let phase = task.phase();
        log!("check"; "{} ({}): {}", found.label, phase, plural_count(found.total(), "file"));

        for file in found.groups.iter().flatten() {
            debug!("check"; "  {}", file.display());
        }
        for file in &found.missing {
            let fatal = matches!(task, Task::Version(_));
            log!(
                "warning";
                "{} not found{}",
                file.display(),
                if fatal { ", version would abort" } else { "" }
            );
        }
        missing += found.missing.len();
    }

    Ok(missing)
}
