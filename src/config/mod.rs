//! Project configuration for `filever.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── options    # [options]
//! │   └── task       # [[task]]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   └── field      # FieldPath
//! └── mod.rs         # FileverConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section     | Purpose                                           |
//! |-------------|---------------------------------------------------|
//! | `[options]` | Defaults for encoding, hash algorithm and length  |
//! | `[[task]]`  | Ordered list of `version` and `replace` tasks     |

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{
    DEFAULT_LENGTH, FileGroup, OptionsConfig, PatternEntry, Phase, ReplaceTask, Settings,
    StrategyKind, Task, VersionTask,
};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath};

use crate::log;
use crate::rewrite::{HashPattern, RefPattern};
use crate::utils::glob;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name.
pub const CONFIG_FILE: &str = "filever.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing `filever.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileverConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root: parent of the config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub options: OptionsConfig,

    /// Tasks in execution order.
    #[serde(default, rename = "task")]
    pub tasks: Vec<Task>,
}

impl FileverConfig {
    /// Search upward from `start` for `config_name`, then load and validate it.
    ///
    /// Unknown keys are reported as warnings; validation errors are collected
    /// and returned together.
    pub fn load(start: &Path, config_name: &Path) -> Result<Self, ConfigError> {
        let config_path = find_config_file(start, config_name)
            .ok_or_else(|| ConfigError::NotFound(config_name.to_path_buf()))?;

        let mut config = Self::from_path(&config_path)?;
        config.root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.config_path = config_path;

        config.validate().map_err(ConfigError::Diagnostics)?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a config file with unknown field detection.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Effective options for `task`.
    pub fn settings_for(&self, task: &Task) -> Settings {
        Settings::resolve(&self.options, &task.options())
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate every task, collecting all errors at once.
    pub fn validate(&self) -> Result<(), ConfigDiagnostics> {
        let mut diag = ConfigDiagnostics::new();

        self.validate_options(&mut diag);

        let tasks = FieldPath::new("task");
        let mut seen_version = false;
        for (i, task) in self.tasks.iter().enumerate() {
            let field = tasks.index(i);
            self.validate_length(task, &field, &mut diag);
            validate_groups(task, &field, &mut diag);

            match task {
                Task::Version(version) => {
                    seen_version = true;
                    if version.strategy == StrategyKind::Content && version.size_root.is_some() {
                        diag.warn(field.child("size_root"), "ignored by the `content` strategy");
                    }
                }
                Task::Replace(replace) => {
                    if !seen_version {
                        diag.warn(field.clone(), "no version task runs before it, nothing to link");
                    }
                    validate_patterns(replace, &field, &mut diag);
                }
            }
        }

        diag.print_warnings();
        diag.into_result()
    }

    fn validate_options(&self, diag: &mut ConfigDiagnostics) {
        let settings = Settings::resolve(&self.options, &OptionsConfig::default());
        if let Some(length) = self.options.length
            && !(1..=settings.algorithm.hex_len()).contains(&length)
        {
            diag.error_with_hint(
                FieldPath::new("options").child("length"),
                format!("length {length} is out of range for {}", settings.algorithm),
                format!("use a value in 1..={}", settings.algorithm.hex_len()),
            );
        }
    }

    /// Effective length against the effective algorithm of one task.
    fn validate_length(&self, task: &Task, field: &FieldPath, diag: &mut ConfigDiagnostics) {
        let overrides = task.options();
        if overrides.length.is_none() && overrides.algorithm.is_none() {
            // covered by validate_options
            return;
        }

        let settings = self.settings_for(task);
        let max = settings.algorithm.hex_len();
        if !(1..=max).contains(&settings.length) {
            diag.error_with_hint(
                field.child("length"),
                format!("length {} is out of range for {}", settings.length, settings.algorithm),
                format!("use a value in 1..={max}"),
            );
        }
    }
}

fn validate_groups(task: &Task, field: &FieldPath, diag: &mut ConfigDiagnostics) {
    let files = field.child("files");
    if task.files().is_empty() {
        diag.warn(files.clone(), "no file groups, task does nothing");
    }

    for (j, group) in task.files().iter().enumerate() {
        let group_field = files.index(j);

        if group.src.is_empty() {
            diag.error(group_field.child("src"), "at least one source pattern is required");
        }

        for (k, pattern) in group.src.iter().enumerate() {
            if let Err(err) = glob::validate(pattern) {
                diag.error(group_field.child("src").index(k), format!("invalid glob: {err}"));
            }
            // dest.join(absolute) is the absolute path itself
            if group.expand && Path::new(pattern.trim_start_matches('!')).is_absolute() {
                diag.error_with_hint(
                    group_field.child("src").index(k),
                    "absolute source cannot be mirrored with `expand = true`",
                    "set `cwd` to its directory and use a relative pattern",
                );
            }
        }

        if group.expand && group.dest.is_none() {
            diag.error_with_hint(
                group_field.child("expand"),
                "`expand = true` requires `dest`",
                "set `dest`, or remove `expand` to process files in place",
            );
        }
    }
}

fn validate_patterns(task: &ReplaceTask, field: &FieldPath, diag: &mut ConfigDiagnostics) {
    let patterns = field.child("patterns");
    if task.patterns.is_empty() {
        diag.error_with_hint(
            patterns.clone(),
            "replace task has no patterns",
            "add e.g. { label = \"css\", regex = '<link[^>]+href=\"([^\"]+)\"' }",
        );
    }

    for (j, entry) in task.patterns.iter().enumerate() {
        if let Err(err) = RefPattern::new(&entry.label, &entry.regex, entry.capture) {
            diag.error(patterns.index(j), error_chain(&err));
        }
    }

    if let Some(hash) = &task.hash
        && let Err(err) = HashPattern::new(hash)
    {
        diag.error(field.child("hash"), error_chain(&err));
    }
}

/// Error message followed by its sources, on one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

// ============================================================================
// tests
// ============================================================================
