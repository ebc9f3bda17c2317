//! `[options]` section: defaults shared by every task.
//!
//! ```toml
//! [options]
//! encoding = "utf8"
//! algorithm = "md5"
//! length = 8
//! ```

use serde::{Deserialize, Serialize};

use crate::utils::{encoding::Encoding, hash::Algorithm};

/// Default number of hex characters kept from the digest.
pub const DEFAULT_LENGTH: usize = 8;

/// Option values as written; unset fields fall through to the next layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsConfig {
    pub encoding: Option<Encoding>,
    pub algorithm: Option<Algorithm>,
    pub length: Option<usize>,
}

/// Effective options for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub encoding: Encoding,
    pub algorithm: Algorithm,
    pub length: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            encoding: Encoding::default(),
            algorithm: Algorithm::default(),
            length: DEFAULT_LENGTH,
        }
    }
}

impl Settings {
    /// Layer task-level overrides on top of `[options]` on top of defaults.
    pub fn resolve(global: &OptionsConfig, task: &OptionsConfig) -> Self {
        let defaults = Self::default();
        Self {
            encoding: task.encoding.or(global.encoding).unwrap_or(defaults.encoding),
            algorithm: task.algorithm.or(global.algorithm).unwrap_or(defaults.algorithm),
            length: task.length.or(global.length).unwrap_or(defaults.length),
        }
    }
}
