//! Configuration section definitions.
//!
//! | Module    | TOML Section | Purpose                          |
//! |-----------|--------------|----------------------------------|
//! | `options` | `[options]`  | Encoding, algorithm, hash length |
//! | `task`    | `[[task]]`   | Version and replace tasks        |

mod options;
mod task;

pub use options::{DEFAULT_LENGTH, OptionsConfig, Settings};
pub use task::{
    FileGroup, Phase, PatternEntry, ReplaceTask, StrategyKind, Task, VersionTask,
};
