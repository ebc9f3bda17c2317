//! Configuration utility types.
//!
//! | Module  | Purpose                              |
//! |---------|--------------------------------------|
//! | `error` | Load errors and validation reports   |
//! | `field` | Field paths for diagnostics          |

mod error;
mod field;

pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};
pub use field::FieldPath;
