//! Config field path used in diagnostics.

use owo_colors::OwoColorize;
use std::fmt;

/// Dotted path to a config field, e.g. `task[1].patterns[0].regex`.
///
/// Task entries are arrays of tables, so paths are built at validation time
/// from indices rather than known statically.
///
/// ```ignore
/// let path = FieldPath::new("task").index(1).child("patterns").index(0).child("regex");
/// assert_eq!(path.as_str(), "task[1].patterns[0].regex");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(String);

impl FieldPath {
    #[inline]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// `self.<name>`
    pub fn child(&self, name: &str) -> Self {
        if self.0.is_empty() {
            Self::new(name)
        } else {
            Self(format!("{}.{name}", self.0))
        }
    }

    /// `self[<index>]`
    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}[{index}]", self.0))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_args!("`{}`", self.0).bright_blue())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_path() {
        let path = FieldPath::new("task").index(1).child("files").index(0).child("src");
        assert_eq!(path.as_str(), "task[1].files[0].src");
        assert_eq!(FieldPath::new("").child("options").as_str(), "options");
    }
}
