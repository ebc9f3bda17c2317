//! Replace phase: rewrite asset references to their revisioned names.

mod link;
mod pattern;
mod replace;

pub use pattern::{HashPattern, PatternError, RefPattern};
pub use replace::{RewriteReport, Rewriter};
