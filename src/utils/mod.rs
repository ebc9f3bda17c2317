//! Shared helpers: hashing, globbing, encodings, paths.

pub mod encoding;
pub mod glob;
pub mod hash;
pub mod path;

/// Format count with noun, handling pluralization (`1 file`, `3 files`).
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    let s = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{s}")
}
