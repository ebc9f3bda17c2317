//! Version phase: asset hashing, renaming, and the resulting asset map.

mod error;
mod map;
mod version;

pub use error::RevisionError;
pub use map::AssetMap;
pub use version::{HashStrategy, revision_files};
