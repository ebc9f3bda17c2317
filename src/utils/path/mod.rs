//! Path utilities.
//!
//! - [`fs`]: the [`AssetFs`] accessor and its local-disk implementation
//! - [`slash`]: forward-slash normalization for asset map entries

pub mod fs;
pub mod slash;

pub use fs::{AssetFs, LocalFs};
