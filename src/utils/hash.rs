//! Digest providers keyed by algorithm name.
//!
//! Every algorithm renders its digest as lowercase hex. The short suffix
//! embedded in revisioned filenames is a prefix of that hex string.
//!
//! # Usage
//!
//! ```ignore
//! let algo: Algorithm = "sha256".parse()?;
//! let hex = algo.hex_digest(b"body {}");
//! let suffix = algo.suffix(b"body {}", 8); // -> "a1b2c3d4"
//! ```

use std::fmt;
use std::str::FromStr;

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Algorithm {
    #[default]
    Md5,
    Sha1,
    Sha256,
    Sha512,
    Blake3,
}

impl Algorithm {
    pub const ALL: [Self; 5] = [
        Self::Md5,
        Self::Sha1,
        Self::Sha256,
        Self::Sha512,
        Self::Blake3,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Blake3 => "blake3",
        }
    }

    /// Length of the full hex digest.
    pub const fn hex_len(self) -> usize {
        match self {
            Self::Md5 => 32,
            Self::Sha1 => 40,
            Self::Sha256 | Self::Blake3 => 64,
            Self::Sha512 => 128,
        }
    }

    /// Digest `data` and render it as lowercase hex.
    pub fn hex_digest(self, data: &[u8]) -> String {
        match self {
            Self::Md5 => hex::encode(Md5::digest(data)),
            Self::Sha1 => hex::encode(Sha1::digest(data)),
            Self::Sha256 => hex::encode(Sha256::digest(data)),
            Self::Sha512 => hex::encode(Sha512::digest(data)),
            Self::Blake3 => blake3::hash(data).to_hex().to_string(),
        }
    }

    /// Digest `data` and keep the first `length` hex characters.
    ///
    /// `length` is clamped to the digest size; config validation rejects
    /// longer values before they get here.
    pub fn suffix(self, data: &[u8], length: usize) -> String {
        let mut hex = self.hex_digest(data);
        hex.truncate(length.min(self.hex_len()));
        hex
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        let normalized = lower.replace('-', "");
        Self::ALL
            .into_iter()
            .find(|a| a.name() == normalized)
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|a| a.name()).collect();
                format!("unknown hash algorithm `{s}` (expected one of: {})", names.join(", "))
            })
    }
}

impl TryFrom<String> for Algorithm {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        assert_eq!(
            Algorithm::Md5.hex_digest(b"hello world"),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
        assert_eq!(
            Algorithm::Sha1.hex_digest(b"hello world"),
            "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"
        );
        assert_eq!(
            Algorithm::Sha256.hex_digest(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_hex_len_matches_digest() {
        for algo in Algorithm::ALL {
            assert_eq!(algo.hex_digest(b"x").len(), algo.hex_len(), "{algo}");
        }
    }

    #[test]
    fn test_suffix_is_deterministic_prefix() {
        let a = Algorithm::Md5.suffix(b"body {}", 8);
        let b = Algorithm::Md5.suffix(b"body {}", 8);
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
        assert!(Algorithm::Md5.hex_digest(b"body {}").starts_with(&a));
        assert!(a.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    }

    #[test]
    fn test_suffix_clamped_to_digest() {
        assert_eq!(Algorithm::Md5.suffix(b"x", 100).len(), 32);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("MD5".parse::<Algorithm>(), Ok(Algorithm::Md5));
        assert_eq!("sha-256".parse::<Algorithm>(), Ok(Algorithm::Sha256));
        assert_eq!("blake3".parse::<Algorithm>(), Ok(Algorithm::Blake3));
        assert!("crc32".parse::<Algorithm>().is_err());
    }
}
