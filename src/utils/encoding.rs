//! Text encodings for files the rewriter reads and writes.

use serde::{Deserialize, Serialize};

/// Encoding used to decode target files and encode rewritten content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    #[serde(alias = "utf-8")]
    Utf8,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    #[serde(alias = "binary", alias = "iso-8859-1")]
    Latin1,
}

impl Encoding {
    /// Decode `bytes`, returning `None` when they are not valid in this encoding.
    pub fn decode(self, bytes: Vec<u8>) -> Option<String> {
        match self {
            Self::Utf8 => String::from_utf8(bytes).ok(),
            Self::Latin1 => Some(bytes.into_iter().map(char::from).collect()),
        }
    }

    /// Encode `text`, returning `None` when a character has no representation.
    pub fn encode(self, text: String) -> Option<Vec<u8>> {
        match self {
            Self::Utf8 => Some(text.into_bytes()),
            Self::Latin1 => text.chars().map(|c| u8::try_from(c).ok()).collect(),
        }
    }
}
