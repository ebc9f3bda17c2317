//! Reference and hash patterns.
//!
//! A reference pattern locates an asset link inside a larger match, e.g.
//! the `href` value of a `<link>` tag. Only the first match in a file is
//! ever used.

use std::ops::Range;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid regex for pattern `{label}`")]
    Regex {
        label: String,
        #[source]
        source: regex::Error,
    },

    #[error("pattern `{label}` has no capture group {capture} (it has {groups})")]
    MissingCapture {
        label: String,
        capture: usize,
        groups: usize,
    },
}

/// First match of a pattern: the whole matched span and the link inside it.
///
/// Both ranges are byte offsets into the searched text; `link` lies within
/// `span`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMatch {
    pub span: Range<usize>,
    pub link: Range<usize>,
}

/// Capability to find the first match and its captured link.
pub trait LinkPattern {
    fn label(&self) -> &str;
    fn find_link(&self, haystack: &str) -> Option<LinkMatch>;
}

/// Regex-backed reference pattern.
#[derive(Debug, Clone)]
pub struct RefPattern {
    label: String,
    regex: Regex,
    capture: usize,
}

impl RefPattern {
    pub fn new(label: impl Into<String>, regex: &str, capture: usize) -> Result<Self, PatternError> {
        let label = label.into();
        let regex = Regex::new(regex).map_err(|source| PatternError::Regex {
            label: label.clone(),
            source,
        })?;

        // captures_len counts group 0
        let groups = regex.captures_len() - 1;
        if capture > groups {
            return Err(PatternError::MissingCapture {
                label,
                capture,
                groups,
            });
        }

        Ok(Self {
            label,
            regex,
            capture,
        })
    }
}

impl LinkPattern for RefPattern {
    fn label(&self) -> &str {
        &self.label
    }

    fn find_link(&self, haystack: &str) -> Option<LinkMatch> {
        let caps = self.regex.captures(haystack)?;
        let whole = caps.get(0)?;
        let link = caps
            .get(self.capture)
            .filter(|m| !m.is_empty())
            .unwrap_or(whole);

        Some(LinkMatch {
            span: whole.range(),
            link: link.range(),
        })
    }
}

/// Pattern locating a previously embedded hash fragment in a link.
#[derive(Debug, Clone)]
pub struct HashPattern(RefPattern);

impl HashPattern {
    /// Group 1 is the fragment when present, else the whole match.
    pub fn new(regex: &str) -> Result<Self, PatternError> {
        let compiled = Regex::new(regex).map_err(|source| PatternError::Regex {
            label: "hash".into(),
            source,
        })?;
        let capture = usize::from(compiled.captures_len() > 1);
        RefPattern::new("hash", regex, capture).map(Self)
    }

    /// `link` with the first hash fragment removed.
    ///
    /// ```ignore
    /// // hash = '(\.[0-9a-f]{8})\.\w+$'
    /// strip("css/app.a1b2c3d4.css") -> "css/app.css"
    /// strip("css/app.css")          -> "css/app.css"
    /// ```
    pub fn strip(&self, link: &str) -> String {
        match self.0.find_link(link) {
            Some(m) => format!("{}{}", &link[..m.link.start], &link[m.link.end..]),
            None => link.to_string(),
        }
    }
}
