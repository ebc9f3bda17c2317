//! Recover the hashed form of a link from a matching asset map entry.

/// Hashed equivalent of `base_link`, given the entry `key → value` whose key
/// ends with `base_link`.
///
/// The key is `<lead><base_link>`. When the value starts with the same
/// `<lead>`, dropping it from the value gives the answer. A value in another
/// directory (copied to a destination) keeps as many trailing segments as
/// `base_link` has, provided `base_link` starts on a segment boundary.
///
/// ```ignore
/// hash_link("css/app.css", "css/app.a1b2c3d4.css", "app.css")      -> Some("app.a1b2c3d4.css")
/// hash_link("css/app.css", "css/app.a1b2c3d4.css", "css/app.css")  -> Some("css/app.a1b2c3d4.css")
/// hash_link("src/app.css", "dist/app.a1b2c3d4.css", "app.css")     -> Some("app.a1b2c3d4.css")
/// ```
pub fn hash_link<'v>(key: &str, value: &'v str, base_link: &str) -> Option<&'v str> {
    let lead_len = key.len().checked_sub(base_link.len())?;
    let lead = key.get(..lead_len)?;

    if value.starts_with(lead) {
        return value.get(lead_len..);
    }

    if lead.ends_with('/') {
        let segments = base_link.split('/').count();
        return Some(trailing_segments(value, segments));
    }

    value.get(lead_len..)
}

/// Last `n` `/`-separated segments of `path` (the whole path if it has fewer).
fn trailing_segments(path: &str, n: usize) -> &str {
    path.rmatch_indices('/')
        .nth(n.saturating_sub(1))
        .map_or(path, |(i, _)| &path[i + 1..])
}
