//! Forward-slash path strings.
//!
//! Asset map keys and values are plain strings compared by suffix, so both
//! sides must share one separator convention. Everything stored in the map
//! goes through [`to_map_key_with`] first.

/// Rewrite the host separator to `/` when the host does not use `/` natively.
#[inline]
pub fn to_slash(path: &str, separator: char) -> String {
    if separator == '/' {
        path.to_string()
    } else {
        path.replace(separator, "/")
    }
}

/// Lexically clean a `/`-separated path.
///
/// Drops `.` and empty segments and folds `..` into its parent where one
/// exists. Never touches the file system.
///
/// ```ignore
/// clean("./dist//css/../js/app.js") -> "dist/js/app.js"
/// clean("../shared/a.css")           -> "../shared/a.css"
/// ```
pub fn clean(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Canonical asset map form of `path`, using an explicit host separator.
pub fn to_map_key_with(path: &str, separator: char) -> String {
    clean(&to_slash(path, separator))
}
