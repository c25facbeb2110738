//! Helpers for the POSIX style paths used in the configuration.
//!
//! Paths refer to locations inside the image being customized, never to the
//! host running the tool, so they are handled as plain strings.

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathError {
    #[error("path cannot be empty")]
    Empty,

    #[error("invalid path ({0}): must be an absolute path")]
    NotAbsolute(String),
}

/// Checks that `path` is non-empty and absolute.
pub fn validate_absolute_path(path: &str) -> Result<(), PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }

    if !path.starts_with('/') {
        return Err(PathError::NotAbsolute(path.to_owned()));
    }

    Ok(())
}

/// Lexically normalizes a path: repeated separators are merged, `.` elements
/// are dropped and `..` elements remove the preceding element. A `..` at the
/// start of an absolute path is dropped. Returns `.` for an empty result of a
/// relative path and `/` for an empty result of an absolute path.
pub fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut elements: Vec<&str> = Vec::new();

    for element in path.split('/') {
        match element {
            "" | "." => {}
            ".." => match elements.last() {
                Some(&last) if last != ".." => {
                    elements.pop();
                }
                _ if rooted => {}
                _ => elements.push(".."),
            },
            other => elements.push(other),
        }
    }

    let joined = elements.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_owned(),
        (false, false) => joined,
    }
}
