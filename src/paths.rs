//! Lexical path hygiene for key files and key stores.
//!
//! Paths are cleaned without touching the filesystem: `.` segments are
//! dropped and `..` pops the previous segment. A relative path whose
//! cleaned form still starts with `..` climbs above the directory it was
//! resolved against and is rejected.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Clean `path` lexically and reject traversal above its starting point
pub fn normalize(path: &Path) -> Result<PathBuf> {
    let mut cleaned = PathBuf::new();
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(prefix) => cleaned.push(prefix.as_os_str()),
            Component::RootDir => cleaned.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    cleaned.pop();
                    depth -= 1;
                } else if !path.has_root() {
                    return Err(Error::PathTraversal(path.display().to_string()));
                }
                // `/..` is `/`
            }
            Component::Normal(segment) => {
                cleaned.push(segment);
                depth += 1;
            }
        }
    }

    if cleaned.as_os_str().is_empty() {
        cleaned.push(".");
    }

    Ok(cleaned)
}

/// Join a single entry name onto `base`, refusing anything but a plain name
pub fn join_within(base: &Path, name: &str) -> Result<PathBuf> {
    let candidate = Path::new(name);
    let mut components = candidate.components();

    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(base.join(candidate)),
        _ => Err(Error::PathTraversal(name.to_string())),
    }
}
