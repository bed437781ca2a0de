//! Base directory and path resolution.
//!
//! Paths are made absolute and normalized lexically. Symbolic links are never
//! followed, so a base directory keeps the spelling it was configured with.

use std::path::{Component, Path, PathBuf};

use super::keys::{PROJECT_BASEDIR, PROJECT_HOME};
use super::PropertyBag;

/// Resolves `raw` against `base_dir` unless it is already absolute, then
/// collapses `.` and `..` segments.
pub fn resolve_absolute(raw: &str, base_dir: &Path) -> PathBuf {
    let path = Path::new(raw.trim());
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base_dir.join(path))
    }
}

/// Computes the root project base directory.
///
/// `project.home` (or `working_dir` when unset) is the starting point; an
/// explicit `sonar.projectBaseDir` is resolved against it and wins.
pub fn root_base_dir(props: &PropertyBag, working_dir: &Path) -> PathBuf {
    let project_home = match props.get(PROJECT_HOME) {
        Some(home) => resolve_absolute(home, working_dir),
        None => normalize(working_dir),
    };

    match props.get(PROJECT_BASEDIR) {
        Some(base_dir) => resolve_absolute(base_dir, &project_home),
        None => project_home,
    }
}

/// Lexical normalization: drops `.` segments and lets `..` pop the previous one.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                let last = out.components().next_back();
                let can_pop = matches!(last, Some(Component::Normal(_)));
                let at_root = matches!(last, Some(Component::RootDir | Component::Prefix(_)));
                if can_pop {
                    out.pop();
                } else if !at_root {
                    out.push("..");
                }
            }
            Component::Normal(part) => out.push(part),
            Component::RootDir => out.push(comp.as_os_str()),
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
        }
    }
    out
}

/// Whether two paths name the same directory on disk, by file identity rather
/// than by spelling.
pub fn is_same_dir(a: &Path, b: &Path) -> std::io::Result<bool> {
    same_file::is_same_file(a, b)
}
