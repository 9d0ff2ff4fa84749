//! Path resolution shared by the commands

use std::env;
use std::path::{Path, PathBuf};

/// Default sessions directory under the root
pub const SESSIONS_DIR: &str = "chat_history";

/// Resolve the base directory.
///
/// An explicit root wins; otherwise the current directory, or "." if that
/// cannot be determined.
pub fn resolve_root_path(root: Option<PathBuf>) -> PathBuf {
    root.unwrap_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Resolve `path` against `root` unless it is absolute
pub fn resolve_under(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Sessions directory: `--sessions-dir` if given, else `<root>/chat_history`
pub fn resolve_sessions_dir(root: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(dir) => resolve_under(root, dir),
        None => root.join(SESSIONS_DIR),
    }
}
