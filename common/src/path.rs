//! Path composition for the recursive walks.
//!
//! A traversal is anchored by a parent path and a subpath relative to it; an
//! empty subpath means the walk is still at the level the caller named. The
//! same composition must be used for the remote path recursed into and the
//! local path persisted to, or downloaded trees stop mirroring the remote
//! layout.

/// The remote directory a traversal level should list: `parent` or
/// `parent/subpath`.
pub fn join_remote(parent: &str, subpath: &str) -> String {
    if subpath.is_empty() {
        parent.to_string()
    } else {
        format!("{parent}/{subpath}")
    }
}

/// Remote child path: `parent/name` at the root level, `parent/subpath/name`
/// below it. Always forward-slash separated.
pub fn remote_child(parent: &str, subpath: &str, name: &str) -> String {
    if subpath.is_empty() {
        format!("{parent}/{name}")
    } else {
        format!("{parent}/{subpath}/{name}")
    }
}

/// The subpath for the next traversal level down.
pub fn extend_subpath(subpath: &str, name: &str) -> String {
    if subpath.is_empty() {
        name.to_string()
    } else {
        format!("{subpath}/{name}")
    }
}

/// Local mirror of [`remote_child`], prefixed with `root` and joined with the
/// platform separator. The remote segments are split on `/` so a
/// multi-segment parent lands as nested directories on every host OS.
pub fn local_child(
    root: &std::path::Path,
    parent: &str,
    subpath: &str,
    name: &str,
) -> std::path::PathBuf {
    let mut out = root.to_path_buf();
    for segment in parent.split('/').filter(|s| !s.is_empty()) {
        out.push(segment);
    }
    for segment in subpath.split('/').filter(|s| !s.is_empty()) {
        out.push(segment);
    }
    out.push(name);
    out
}
