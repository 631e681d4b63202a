//! Recursive removal of a remote directory tree.

use crate::path;
use crate::remote::{RemoteError, RemoteFs};

/// Error type for tree removal that preserves the partial summary.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct Error {
    #[source]
    pub source: RemoteError,
    pub summary: Summary,
}

impl Error {
    #[must_use]
    pub fn new(source: RemoteError, summary: Summary) -> Self {
        Error { source, summary }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct Summary {
    pub files_removed: usize,
    pub directories_removed: usize,
    pub failures: usize,
}

impl std::ops::Add for Summary {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            files_removed: self.files_removed + other.files_removed,
            directories_removed: self.directories_removed + other.directories_removed,
            failures: self.failures + other.failures,
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "remote files removed: {}\n\
            remote directories removed: {}\n\
            removal failures: {}",
            self.files_removed, self.directories_removed, self.failures,
        )
    }
}

/// Remove the remote directory `remote_parent[/remote_subpath]` and
/// everything below it, children before parents (post-order).
///
/// Removal of the directory itself is attempted even when some child
/// deletions failed; each outcome is reported independently.
pub fn remove_tree(
    remote: &mut dyn RemoteFs,
    remote_parent: &str,
    remote_subpath: &str,
) -> Result<Summary, Error> {
    let dir_to_remove = path::join_remote(remote_parent, remote_subpath);
    tracing::debug!("remove walk: listing {:?}", dir_to_remove);
    let mut summary = Summary::default();
    match remote.list(&dir_to_remove) {
        Ok(entries) => {
            for entry in &entries {
                if entry.is_traversal_marker() {
                    continue;
                }
                let name = entry.base_name();
                if entry.is_dir() {
                    let child_subpath = path::extend_subpath(remote_subpath, name);
                    match remove_tree(remote, remote_parent, &child_subpath) {
                        Ok(child_summary) => summary = summary + child_summary,
                        Err(err) => return Err(Error::new(err.source, summary + err.summary)),
                    }
                } else {
                    let remote_path = path::remote_child(remote_parent, remote_subpath, name);
                    match remote.delete_file(&remote_path) {
                        Ok(()) => {
                            summary.files_removed += 1;
                            println!("deleted '{remote_path}'");
                        }
                        Err(err) if err.is_fatal() => return Err(Error::new(err, summary)),
                        Err(err) => {
                            summary.failures += 1;
                            eprintln!("cannot delete '{remote_path}': {err}");
                        }
                    }
                }
            }
        }
        Err(err) if err.is_fatal() => return Err(Error::new(err, summary)),
        Err(err) => {
            // still attempt to remove the directory itself below
            summary.failures += 1;
            eprintln!("cannot list '{dir_to_remove}': {err}");
        }
    }
    match remote.remove_dir(&dir_to_remove) {
        Ok(()) => {
            summary.directories_removed += 1;
            println!("removed directory '{dir_to_remove}'");
        }
        Err(err) if err.is_fatal() => return Err(Error::new(err, summary)),
        Err(err) => {
            summary.failures += 1;
            eprintln!("cannot remove directory '{dir_to_remove}': {err}");
        }
    }
    Ok(summary)
}
