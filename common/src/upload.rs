//! Recursive upload of a local directory tree.

use crate::path;
use crate::remote::{RemoteError, RemoteFs};
use crate::transfer;

/// Error type for tree uploads that preserves the partial summary.
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
    pub bytes_sent: u64,
    pub files_sent: usize,
    pub directories_created: usize,
    pub failures: usize,
}

impl std::ops::Add for Summary {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            bytes_sent: self.bytes_sent + other.bytes_sent,
            files_sent: self.files_sent + other.files_sent,
            directories_created: self.directories_created + other.directories_created,
            failures: self.failures + other.failures,
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "bytes sent: {}\n\
            files sent: {}\n\
            remote directories created: {}\n\
            send failures: {}",
            bytesize::ByteSize(self.bytes_sent),
            self.files_sent,
            self.directories_created,
            self.failures,
        )
    }
}

/// Walk the local directory `local_dir` and replicate it under
/// `remote_root[/remote_subpath]`, one entry at a time.
///
/// Files are stored, subdirectories are created remotely and then recursed
/// into. Per-entry failures (including a local directory that cannot be
/// read) are reported and the walk continues with the next sibling.
pub fn upload_tree(
    remote: &mut dyn RemoteFs,
    remote_root: &str,
    local_dir: &std::path::Path,
    remote_subpath: &str,
) -> Result<Summary, Error> {
    tracing::debug!("upload walk: reading {:?}", local_dir);
    let mut summary = Summary::default();
    let entries = match std::fs::read_dir(local_dir) {
        Ok(entries) => entries,
        Err(err) => {
            eprintln!("cannot read directory '{}': {err}", local_dir.display());
            summary.failures += 1;
            return Ok(summary);
        }
    };
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                eprintln!("cannot read entry under '{}': {err}", local_dir.display());
                summary.failures += 1;
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let local_path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        let remote_target = path::remote_child(remote_root, remote_subpath, &name);
        if is_dir {
            match remote.make_dir(&remote_target) {
                Ok(()) => {
                    summary.directories_created += 1;
                    println!("created remote directory '{remote_target}'");
                }
                Err(err) if err.is_fatal() => return Err(Error::new(err, summary)),
                Err(err) => {
                    summary.failures += 1;
                    eprintln!("cannot create remote directory '{remote_target}': {err}");
                }
            }
            let child_subpath = path::extend_subpath(remote_subpath, &name);
            match upload_tree(remote, remote_root, &local_path, &child_subpath) {
                Ok(child_summary) => summary = summary + child_summary,
                Err(err) => return Err(Error::new(err.source, summary + err.summary)),
            }
        } else {
            match transfer::upload_one(remote, &remote_target, &local_path) {
                Ok(bytes) => {
                    summary.bytes_sent += bytes;
                    summary.files_sent += 1;
                    println!("sent '{}'", local_path.display());
                }
                Err(err) => match err.into_fatal() {
                    Ok(fatal) => return Err(Error::new(fatal, summary)),
                    Err(err) => {
                        summary.failures += 1;
                        eprintln!("cannot send '{}': {err}", local_path.display());
                    }
                },
            }
        }
    }
    Ok(summary)
}
