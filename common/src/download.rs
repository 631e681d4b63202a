//! Recursive download of a remote directory tree.

use crate::path;
use crate::remote::{RemoteError, RemoteFs};
use crate::transfer;

/// Error type for tree downloads that preserves the partial summary. Only a
/// lost session produces it; per-entry failures are counted and walked past.
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
    pub bytes_fetched: u64,
    pub files_fetched: usize,
    pub directories_created: usize,
    pub failures: usize,
}

impl std::ops::Add for Summary {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            bytes_fetched: self.bytes_fetched + other.bytes_fetched,
            files_fetched: self.files_fetched + other.files_fetched,
            directories_created: self.directories_created + other.directories_created,
            failures: self.failures + other.failures,
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "bytes fetched: {}\n\
            files fetched: {}\n\
            directories created: {}\n\
            fetch failures: {}",
            bytesize::ByteSize(self.bytes_fetched),
            self.files_fetched,
            self.directories_created,
            self.failures,
        )
    }
}

/// Walk the remote directory `remote_parent[/remote_subpath]` and mirror it
/// under `local_root`, one entry at a time in listing order.
///
/// Directories are created locally before their contents are visited
/// (pre-order). An empty listing ends the branch; entries named `.` or `..`
/// are skipped; any per-entry failure is reported and the walk continues
/// with the next sibling.
pub fn download_tree(
    remote: &mut dyn RemoteFs,
    remote_parent: &str,
    remote_subpath: &str,
    local_root: &std::path::Path,
) -> Result<Summary, Error> {
    let dir_to_list = path::join_remote(remote_parent, remote_subpath);
    tracing::debug!("download walk: listing {:?}", dir_to_list);
    let mut summary = Summary::default();
    let entries = match remote.list(&dir_to_list) {
        Ok(entries) => entries,
        Err(err) if err.is_fatal() => return Err(Error::new(err, summary)),
        Err(err) => {
            eprintln!("cannot list '{dir_to_list}': {err}");
            summary.failures += 1;
            return Ok(summary);
        }
    };
    for entry in &entries {
        if entry.is_traversal_marker() {
            continue;
        }
        let name = entry.base_name();
        if entry.is_dir() {
            let local_dir = path::local_child(local_root, remote_parent, remote_subpath, name);
            match std::fs::create_dir_all(&local_dir) {
                Ok(()) => {
                    summary.directories_created += 1;
                    println!("created directory '{}'", local_dir.display());
                }
                Err(err) => {
                    summary.failures += 1;
                    eprintln!("cannot create directory '{}': {err}", local_dir.display());
                }
            }
            let child_subpath = path::extend_subpath(remote_subpath, name);
            match download_tree(remote, remote_parent, &child_subpath, local_root) {
                Ok(child_summary) => summary = summary + child_summary,
                Err(err) => return Err(Error::new(err.source, summary + err.summary)),
            }
        } else {
            let remote_path = path::remote_child(remote_parent, remote_subpath, name);
            let save_path = path::local_child(local_root, remote_parent, remote_subpath, name);
            match transfer::download_one(remote, &remote_path, &save_path) {
                Ok(bytes) => {
                    summary.bytes_fetched += bytes;
                    summary.files_fetched += 1;
                    println!("fetched '{remote_path}'");
                }
                Err(err) => match err.into_fatal() {
                    Ok(fatal) => return Err(Error::new(fatal, summary)),
                    Err(err) => {
                        summary.failures += 1;
                        eprintln!("cannot fetch '{remote_path}': {err}");
                    }
                },
            }
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils;

    #[test]
    fn flat_directory_mirrors_every_file() -> anyhow::Result<()> {
        let tmp_dir = testutils::create_temp_dir()?;
        let mut remote = testutils::FakeRemote::new();
        remote.add_dir("pub");
        remote.add_file("pub/a.txt", b"a");
        remote.add_file("pub/b.txt", b"bb");
        let summary = download_tree(&mut remote, "pub", "", &tmp_dir)
            .expect("download of a healthy tree must succeed");
        assert_eq!(summary.files_fetched, 2);
        assert_eq!(summary.bytes_fetched, 3);
        assert_eq!(summary.failures, 0);
        assert_eq!(std::fs::read(tmp_dir.join("pub").join("a.txt"))?, b"a");
        assert_eq!(std::fs::read(tmp_dir.join("pub").join("b.txt"))?, b"bb");
        Ok(())
    }

    #[test]
    fn nested_tree_is_walked_pre_order() -> anyhow::Result<()> {
        let tmp_dir = testutils::create_temp_dir()?;
        let mut remote = testutils::FakeRemote::new();
        remote.add_dir("pub");
        remote.add_file("pub/0.txt", b"0");
        remote.add_dir("pub/sub");
        remote.add_file("pub/sub/1.txt", b"1");
        let summary = download_tree(&mut remote, "pub", "", &tmp_dir)
            .expect("download of a healthy tree must succeed");
        assert_eq!(summary.files_fetched, 2);
        assert_eq!(summary.directories_created, 1);
        assert_eq!(std::fs::read(tmp_dir.join("pub").join("sub").join("1.txt"))?, b"1");
        // parent listed before the subdirectory, subdirectory listed before
        // its file is fetched
        let calls = remote.calls.clone();
        let list_parent = testutils::call_index(&calls, "list pub");
        let list_sub = testutils::call_index(&calls, "list pub/sub");
        let fetch_nested = testutils::call_index(&calls, "fetch pub/sub/1.txt");
        assert!(list_parent < list_sub);
        assert!(list_sub < fetch_nested);
        Ok(())
    }

    #[test]
    fn dot_entries_are_never_recursed() -> anyhow::Result<()> {
        let tmp_dir = testutils::create_temp_dir()?;
        let mut remote = testutils::FakeRemote::new();
        remote.dot_entries = true;
        remote.add_dir("pub");
        remote.add_dir("pub/sub");
        remote.add_file("pub/sub/1.txt", b"1");
        let summary = download_tree(&mut remote, "pub", "", &tmp_dir)
            .expect("walk over dot markers must terminate");
        assert_eq!(summary.files_fetched, 1);
        assert!(remote.calls.iter().all(|call| !call.contains("/.")));
        Ok(())
    }

    #[test]
    fn listing_failure_is_contained_to_the_branch() -> anyhow::Result<()> {
        let tmp_dir = testutils::create_temp_dir()?;
        let mut remote = testutils::FakeRemote::new();
        remote.add_dir("pub");
        remote.add_dir("pub/broken");
        remote.add_file("pub/z.txt", b"z");
        remote.fail_paths.insert("pub/broken".to_string());
        let summary = download_tree(&mut remote, "pub", "", &tmp_dir)
            .expect("a refused listing must not abort the walk");
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.files_fetched, 1);
        assert_eq!(std::fs::read(tmp_dir.join("pub").join("z.txt"))?, b"z");
        Ok(())
    }

    #[test]
    fn disconnect_aborts_with_partial_summary() -> anyhow::Result<()> {
        let tmp_dir = testutils::create_temp_dir()?;
        let mut remote = testutils::FakeRemote::new();
        remote.add_dir("pub");
        remote.add_file("pub/a.txt", b"a");
        remote.add_file("pub/b.txt", b"b");
        remote.disconnect_paths.insert("pub/b.txt".to_string());
        let error = download_tree(&mut remote, "pub", "", &tmp_dir)
            .expect_err("a lost session must abort the walk");
        assert!(error.source.is_fatal());
        assert_eq!(error.summary.files_fetched, 1);
        Ok(())
    }

    #[test]
    fn empty_listing_is_a_leaf() -> anyhow::Result<()> {
        let tmp_dir = testutils::create_temp_dir()?;
        let mut remote = testutils::FakeRemote::new();
        remote.add_dir("pub");
        let summary = download_tree(&mut remote, "pub", "", &tmp_dir)
            .expect("an empty directory is a normal leaf");
        assert_eq!(summary.files_fetched, 0);
        assert_eq!(summary.failures, 0);
        Ok(())
    }
}
