//! Test doubles shared by the engine and dispatcher tests: a scripted
//! in-memory remote and local temp-dir helpers.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

use crate::remote::{RemoteEntry, RemoteError, RemoteFs, RemoteResult};

pub fn create_temp_dir() -> anyhow::Result<std::path::PathBuf> {
    let mut idx = 0;
    loop {
        let tmp_dir =
            std::env::temp_dir().join(format!("rftp_test_{}_{idx}", std::process::id()));
        match std::fs::create_dir(&tmp_dir) {
            Ok(()) => return Ok(tmp_dir),
            Err(error) if error.kind() == std::io::ErrorKind::AlreadyExists => idx += 1,
            Err(error) => return Err(error.into()),
        }
    }
}

/// Position of an exact call in a [`FakeRemote`] call log.
pub fn call_index(calls: &[String], expected: &str) -> usize {
    calls
        .iter()
        .position(|call| call == expected)
        .unwrap_or_else(|| panic!("call {expected:?} not found in {calls:?}"))
}

fn parent_of(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((parent, _)) => parent,
        None => "",
    }
}

fn base_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// In-memory remote store implementing [`RemoteFs`].
///
/// Every operation is appended to `calls` (op name + path) so tests can
/// assert call counts and ordering. Paths in `fail_paths` are refused,
/// paths in `disconnect_paths` drop the session; with `dot_entries` set,
/// listings include the `.`/`..` markers real servers return.
#[derive(Debug, Default)]
pub struct FakeRemote {
    dirs: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
    cwd: String,
    pub calls: Vec<String>,
    pub fail_paths: BTreeSet<String>,
    pub disconnect_paths: BTreeSet<String>,
    pub dot_entries: bool,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dir(&mut self, path: &str) {
        self.dirs.insert(path.to_string());
    }

    pub fn add_file(&mut self, path: &str, data: &[u8]) {
        self.files.insert(path.to_string(), data.to_vec());
    }

    pub fn file_contents(&self, path: &str) -> Option<Vec<u8>> {
        self.files.get(path).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty()
    }

    fn check_injected(&self, path: &str) -> RemoteResult<()> {
        if self.disconnect_paths.contains(path) {
            return Err(RemoteError::Disconnected(
                "test: connection dropped".to_string(),
            ));
        }
        if self.fail_paths.contains(path) {
            return Err(RemoteError::Failed("test: refused".to_string()));
        }
        Ok(())
    }

    fn entries_under(&self, path: &str) -> Vec<RemoteEntry> {
        let mut entries = vec![];
        if self.dot_entries {
            entries.push(RemoteEntry::directory("."));
            entries.push(RemoteEntry::directory(".."));
        }
        for dir in &self.dirs {
            if parent_of(dir) == path {
                entries.push(RemoteEntry::directory(base_of(dir)));
            }
        }
        for (file, data) in &self.files {
            if parent_of(file) == path {
                entries.push(RemoteEntry::file(base_of(file), data.len() as u64));
            }
        }
        entries
    }
}

impl RemoteFs for FakeRemote {
    fn list(&mut self, path: &str) -> RemoteResult<Vec<RemoteEntry>> {
        self.calls.push(format!("list {path}"));
        self.check_injected(path)?;
        if let Some(data) = self.files.get(path) {
            return Ok(vec![RemoteEntry::file(base_of(path), data.len() as u64)]);
        }
        if !path.is_empty() && !self.dirs.contains(path) {
            // unknown path: an empty listing, not an error
            return Ok(vec![]);
        }
        Ok(self.entries_under(path))
    }

    fn name_list(&mut self) -> RemoteResult<Vec<String>> {
        self.calls.push("nlst".to_string());
        let cwd = self.cwd.clone();
        self.check_injected(&cwd)?;
        Ok(self
            .entries_under(&cwd)
            .iter()
            .map(|entry| entry.name.clone())
            .collect())
    }

    fn change_dir(&mut self, path: &str) -> RemoteResult<()> {
        self.calls.push(format!("cwd {path}"));
        self.check_injected(path)?;
        if self.dirs.contains(path) {
            self.cwd = path.to_string();
            Ok(())
        } else {
            Err(RemoteError::Failed(format!("no such directory: {path}")))
        }
    }

    fn change_to_parent(&mut self) -> RemoteResult<()> {
        self.calls.push("cdup".to_string());
        self.cwd = parent_of(&self.cwd).to_string();
        Ok(())
    }

    fn fetch(&mut self, remote_path: &str, dest: &mut dyn std::io::Write) -> RemoteResult<u64> {
        self.calls.push(format!("fetch {remote_path}"));
        self.check_injected(remote_path)?;
        let data = self
            .files
            .get(remote_path)
            .ok_or_else(|| RemoteError::Failed(format!("no such file: {remote_path}")))?;
        dest.write_all(data)
            .map_err(|err| RemoteError::Failed(format!("local write failed: {err}")))?;
        Ok(data.len() as u64)
    }

    fn store(&mut self, remote_path: &str, src: &mut dyn Read) -> RemoteResult<u64> {
        self.calls.push(format!("store {remote_path}"));
        self.check_injected(remote_path)?;
        let mut data = vec![];
        src.read_to_end(&mut data)
            .map_err(|err| RemoteError::Failed(format!("local read failed: {err}")))?;
        let len = data.len() as u64;
        self.files.insert(remote_path.to_string(), data);
        Ok(len)
    }

    fn make_dir(&mut self, path: &str) -> RemoteResult<()> {
        self.calls.push(format!("mkdir {path}"));
        self.check_injected(path)?;
        if self.dirs.contains(path) || self.files.contains_key(path) {
            return Err(RemoteError::Failed(format!("already exists: {path}")));
        }
        self.dirs.insert(path.to_string());
        Ok(())
    }

    fn remove_dir(&mut self, path: &str) -> RemoteResult<()> {
        self.calls.push(format!("rmdir {path}"));
        self.check_injected(path)?;
        if !self.dirs.contains(path) {
            return Err(RemoteError::Failed(format!("no such directory: {path}")));
        }
        let occupied = self.dirs.iter().any(|dir| parent_of(dir) == path)
            || self.files.keys().any(|file| parent_of(file) == path);
        if occupied {
            return Err(RemoteError::Failed(format!("directory not empty: {path}")));
        }
        self.dirs.remove(path);
        Ok(())
    }

    fn delete_file(&mut self, path: &str) -> RemoteResult<()> {
        self.calls.push(format!("delete {path}"));
        self.check_injected(path)?;
        if self.files.remove(path).is_some() {
            Ok(())
        } else {
            Err(RemoteError::Failed(format!("no such file: {path}")))
        }
    }
}
