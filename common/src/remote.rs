//! The remote file service capability consumed by the transfer engine.
//!
//! The engine only ever talks to a [`RemoteFs`]; the concrete FTP session
//! lives in the `remote` crate. Session lifecycle (connect, login, transfer
//! mode, quit) is deliberately not part of this trait - the walk never
//! touches it.

/// Kind of remote entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry returned by a remote directory listing.
#[derive(Debug, Clone)]
pub struct RemoteEntry {
    /// Name of the entry (servers may report a full path; see [`RemoteEntry::base_name`]).
    pub name: String,
    pub kind: EntryKind,
    /// Size in bytes as reported by the server, when it reports one.
    pub size: Option<u64>,
}

impl RemoteEntry {
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            size: Some(size),
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            size: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// The name with any leading path portion stripped. Some servers answer
    /// LIST with full paths; composing child paths from those would double
    /// the parent prefix.
    pub fn base_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Entries named `.` or `..` must never be recursed into or transferred,
    /// otherwise the walk never terminates.
    pub fn is_traversal_marker(&self) -> bool {
        matches!(self.base_name(), "." | "..")
    }
}

/// Failure of a single remote operation.
///
/// The two variants carry the whole error policy: a [`RemoteError::Failed`]
/// is scoped to one entry and the walk continues past it, while a
/// [`RemoteError::Disconnected`] means the session is gone and everything
/// that follows must be abandoned.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RemoteError {
    /// The server refused the operation; the session is still usable.
    #[error("{0}")]
    Failed(String),
    /// The control or data connection is gone; no further commands can run.
    #[error("connection lost: {0}")]
    Disconnected(String),
}

impl RemoteError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, RemoteError::Disconnected(_))
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Operations the engine and dispatcher issue against the remote store.
///
/// All paths are forward-slash separated, relative to the session's current
/// working directory unless absolute. An empty `list` result is a valid
/// answer (empty directory or unknown path), not an error.
pub trait RemoteFs {
    /// Full listing of `path`; `""` lists the current directory.
    fn list(&mut self, path: &str) -> RemoteResult<Vec<RemoteEntry>>;

    /// Bare names in the current directory (the `ls` command).
    fn name_list(&mut self) -> RemoteResult<Vec<String>>;

    fn change_dir(&mut self, path: &str) -> RemoteResult<()>;

    fn change_to_parent(&mut self) -> RemoteResult<()>;

    /// Fetch `remote_path` into `dest`, returning the number of bytes written.
    fn fetch(&mut self, remote_path: &str, dest: &mut dyn std::io::Write) -> RemoteResult<u64>;

    /// Store `src` as `remote_path`, returning the number of bytes sent.
    fn store(&mut self, remote_path: &str, src: &mut dyn std::io::Read) -> RemoteResult<u64>;

    fn make_dir(&mut self, path: &str) -> RemoteResult<()>;

    /// Remove an (empty) remote directory.
    fn remove_dir(&mut self, path: &str) -> RemoteResult<()>;

    fn delete_file(&mut self, path: &str) -> RemoteResult<()>;
}
