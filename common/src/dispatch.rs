//! Command dispatcher: consumes the ordered token stream and turns each verb
//! into a remote call or a tree walk.

use crate::download;
use crate::remote::{RemoteError, RemoteFs};
use crate::remove;
use crate::transfer;
use crate::upload;

const SUPPORTED: &str =
    "ls, cd <dir>, delete <file>, get <path>, put <local> [remote], mkdir <dir>, rmdir <dir>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Ls,
    Cd,
    Delete,
    Get,
    Put,
    Mkdir,
    Rmdir,
}

impl Verb {
    /// Verb matching is case-insensitive.
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "ls" => Some(Verb::Ls),
            "cd" => Some(Verb::Cd),
            "delete" => Some(Verb::Delete),
            "get" => Some(Verb::Get),
            "put" => Some(Verb::Put),
            "mkdir" => Some(Verb::Mkdir),
            "rmdir" => Some(Verb::Rmdir),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Verb::Ls => "ls",
            Verb::Cd => "cd",
            Verb::Delete => "delete",
            Verb::Get => "get",
            Verb::Put => "put",
            Verb::Mkdir => "mkdir",
            Verb::Rmdir => "rmdir",
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Explicit cursor over the token stream. Running out of tokens while a verb
/// still needs arguments is a typed error, not an index fault.
pub struct TokenCursor<'a> {
    tokens: &'a [String],
    next: usize,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: &'a [String]) -> Self {
        Self { tokens, next: 0 }
    }

    pub fn take_next(&mut self) -> Option<&'a str> {
        let token = self.tokens.get(self.next)?;
        self.next += 1;
        Some(token)
    }

    pub fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.next).map(String::as_str)
    }

    /// The next token, or the argument-count error for `verb`.
    pub fn demand(&mut self, verb: Verb) -> Result<&'a str, DispatchError> {
        self.take_next()
            .ok_or(DispatchError::MissingArgument { verb: verb.name() })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The token stream ran out before the verb's required arguments; the
    /// remaining command stream is abandoned.
    #[error("command '{verb}' needs an additional parameter")]
    MissingArgument { verb: &'static str },
    /// The session failed underneath the command stream.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

#[derive(Copy, Clone, Debug, Default)]
pub struct Summary {
    pub commands_run: usize,
    /// Failures of whole commands (cd refused, delete refused, get target
    /// not found). Per-entry failures inside walks are counted in the walk
    /// summaries below.
    pub command_failures: usize,
    pub download: download::Summary,
    pub upload: upload::Summary,
    pub remove: remove::Summary,
}

impl Summary {
    /// Every per-entry and per-command failure observed. These are reported
    /// but deliberately do not affect the process exit code.
    pub fn total_failures(&self) -> usize {
        self.command_failures
            + self.download.failures
            + self.upload.failures
            + self.remove.failures
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "commands run: {}\n{}\n{}\n{}\ntotal failures: {}",
            self.commands_run,
            self.download,
            self.upload,
            self.remove,
            self.total_failures(),
        )
    }
}

/// Run the command stream left to right until it is exhausted.
///
/// Per-command and per-entry failures are reported and the loop continues;
/// a missing argument or a lost session aborts the remaining commands.
/// `local_root` anchors where single-file `get` saves its result.
pub fn dispatch(
    remote: &mut dyn RemoteFs,
    local_root: &std::path::Path,
    tokens: &[String],
) -> Result<Summary, DispatchError> {
    let mut cursor = TokenCursor::new(tokens);
    let mut summary = Summary::default();
    while let Some(token) = cursor.take_next() {
        let Some(verb) = Verb::parse(token) else {
            eprintln!("unknown command '{token}'; supported commands: {SUPPORTED}");
            continue;
        };
        tracing::debug!("dispatching '{}'", verb);
        summary.commands_run += 1;
        match verb {
            Verb::Ls => run_ls(remote, &mut summary)?,
            Verb::Cd => run_cd(remote, cursor.demand(verb)?, &mut summary)?,
            Verb::Delete => run_delete(remote, cursor.demand(verb)?, &mut summary)?,
            Verb::Get => run_get(remote, local_root, cursor.demand(verb)?, &mut summary)?,
            Verb::Put => run_put(remote, &mut cursor, &mut summary)?,
            Verb::Mkdir => run_mkdir(remote, cursor.demand(verb)?, &mut summary)?,
            Verb::Rmdir => run_rmdir(remote, cursor.demand(verb)?, &mut summary)?,
        }
    }
    Ok(summary)
}

/// Per-command failure bookkeeping: fatal errors abort the stream, anything
/// else is reported and the loop moves on.
fn note_failure(
    summary: &mut Summary,
    err: RemoteError,
    context: &str,
) -> Result<(), DispatchError> {
    if err.is_fatal() {
        return Err(err.into());
    }
    summary.command_failures += 1;
    eprintln!("{context}: {err}");
    Ok(())
}

fn run_ls(remote: &mut dyn RemoteFs, summary: &mut Summary) -> Result<(), DispatchError> {
    match remote.name_list() {
        Ok(names) => {
            for name in names {
                println!("{name}");
            }
            Ok(())
        }
        Err(err) => note_failure(summary, err, "cannot list the current directory"),
    }
}

fn run_cd(
    remote: &mut dyn RemoteFs,
    dir: &str,
    summary: &mut Summary,
) -> Result<(), DispatchError> {
    let result = if dir == ".." {
        remote.change_to_parent()
    } else {
        remote.change_dir(dir)
    };
    match result {
        Ok(()) => {
            println!("changed directory to '{dir}'");
            Ok(())
        }
        Err(err) => note_failure(summary, err, &format!("cannot change directory to '{dir}'")),
    }
}

fn run_delete(
    remote: &mut dyn RemoteFs,
    name: &str,
    summary: &mut Summary,
) -> Result<(), DispatchError> {
    match remote.delete_file(name) {
        Ok(()) => {
            println!("deleted '{name}'");
            Ok(())
        }
        Err(err) => note_failure(summary, err, &format!("cannot delete '{name}'")),
    }
}

fn run_mkdir(
    remote: &mut dyn RemoteFs,
    dir: &str,
    summary: &mut Summary,
) -> Result<(), DispatchError> {
    match remote.make_dir(dir) {
        Ok(()) => {
            println!("created remote directory '{dir}'");
            Ok(())
        }
        Err(err) => note_failure(summary, err, &format!("cannot create remote directory '{dir}'")),
    }
}

fn run_rmdir(
    remote: &mut dyn RemoteFs,
    dir: &str,
    summary: &mut Summary,
) -> Result<(), DispatchError> {
    match remove::remove_tree(remote, dir, "") {
        Ok(remove_summary) => {
            summary.remove = summary.remove + remove_summary;
            Ok(())
        }
        Err(err) => {
            summary.remove = summary.remove + err.summary;
            Err(DispatchError::Remote(err.source))
        }
    }
}

/// `get` owns the single-object vs. directory decision: the path is resolved
/// through a listing call, not a name list.
fn run_get(
    remote: &mut dyn RemoteFs,
    local_root: &std::path::Path,
    remote_path: &str,
    summary: &mut Summary,
) -> Result<(), DispatchError> {
    let entries = match remote.list(remote_path) {
        Ok(entries) => entries,
        Err(err) => return note_failure(summary, err, &format!("cannot list '{remote_path}'")),
    };
    match entries.as_slice() {
        [] => {
            summary.command_failures += 1;
            eprintln!("get: '{remote_path}' not found");
            Ok(())
        }
        [single] if single.is_file() => {
            let save_path = local_root.join(single.base_name());
            match transfer::download_one(remote, remote_path, &save_path) {
                Ok(bytes) => {
                    summary.download.bytes_fetched += bytes;
                    summary.download.files_fetched += 1;
                    println!("fetched '{remote_path}'");
                    Ok(())
                }
                Err(err) => match err.into_fatal() {
                    Ok(fatal) => Err(DispatchError::Remote(fatal)),
                    Err(err) => {
                        summary.download.failures += 1;
                        eprintln!("cannot fetch '{remote_path}': {err}");
                        Ok(())
                    }
                },
            }
        }
        // one directory entry, or several entries: the path names a directory
        _ => match download::download_tree(remote, remote_path, "", local_root) {
            Ok(download_summary) => {
                summary.download = summary.download + download_summary;
                Ok(())
            }
            Err(err) => {
                summary.download = summary.download + err.summary;
                Err(DispatchError::Remote(err.source))
            }
        },
    }
}

/// `put` uploads a directory tree (explicit remote root required) or a single
/// file (remote name optional, derived from the local basename when the next
/// token is a verb or the stream is exhausted).
fn run_put(
    remote: &mut dyn RemoteFs,
    cursor: &mut TokenCursor,
    summary: &mut Summary,
) -> Result<(), DispatchError> {
    let local = cursor.demand(Verb::Put)?;
    let local_path = std::path::Path::new(local);
    if local_path.is_dir() {
        let remote_root = cursor.demand(Verb::Put)?;
        match upload::upload_tree(remote, remote_root, local_path, "") {
            Ok(upload_summary) => {
                summary.upload = summary.upload + upload_summary;
                Ok(())
            }
            Err(err) => {
                summary.upload = summary.upload + err.summary;
                Err(DispatchError::Remote(err.source))
            }
        }
    } else {
        let explicit = cursor.peek().filter(|token| Verb::parse(token).is_none());
        let remote_name = match explicit {
            Some(token) => {
                let _ = cursor.take_next();
                token.to_string()
            }
            None => match local_path.file_name() {
                Some(name) => name.to_string_lossy().into_owned(),
                None => {
                    summary.command_failures += 1;
                    eprintln!("put: '{local}' has no file name");
                    return Ok(());
                }
            },
        };
        match transfer::upload_one(remote, &remote_name, local_path) {
            Ok(bytes) => {
                summary.upload.bytes_sent += bytes;
                summary.upload.files_sent += 1;
                println!("sent '{local}' as '{remote_name}'");
                Ok(())
            }
            Err(err) => match err.into_fatal() {
                Ok(fatal) => Err(DispatchError::Remote(fatal)),
                Err(err) => {
                    summary.upload.failures += 1;
                    eprintln!("cannot send '{local}': {err}");
                    Ok(())
                }
            },
        }
    }
}
