//! The live FTP session: connect/login lifecycle plus the
//! [`RemoteFs`] operations the engine issues against it.

use std::io::{Read, Write};

use common::progress::TransferObserver;
use common::remote::{RemoteEntry, RemoteError, RemoteFs, RemoteResult};
use suppaftp::types::{FileType, FormatControl};
use suppaftp::{FtpError, FtpStream, Mode};

const CHUNK_SIZE: usize = 32 * 1024;

/// Session-lifecycle failure: everything here is fatal for the whole run.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("cannot connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: FtpError,
    },
    #[error("login rejected for user '{user}': {source}")]
    Auth {
        user: String,
        #[source]
        source: FtpError,
    },
    #[error(transparent)]
    Protocol(#[from] FtpError),
}

/// Severity mapping for per-operation protocol errors: losing the control or
/// data connection is fatal, everything else is a refusal scoped to the one
/// operation.
fn remote_error(err: FtpError) -> RemoteError {
    match err {
        FtpError::ConnectionError(source) => RemoteError::Disconnected(source.to_string()),
        FtpError::BadResponse => RemoteError::Disconnected("malformed server response".to_string()),
        other => RemoteError::Failed(other.to_string()),
    }
}

/// A connected FTP control session. Holds the transfer-mode and data-channel
/// state server-side; the engine only ever sees the [`RemoteFs`] operations.
pub struct FtpSession {
    stream: FtpStream,
    observer: Option<Box<dyn TransferObserver>>,
}

impl FtpSession {
    pub fn connect(host: &str, port: u16) -> Result<Self, SessionError> {
        let addr = format!("{host}:{port}");
        tracing::debug!("connecting to {}", &addr);
        let stream = FtpStream::connect(addr.as_str()).map_err(|source| SessionError::Connect {
            addr: addr.clone(),
            source,
        })?;
        Ok(Self {
            stream,
            observer: None,
        })
    }

    /// The server's greeting, when it sent one.
    pub fn welcome(&self) -> Option<&str> {
        self.stream.get_welcome_msg()
    }

    pub fn login(&mut self, user: &str, password: &str) -> Result<(), SessionError> {
        self.stream
            .login(user, password)
            .map_err(|source| SessionError::Auth {
                user: user.to_string(),
                source,
            })
    }

    /// Binary transfers unless the caller asked for ASCII. Set once per
    /// session; never toggled per call.
    pub fn set_transfer_mode(&mut self, binary: bool) -> Result<(), SessionError> {
        let file_type = if binary {
            FileType::Binary
        } else {
            FileType::Ascii(FormatControl::Default)
        };
        Ok(self.stream.transfer_type(file_type)?)
    }

    /// Passive data channels by default; most clients sit behind firewalls.
    pub fn set_channel_mode(&mut self, active: bool) {
        self.stream.set_mode(if active { Mode::Active } else { Mode::Passive });
    }

    pub fn observe_transfers(&mut self, observer: Box<dyn TransferObserver>) {
        self.observer = Some(observer);
    }

    /// Best-effort logout, attempted on every exit path; a failure here is
    /// only worth a debug line.
    pub fn quit(&mut self) {
        if let Err(err) = self.stream.quit() {
            tracing::debug!("quit failed: {}", err);
        }
    }

    fn notify(&mut self, count: u64) {
        if let Some(observer) = self.observer.as_mut() {
            observer.bytes_transferred(count);
        }
    }
}

impl RemoteFs for FtpSession {
    fn list(&mut self, path: &str) -> RemoteResult<Vec<RemoteEntry>> {
        let target = if path.is_empty() { None } else { Some(path) };
        let lines = self.stream.list(target).map_err(remote_error)?;
        let mut entries = Vec::with_capacity(lines.len());
        for line in &lines {
            match suppaftp::list::File::try_from(line.as_str()) {
                Ok(file) => {
                    let entry = if file.is_directory() {
                        RemoteEntry::directory(file.name())
                    } else {
                        RemoteEntry::file(file.name(), file.size() as u64)
                    };
                    entries.push(entry);
                }
                Err(err) => {
                    tracing::debug!("skipping unparseable listing line {:?}: {}", line, err);
                }
            }
        }
        Ok(entries)
    }

    fn name_list(&mut self) -> RemoteResult<Vec<String>> {
        self.stream.nlst(None).map_err(remote_error)
    }

    fn change_dir(&mut self, path: &str) -> RemoteResult<()> {
        self.stream.cwd(path).map_err(remote_error)
    }

    fn change_to_parent(&mut self) -> RemoteResult<()> {
        self.stream.cdup().map_err(remote_error)
    }

    fn fetch(&mut self, remote_path: &str, dest: &mut dyn Write) -> RemoteResult<u64> {
        let mut data_stream = self.stream.retr_as_stream(remote_path).map_err(remote_error)?;
        let mut buf = [0u8; CHUNK_SIZE];
        let mut total = 0u64;
        loop {
            let read = match data_stream.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) => return Err(RemoteError::Disconnected(err.to_string())),
            };
            if let Err(write_err) = dest.write_all(&buf[..read]) {
                // drain the data channel so the control connection stays
                // usable for the rest of the walk
                while matches!(data_stream.read(&mut buf), Ok(n) if n > 0) {}
                self.stream
                    .finalize_retr_stream(data_stream)
                    .map_err(remote_error)?;
                return Err(RemoteError::Failed(format!("local write failed: {write_err}")));
            }
            total += read as u64;
            self.notify(read as u64);
        }
        self.stream
            .finalize_retr_stream(data_stream)
            .map_err(remote_error)?;
        Ok(total)
    }

    fn store(&mut self, remote_path: &str, src: &mut dyn Read) -> RemoteResult<u64> {
        let mut data_stream = self.stream.put_with_stream(remote_path).map_err(remote_error)?;
        let mut buf = [0u8; CHUNK_SIZE];
        let mut total = 0u64;
        loop {
            let read = match src.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) => {
                    self.stream
                        .finalize_put_stream(data_stream)
                        .map_err(remote_error)?;
                    return Err(RemoteError::Failed(format!("local read failed: {err}")));
                }
            };
            if let Err(err) = data_stream.write_all(&buf[..read]) {
                return Err(RemoteError::Disconnected(err.to_string()));
            }
            total += read as u64;
            self.notify(read as u64);
        }
        self.stream
            .finalize_put_stream(data_stream)
            .map_err(remote_error)?;
        Ok(total)
    }

    fn make_dir(&mut self, path: &str) -> RemoteResult<()> {
        self.stream.mkdir(path).map_err(remote_error)
    }

    fn remove_dir(&mut self, path: &str) -> RemoteResult<()> {
        self.stream.rmdir(path).map_err(remote_error)
    }

    fn delete_file(&mut self, path: &str) -> RemoteResult<()> {
        self.stream.rm(path).map_err(remote_error)
    }
}
