//! Single-entry transfers: exactly one remote object moved per call.

use std::io::Write;

use crate::remote::{RemoteError, RemoteFs};

/// Failure of a single-entry transfer. Local I/O trouble is scoped to the
/// entry just like a server refusal; only a lost session aborts the walk.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("local i/o: {0}")]
    Local(#[from] std::io::Error),
}

impl TransferError {
    pub fn is_fatal(&self) -> bool {
        match self {
            TransferError::Remote(err) => err.is_fatal(),
            TransferError::Local(_) => false,
        }
    }

    /// The fatal remote error, if that is what this is.
    pub fn into_fatal(self) -> Result<RemoteError, TransferError> {
        match self {
            TransferError::Remote(err) if err.is_fatal() => Ok(err),
            other => Err(other),
        }
    }
}

/// Fetch one remote file into `save_path`, creating the parent directory
/// first if it is absent. The write stream is dropped on every exit path.
pub fn download_one(
    remote: &mut dyn RemoteFs,
    remote_path: &str,
    save_path: &std::path::Path,
) -> Result<u64, TransferError> {
    tracing::debug!("fetch {:?} -> {:?}", remote_path, save_path);
    let parent = save_path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(save_path)?;
    let mut writer = std::io::BufWriter::new(file);
    let bytes = remote.fetch(remote_path, &mut writer)?;
    writer.flush()?;
    Ok(bytes)
}

/// Store one local file as `remote_path`. The read stream is dropped on
/// every exit path.
pub fn upload_one(
    remote: &mut dyn RemoteFs,
    remote_path: &str,
    local_path: &std::path::Path,
) -> Result<u64, TransferError> {
    tracing::debug!("store {:?} -> {:?}", local_path, remote_path);
    let file = std::fs::File::open(local_path)?;
    let mut reader = std::io::BufReader::new(file);
    let bytes = remote.store(remote_path, &mut reader)?;
    Ok(bytes)
}
