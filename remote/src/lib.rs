//! FTP session plumbing for the rftp tools: the concrete
//! [`common::remote::RemoteFs`] implementation and the pieces of session
//! identity the binary needs before a connection exists.

mod session;

pub use session::{FtpSession, SessionError};

/// Login identity in the `user:password` command-line form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
#[error("credentials must have the form user:password")]
pub struct CredentialsError;

impl std::str::FromStr for Credentials {
    type Err = CredentialsError;

    /// Split on the first colon only; FTP passwords may themselves contain
    /// colons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (user, password) = s.split_once(':').ok_or(CredentialsError)?;
        if user.is_empty() {
            return Err(CredentialsError);
        }
        Ok(Self {
            user: user.to_string(),
            password: password.to_string(),
        })
    }
}
