// SPDX-License-Identifier: GPL-3.0-only

use places_contracts::{ProviderError, ProviderErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GvfsError {
    #[error("gio command line tool not found")]
    GioNotFound,

    #[error("{command} failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("volume {0} has no activation root")]
    NotActivatable(String),

    #[error("background task failed: {0}")]
    Task(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<GvfsError> for ProviderError {
    fn from(error: GvfsError) -> Self {
        let kind = match &error {
            GvfsError::GioNotFound => ProviderErrorKind::Unavailable,
            GvfsError::NotActivatable(_) => ProviderErrorKind::Unsupported,
            GvfsError::CommandFailed { message, .. } if message.contains("not mounted") => {
                ProviderErrorKind::NotFound
            }
            GvfsError::CommandFailed { message, .. } if message.contains("busy") => {
                ProviderErrorKind::Busy
            }
            GvfsError::CommandFailed { .. } | GvfsError::Task(_) | GvfsError::Io(_) => {
                ProviderErrorKind::Internal
            }
        };
        ProviderError::new(kind, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gio_messages_classify_failures() {
        let error: ProviderError = GvfsError::CommandFailed {
            command: "gio mount -u smb://nas/media/".to_string(),
            message: "gio: smb://nas/media/: The specified location is not mounted".to_string(),
        }
        .into();
        assert_eq!(error.kind, ProviderErrorKind::NotFound);

        let error: ProviderError = GvfsError::GioNotFound.into();
        assert_eq!(error.kind, ProviderErrorKind::Unavailable);
    }
}
