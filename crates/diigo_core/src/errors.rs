use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification used by callers to pick an exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    Network,
    Api,
    File,
    Other,
}

#[derive(Debug, Error)]
pub enum DiigoError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("could not obtain credentials: {0}")]
    Credentials(String),
    /// Always wraps an error stripped of its URL, which carries the API key.
    #[error("network request failed")]
    Network(#[source] reqwest::Error),
    #[error("Diigo API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    #[error("unexpected API response: {0}")]
    InvalidResponse(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("file operation failed on {}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("CSV serialization failed")]
    Csv(#[from] csv::Error),
    #[error("encoding conversion failed: {0}")]
    Encoding(String),
}

impl DiigoError {
    pub fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        DiigoError::File {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DiigoError::Auth(_) | DiigoError::Credentials(_) => ErrorKind::Auth,
            DiigoError::Network(_) => ErrorKind::Network,
            DiigoError::Api { .. } | DiigoError::InvalidResponse(_) => ErrorKind::Api,
            DiigoError::File { .. } | DiigoError::Csv(_) | DiigoError::Encoding(_) => {
                ErrorKind::File
            }
            DiigoError::Config(_) => ErrorKind::Other,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Core(#[from] DiigoError),
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: DiigoError,
    },
}

impl ExportError {
    pub fn context<T: Into<String>>(self, message: T) -> Self {
        let message = message.into();
        match self {
            ExportError::Core(source) => ExportError::Context { message, source },
            ExportError::Context {
                message: existing,
                source,
            } => ExportError::Context {
                message: format!("{message}: {existing}"),
                source,
            },
        }
    }

    pub fn core(&self) -> &DiigoError {
        match self {
            ExportError::Core(err) => err,
            ExportError::Context { source, .. } => source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.core().kind()
    }
}
