use std::io;
use std::path::Path;
use thiserror::Error;
use zip::result::ZipError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Custom(String),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),

    #[error("File name is not valid UTF-8: {0}")]
    InvalidEntryName(String),

    #[error("Invalid ignore pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] ZipError),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl Error {
    pub fn custom<T: Into<String>>(msg: T) -> Self {
        Error::Custom(msg.into())
    }

    /// Attach a path to an IO failure, promoting the common kinds to their own variants
    pub fn io_at(err: io::Error, path: &Path) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Error::PathNotFound(path.display().to_string()),
            io::ErrorKind::PermissionDenied => Error::PermissionDenied(path.display().to_string()),
            _ => Error::Io(err),
        }
    }

    /// Same as [`Error::io_at`] for errors coming out of the zip reader/writer
    pub fn zip_at(err: ZipError, path: &Path) -> Self {
        match err {
            ZipError::Io(err) => Error::io_at(err, path),
            ZipError::InvalidArchive(reason) => {
                Error::CorruptArchive(format!("{}: {}", path.display(), reason))
            }
            other => Error::Zip(other),
        }
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Custom(err.to_string())
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Custom(err)
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::InvalidPattern(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::InvalidConfig(err.to_string())
    }
}

impl From<time::error::ComponentRange> for Error {
    fn from(err: time::error::ComponentRange) -> Self {
        Error::InvalidTimestamp(err.to_string())
    }
}
