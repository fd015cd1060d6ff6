//! Error taxonomy shared by every pipeline stage

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EpgError>;

#[derive(Error, Debug)]
pub enum EpgError {
    /// Network or HTTP status failure while fetching a resource.
    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    /// A network request or page wait ran past its deadline.
    #[error("Timed out: {what}")]
    Timeout { what: String },

    #[error("Gzip decompression failed: {0}")]
    Decompression(String),

    /// Malformed XML in a feed document.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// Input is well-formed but does not carry the fields we need.
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    /// Failure inside the page automation layer itself.
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("XMLTV serialization failed: {0}")]
    Serialize(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
}

impl EpgError {
    pub fn fetch(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn timeout(what: impl Into<String>) -> Self {
        Self::Timeout { what: what.into() }
    }

    pub fn navigation(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Navigation {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
