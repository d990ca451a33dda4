//! Error enum
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Serde(serde_json::Error),
    Http(reqwest::Error),
    /// The generation call did not answer within the configured timeout.
    Timeout,
    /// Non-success HTTP status returned by the generation API.
    Api {
        status: u16,
        body: String,
    },
    Glob(glob::GlobError),
    GlobPattern(glob::PatternError),
    /// Coverage was queried or updated for a document that was never passed to `start_tracking`.
    UntrackedDocument(PathBuf),
    InvalidConfig(String),
    Custom(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Serde(e) => write!(f, "json error: {}", e),
            Error::Http(e) => write!(f, "http error: {}", e),
            Error::Timeout => write!(f, "generation request timed out"),
            Error::Api { status, body } => write!(f, "api error ({}): {}", status, body),
            Error::Glob(e) => write!(f, "glob error: {}", e),
            Error::GlobPattern(e) => write!(f, "glob pattern error: {}", e),
            Error::UntrackedDocument(p) => write!(f, "document {:?} is not tracked", p),
            Error::InvalidConfig(s) => write!(f, "invalid configuration: {}", s),
            Error::Custom(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Serde(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout
        } else {
            Error::Http(e)
        }
    }
}

impl From<glob::GlobError> for Error {
    fn from(e: glob::GlobError) -> Error {
        Error::Glob(e)
    }
}

impl From<glob::PatternError> for Error {
    fn from(e: glob::PatternError) -> Error {
        Error::GlobPattern(e)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}
