//! Remote adapter errors

use thiserror::Error;

/// A remote fetch failed as a whole
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Credentials were rejected; the user has to enter them again
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Network trouble, timeouts, rate limits or server errors. Not retried here.
    #[error("Remote service unavailable: {0}")]
    Transient(String),
}

impl RemoteError {
    /// True for rejected credentials
    pub fn is_auth(&self) -> bool {
        matches!(self, RemoteError::Auth(_))
    }

    /// True for failures worth trying again later
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteError::Transient(_))
    }
}

/// A timestamp or timezone could not be understood
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// The text is not a supported timestamp format
    #[error("Unparseable timestamp '{value}': {reason}")]
    Unparseable {
        /// Text as received
        value: String,
        /// Parser message
        reason: String,
    },

    /// Not an IANA zone name
    #[error("Unknown timezone: {0}")]
    UnknownZone(String),
}

/// Reading a lookup table override file failed
#[derive(Error, Debug)]
pub enum LookupError {
    /// The file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a valid override table
    #[error("Invalid lookup table file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Reading a leaderboard snapshot failed
#[derive(Error, Debug)]
pub enum LeaderboardError {
    /// The file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The header lacks a required column
    #[error("Leaderboard snapshot is missing column '{0}'")]
    MissingColumn(&'static str),

    /// No header line
    #[error("Leaderboard snapshot is empty")]
    Empty,
}
