//! Settings errors

use thiserror::Error;

use crate::remote::{LookupError, TimestampError};

/// Reading, writing or interpreting settings failed
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The settings file could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file is not valid JSON for [`AppSettings`](super::AppSettings)
    #[error("Invalid settings file: {0}")]
    Parse(#[from] serde_json::Error),

    /// `display_timezone` names no known zone
    #[error(transparent)]
    Timezone(#[from] TimestampError),

    /// The lookup override file is unusable
    #[error("Failed to load lookup overrides: {0}")]
    Lookup(#[from] LookupError),
}
