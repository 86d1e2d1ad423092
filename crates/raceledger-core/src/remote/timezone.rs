//! Display timezone conversion
//!
//! The remote service reports UTC-offset-qualified timestamps. Everything
//! shown to the user is converted to one fixed display zone, by default
//! `Europe/Warsaw` (UTC+1, UTC+2 in summer).

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;

use super::TimestampError;

/// Default display zone
pub const DEFAULT_DISPLAY_ZONE: &str = "Europe/Warsaw";

/// Format of every displayed timestamp
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accepted in addition to RFC 3339: `+0000` style offsets without a colon
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"];

/// Zone that timestamps are displayed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayZone {
    tz: Tz,
}

impl DisplayZone {
    /// Display in `tz`
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Look up a zone by IANA name (e.g. `Europe/Warsaw`)
    pub fn from_name(name: &str) -> Result<Self, TimestampError> {
        name.trim()
            .parse::<Tz>()
            .map(Self::new)
            .map_err(|e| TimestampError::UnknownZone(format!("{} ({})", name, e)))
    }

    /// The underlying zone
    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Parse an offset-qualified timestamp
    pub fn parse(value: &str) -> Result<DateTime<FixedOffset>, TimestampError> {
        let value = value.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
            return Ok(parsed);
        }

        let mut last_err = None;
        for format in OFFSET_FORMATS {
            match DateTime::parse_from_str(value, format) {
                Ok(parsed) => return Ok(parsed),
                Err(e) => last_err = Some(e),
            }
        }

        Err(TimestampError::Unparseable {
            value: value.to_string(),
            reason: last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "empty timestamp".to_string()),
        })
    }

    /// Parse and convert into the display zone
    pub fn convert(&self, value: &str) -> Result<DateTime<Tz>, TimestampError> {
        Ok(Self::parse(value)?.with_timezone(&self.tz))
    }

    /// Parse, convert and format for display
    pub fn format(&self, value: &str) -> Result<String, TimestampError> {
        Ok(self.convert(value)?.format(DISPLAY_FORMAT).to_string())
    }

    /// Current wall-clock time in the display zone
    pub fn now_string(&self) -> String {
        Utc::now()
            .with_timezone(&self.tz)
            .format(DISPLAY_FORMAT)
            .to_string()
    }
}

impl Default for DisplayZone {
    fn default() -> Self {
        Self::new(chrono_tz::Europe::Warsaw)
    }
}
