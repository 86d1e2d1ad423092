//! Race Records
//!
//! The canonical [`RaceResult`] shape every source maps into, plus the
//! backward-compatible decoding rules used when reading persisted ledgers.
//!
//! Records are plain values: the ledger copies them in and out, and a record
//! never changes once it has been inserted.

mod error;
mod schema;

pub use error::SchemaError;
pub use schema::{decode, encode, REMOTE_KEYS};

/// A single race result
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RaceResult {
    /// Car identifier (free text for manual entries, resolved name for remote ones)
    pub car_model: String,

    /// Number of incidents, defaults to 0
    pub incidents_count: u32,

    /// Finishing position for manually entered results.
    ///
    /// `None` when unknown. Remote results carry their positions in
    /// [`RemoteDetails`] instead.
    pub position_in_race: Option<u32>,

    /// Track name, defaults to an empty string
    pub track_name: String,

    /// Extended fields, present only for results imported from the remote service
    pub remote: Option<RemoteDetails>,
}

/// Extended fields carried by remotely sourced results.
///
/// Every field has a concrete default (empty string or zero) so display code
/// never has to deal with missing values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteDetails {
    /// Series display name, [`UNKNOWN`](crate::remote::UNKNOWN) for unknown codes
    pub series_name: String,
    /// Grid position, 1-based
    pub start_position: u32,
    /// Finishing position, 1-based
    pub finish_position: u32,
    /// Championship points scored
    pub points: u32,
    /// Strength of field rating
    pub strength_of_field: u32,
    /// Skill rating before the race (the service reports -1 when unrated)
    pub oldi_rating: i32,
    /// Skill rating after the race
    pub newi_rating: i32,
    /// Laps led
    pub laps_led: u32,
    /// Raw car code as reported by the service
    pub car_id: u32,
    /// Session start in the display timezone, empty when unknown
    pub session_start: String,
}

impl RaceResult {
    /// Build a validated, user-entered result.
    ///
    /// Car and track must not be blank. A position of `0` is rejected; use
    /// `None` when the position is not known.
    pub fn manual(
        car_model: impl Into<String>,
        incidents_count: u32,
        position_in_race: Option<u32>,
        track_name: impl Into<String>,
    ) -> Result<Self, SchemaError> {
        let car_model = car_model.into().trim().to_string();
        let track_name = track_name.into().trim().to_string();

        if car_model.is_empty() {
            return Err(SchemaError::MissingField("car_model"));
        }
        if track_name.is_empty() {
            return Err(SchemaError::MissingField("track_name"));
        }
        if position_in_race == Some(0) {
            return Err(SchemaError::OutOfRange {
                field: "position_in_race",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            car_model,
            incidents_count,
            position_in_race,
            track_name,
            remote: None,
        })
    }

    /// Whether this result was imported from the remote service
    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Trim text fields and fold a zero position into "unknown".
    pub(crate) fn normalized(mut self) -> Self {
        let trimmed = self.car_model.trim();
        if trimmed.len() != self.car_model.len() {
            self.car_model = trimmed.to_string();
        }
        let trimmed = self.track_name.trim();
        if trimmed.len() != self.track_name.len() {
            self.track_name = trimmed.to_string();
        }
        if self.position_in_race == Some(0) {
            self.position_in_race = None;
        }
        self
    }
}

/// Scratch fields for a result that is still being entered.
///
/// The first revision of the document format stored these at the top level
/// of the file, next to the history; they are kept so old files load
/// without losing the half-finished entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PendingEntry {
    /// Car entered so far
    pub car_model: Option<String>,
    /// Incidents entered so far
    pub incidents_count: Option<u32>,
    /// Finishing position entered so far
    pub position_in_race: Option<u32>,
    /// Track entered so far
    pub track_name: Option<String>,
}

impl PendingEntry {
    /// True when no field has been filled in
    pub fn is_empty(&self) -> bool {
        self.car_model.is_none()
            && self.incidents_count.is_none()
            && self.position_in_race.is_none()
            && self.track_name.is_none()
    }

    /// Turn the scratch fields into a validated result
    pub fn to_record(&self) -> Result<RaceResult, SchemaError> {
        RaceResult::manual(
            self.car_model.clone().unwrap_or_default(),
            self.incidents_count.unwrap_or(0),
            self.position_in_race,
            self.track_name.clone().unwrap_or_default(),
        )
    }
}
