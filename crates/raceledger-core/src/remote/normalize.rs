//! Payload normalization
//!
//! [`StatsAdapter`] turns remote payloads into [`RaceResult`]s and
//! [`UpcomingSession`]s. Payload shapes have drifted between API versions,
//! so every field is looked up tolerantly: nested path first, then the flat
//! key, then a default. Problems with a single entry are collected in the
//! [`FetchReport`] and never fail the whole fetch.

use serde_json::Value;
use std::fmt;
use std::path::Path;

use super::leaderboard::{load_leaderboard, LeaderboardEntry};
use super::{DisplayZone, LeaderboardError, LookupService, LookupTables, RemoteError, StatsApi};
use crate::credentials::Credentials;
use crate::record::{RaceResult, RemoteDetails};

/// Items normalized from one fetch, plus whatever had to be skipped or defaulted
#[derive(Debug, Clone, PartialEq)]
pub struct FetchReport<T> {
    /// Normalized entries, in payload order
    pub items: Vec<T>,
    /// Entries that were skipped or had fields defaulted
    pub issues: Vec<RecordIssue>,
}

impl<T> FetchReport<T> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            issues: Vec::new(),
        }
    }

    /// True when nothing had to be skipped or defaulted
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Problem with one payload entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordIssue {
    /// Position in the payload list; `None` for problems with the payload itself
    pub index: Option<usize>,
    /// What went wrong
    pub message: String,
}

impl RecordIssue {
    fn at(index: usize, message: impl Into<String>) -> Self {
        Self {
            index: Some(index),
            message: message.into(),
        }
    }

    fn payload(message: impl Into<String>) -> Self {
        Self {
            index: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "entry {}: {}", index, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// A scheduled session from the race guide
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingSession {
    /// Raw series code
    pub series_id: u32,
    /// Series display name
    pub series_name: String,
    /// 1-based week of the season
    pub race_week: u32,
    /// Display-zone start time
    pub start: String,
    /// Display-zone end time; empty when the payload had none
    pub end: String,
    /// Drivers registered so far
    pub entry_count: u32,
}

/// Fetches through a [`StatsApi`] and normalizes the payloads
pub struct StatsAdapter<A, L = LookupTables> {
    api: A,
    lookup: L,
    zone: DisplayZone,
}

impl<A: StatsApi, L: LookupService> StatsAdapter<A, L> {
    /// Adapter over `api`, resolving codes through `lookup`
    pub fn new(api: A, lookup: L, zone: DisplayZone) -> Self {
        Self { api, lookup, zone }
    }

    /// The underlying stats API
    pub fn api(&self) -> &A {
        &self.api
    }

    /// The code tables in use
    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Zone timestamps are converted to
    pub fn zone(&self) -> DisplayZone {
        self.zone
    }

    /// Recent races of `driver_id`, newest first as the service returns them
    pub async fn recent_races(
        &self,
        credentials: &Credentials,
        driver_id: u64,
    ) -> Result<FetchReport<RaceResult>, RemoteError> {
        tracing::info!("Fetching recent races for driver {}", driver_id);
        let payload = self.api.fetch_recent_races(credentials, driver_id).await?;
        let report = self.normalize_races(&payload);
        log_report("race", &report);
        Ok(report)
    }

    /// Sessions from the race guide
    pub async fn upcoming_sessions(
        &self,
        credentials: &Credentials,
    ) -> Result<FetchReport<UpcomingSession>, RemoteError> {
        tracing::info!("Fetching upcoming sessions");
        let payload = self.api.fetch_upcoming_sessions(credentials).await?;
        let report = self.normalize_sessions(&payload);
        log_report("session", &report);
        Ok(report)
    }

    /// First `limit` rows of a leaderboard snapshot
    pub fn leaderboard(
        &self,
        path: &Path,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        load_leaderboard(path, limit)
    }

    /// Map a recent-races payload onto extended records
    pub fn normalize_races(&self, payload: &Value) -> FetchReport<RaceResult> {
        let mut report = FetchReport::new();
        let Some(races) = list_at(payload, &["races", "data.races"]) else {
            report
                .issues
                .push(RecordIssue::payload("payload carries no race list"));
            return report;
        };

        for (index, race) in races.iter().enumerate() {
            if !race.is_object() {
                report.issues.push(RecordIssue::at(index, "race entry is not an object"));
                continue;
            }
            report.items.push(self.race_from(index, race, &mut report.issues));
        }
        report
    }

    fn race_from(&self, index: usize, race: &Value, issues: &mut Vec<RecordIssue>) -> RaceResult {
        let car_id = u32_at(race, &["car_id"]);
        let car_model = match self.lookup.car_name(car_id) {
            Some(name) => name.to_string(),
            None => str_at(race, &["car_name"])
                .filter(|name| !name.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| self.lookup.resolve_car(car_id)),
        };

        let series_name = match str_at(race, &["series_name"]) {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => self.lookup.resolve_series(u32_at(race, &["series_id"])),
        };

        let session_start = match str_at(race, &["session_start_time", "start_time"]) {
            Some(raw) => self.zone.format(raw).unwrap_or_else(|e| {
                issues.push(RecordIssue::at(index, e.to_string()));
                String::new()
            }),
            None => String::new(),
        };

        RaceResult {
            car_model,
            incidents_count: u32_at(race, &["incidents", "incidents_count"]),
            position_in_race: None,
            track_name: str_at(race, &["track.track_name", "track_name"])
                .unwrap_or_default()
                .to_string(),
            remote: Some(RemoteDetails {
                series_name,
                start_position: u32_at(race, &["start_position"]),
                finish_position: u32_at(race, &["finish_position"]),
                points: u32_at(race, &["points"]),
                strength_of_field: u32_at(race, &["strength_of_field"]),
                oldi_rating: i32_at(race, &["oldi_rating"]),
                newi_rating: i32_at(race, &["newi_rating"]),
                laps_led: u32_at(race, &["laps_led"]),
                car_id,
                session_start,
            }),
        }
        .normalized()
    }

    /// Map a race-guide payload onto sessions
    pub fn normalize_sessions(&self, payload: &Value) -> FetchReport<UpcomingSession> {
        let mut report = FetchReport::new();
        let Some(sessions) = list_at(payload, &["sessions", "data.sessions"]) else {
            report
                .issues
                .push(RecordIssue::payload("payload carries no session list"));
            return report;
        };

        for (index, session) in sessions.iter().enumerate() {
            if !session.is_object() {
                report
                    .issues
                    .push(RecordIssue::at(index, "session entry is not an object"));
                continue;
            }

            let start = match str_at(session, &["start_time"]).map(|raw| self.zone.format(raw)) {
                Some(Ok(start)) => start,
                Some(Err(e)) => {
                    report.issues.push(RecordIssue::at(index, e.to_string()));
                    continue;
                }
                None => {
                    report
                        .issues
                        .push(RecordIssue::at(index, "session has no start time"));
                    continue;
                }
            };

            let end = match str_at(session, &["end_time"]).map(|raw| self.zone.format(raw)) {
                Some(Ok(end)) => end,
                Some(Err(e)) => {
                    report.issues.push(RecordIssue::at(index, e.to_string()));
                    String::new()
                }
                None => String::new(),
            };

            let series_id = u32_at(session, &["series_id"]);
            report.items.push(UpcomingSession {
                series_id,
                series_name: self.lookup.resolve_series(series_id),
                race_week: u32_at(session, &["race_week_num"]).saturating_add(1),
                start,
                end,
                entry_count: u32_at(session, &["entry_count"]),
            });
        }
        report
    }
}

fn log_report<T>(kind: &str, report: &FetchReport<T>) {
    tracing::info!("Normalized {} {} entries", report.items.len(), kind);
    for issue in &report.issues {
        tracing::warn!("Skipped or defaulted {} data, {}", kind, issue);
    }
}

/// Follow a dotted path (`track.track_name`) through nested objects
fn value_at<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, key| current.get(key))
        .filter(|found| !found.is_null())
}

/// First path that resolves wins
fn first_at<'a>(value: &'a Value, paths: &[&str]) -> Option<&'a Value> {
    paths.iter().find_map(|path| value_at(value, path))
}

fn str_at<'a>(value: &'a Value, paths: &[&str]) -> Option<&'a str> {
    paths
        .iter()
        .find_map(|path| value_at(value, path).and_then(Value::as_str))
}

/// List under one of `paths`, or the payload itself when it is a bare array
fn list_at<'a>(payload: &'a Value, paths: &[&str]) -> Option<&'a Vec<Value>> {
    payload
        .as_array()
        .or_else(|| first_at(payload, paths).and_then(Value::as_array))
}

fn number(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Non-negative count; missing or malformed reads as 0
fn u32_at(value: &Value, paths: &[&str]) -> u32 {
    first_at(value, paths)
        .and_then(number)
        .map(|n| n.clamp(0, u32::MAX as i64) as u32)
        .unwrap_or(0)
}

fn i32_at(value: &Value, paths: &[&str]) -> i32 {
    first_at(value, paths)
        .and_then(number)
        .map(|n| n.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
        .unwrap_or(0)
}
