//! Plain-text rendering of results for the terminal

use raceledger_core::record::{PendingEntry, RaceResult};
use raceledger_core::remote::{LeaderboardEntry, UpcomingSession};

const SEPARATOR: &str = "------------------------------";

pub fn result_block(result: &RaceResult) -> String {
    let mut lines = Vec::new();
    if let Some(remote) = &result.remote {
        lines.push(format!("Series: {}", remote.series_name));
    }
    lines.push(format!("Car Model: {}", result.car_model));
    lines.push(format!("Track: {}", result.track_name));
    if let Some(position) = result.position_in_race {
        lines.push(format!("Position: {}", position));
    }
    lines.push(format!("Incidents: {}", result.incidents_count));

    if let Some(remote) = &result.remote {
        if !remote.session_start.is_empty() {
            lines.push(format!("Session Start: {}", remote.session_start));
        }
        lines.push(format!("Start Position: {}", remote.start_position));
        lines.push(format!("Finish Position: {}", remote.finish_position));
        lines.push(format!("Points: {}", remote.points));
        lines.push(format!("Strength of Field: {}", remote.strength_of_field));
        lines.push(format!("Old rating: {}", remote.oldi_rating));
        lines.push(format!("New rating: {}", remote.newi_rating));
        lines.push(format!("Laps Led: {}", remote.laps_led));
    }
    lines.push(SEPARATOR.to_string());
    lines.join("\n")
}

pub fn pending_block(pending: &PendingEntry) -> String {
    fn or_dash<T: ToString>(value: &Option<T>) -> String {
        value.as_ref().map(T::to_string).unwrap_or_else(|| "-".to_string())
    }

    [
        format!("Car Model: {}", or_dash(&pending.car_model)),
        format!("Track: {}", or_dash(&pending.track_name)),
        format!("Incidents: {}", or_dash(&pending.incidents_count)),
        format!("Position: {}", or_dash(&pending.position_in_race)),
    ]
    .join("\n")
}

pub fn session_block(session: &UpcomingSession) -> String {
    let mut lines = vec![
        format!("Race week number: {}", session.race_week),
        format!("Start Time: {}", session.start),
    ];
    if !session.end.is_empty() {
        lines.push(format!("End Time: {}", session.end));
    }
    lines.push(format!("Series name: {}", session.series_name));
    lines.push(format!("Entry Count: {}", session.entry_count));
    lines.push(SEPARATOR.to_string());
    lines.join("\n")
}

pub fn leaderboard_block(entry: &LeaderboardEntry) -> String {
    [
        format!("IRating: {}", entry.irating),
        format!("Driver Name: {}", entry.driver),
        format!("Average incidents: {}", entry.avg_incidents),
        format!("Average finish position: {}", entry.avg_finish),
        SEPARATOR.to_string(),
    ]
    .join("\n")
}
