//! Leaderboard snapshot
//!
//! A static CSV export of driver statistics with at least the columns
//! `DRIVER`, `IRATING`, `AVG_INC` and `AVG_FINISH_POS`, ordered by rank.
//! Other columns are ignored and rows that don't parse are skipped.

use std::fs;
use std::path::Path;

use super::LeaderboardError;

/// Default number of rows shown
pub const DEFAULT_LIMIT: usize = 30;

const DRIVER: &str = "DRIVER";
const IRATING: &str = "IRATING";
const AVG_INC: &str = "AVG_INC";
const AVG_FINISH: &str = "AVG_FINISH_POS";

/// One ranked driver
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    /// Driver display name
    pub driver: String,
    /// Skill rating
    pub irating: u32,
    /// Average incidents per race
    pub avg_incidents: f64,
    /// Average finishing position
    pub avg_finish: f64,
}

/// Read the first `limit` valid rows of the snapshot at `path`
pub fn load_leaderboard(path: &Path, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
    let content = fs::read_to_string(path)?;
    let entries = parse_leaderboard(&content, limit)?;
    tracing::debug!("Read {} leaderboard rows from {}", entries.len(), path.display());
    Ok(entries)
}

/// Parse snapshot text; see [`load_leaderboard`]
pub fn parse_leaderboard(content: &str, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
    let mut lines = content.lines().filter(|line| !line.trim().is_empty());

    let header = lines.next().ok_or(LeaderboardError::Empty)?;
    let header = header.trim_start_matches('\u{feff}');
    let columns: Vec<String> = parse_csv_line(header)
        .unwrap_or_default()
        .into_iter()
        .map(|c| c.trim().to_uppercase())
        .collect();

    let column = |name: &'static str| {
        columns
            .iter()
            .position(|c| c == name)
            .ok_or(LeaderboardError::MissingColumn(name))
    };
    let driver_col = column(DRIVER)?;
    let irating_col = column(IRATING)?;
    let inc_col = column(AVG_INC)?;
    let finish_col = column(AVG_FINISH)?;

    let mut entries = Vec::new();
    for (line_no, line) in lines.enumerate() {
        if entries.len() >= limit {
            break;
        }

        let Some(fields) = parse_csv_line(line) else {
            tracing::warn!("Leaderboard row {}: unclosed quote, skipped", line_no + 2);
            continue;
        };
        let field = |index: usize| fields.get(index).map(|f| f.trim()).unwrap_or("");

        let driver = field(driver_col);
        let parsed = (
            parse_rating(field(irating_col)),
            field(inc_col).parse::<f64>().ok(),
            field(finish_col).parse::<f64>().ok(),
        );
        match parsed {
            (Some(irating), Some(avg_incidents), Some(avg_finish)) if !driver.is_empty() => {
                entries.push(LeaderboardEntry {
                    driver: driver.to_string(),
                    irating,
                    avg_incidents,
                    avg_finish,
                });
            }
            _ => tracing::warn!("Leaderboard row {}: unreadable values, skipped", line_no + 2),
        }
    }

    Ok(entries)
}

/// Ratings are sometimes exported as floats ("4512.0")
fn parse_rating(value: &str) -> Option<u32> {
    value
        .parse::<u32>()
        .ok()
        .or_else(|| value.parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f.round() as u32))
}

/// Split one comma-separated line; `None` when a quote is left open
fn parse_csv_line(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        let mut field = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        closed = true;
                        break;
                    }
                } else {
                    field.push(c);
                }
            }
            if !closed {
                return None;
            }
        }

        let mut more = false;
        for c in chars.by_ref() {
            if c == ',' {
                more = true;
                break;
            }
            field.push(c);
        }
        fields.push(field);
        if !more {
            return Some(fields);
        }
    }
}
