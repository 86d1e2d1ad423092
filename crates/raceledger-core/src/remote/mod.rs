//! Remote Stats Adapter
//!
//! Fetches race data from the remote stats service and normalizes it into
//! [`RaceResult`](crate::record::RaceResult) records:
//!
//! - [`client`]: the [`StatsApi`] contract and its HTTP implementation
//! - [`normalize`]: tolerant payload mapping ([`StatsAdapter`])
//! - [`lookup`]: car and series code tables behind [`LookupService`]
//! - [`timezone`]: conversion into the display zone
//! - [`leaderboard`]: the static leaderboard snapshot
//!
//! Whole-fetch failures are a [`RemoteError`]. Everything that goes wrong
//! with a single entry ends up in [`FetchReport::issues`].

/// Stats API contract and HTTP client
pub mod client;
mod error;
/// Leaderboard snapshot reader
pub mod leaderboard;
/// Car and series code tables
pub mod lookup;
/// Payload normalization
pub mod normalize;
/// Timestamp parsing and display zone
pub mod timezone;

pub use client::{IRacingClient, StatsApi, DEFAULT_BASE_URL};
pub use error::{LeaderboardError, LookupError, RemoteError, TimestampError};
pub use leaderboard::{load_leaderboard, LeaderboardEntry};
pub use lookup::{LookupService, LookupTables, UNKNOWN};
pub use normalize::{FetchReport, RecordIssue, StatsAdapter, UpcomingSession};
pub use timezone::DisplayZone;
