use clap::{Parser, Subcommand};
use raceledger_core::storage::BackendKind;
use std::path::PathBuf;

/// raceledger: keep a log of your recent sim races
#[derive(Debug, Parser)]
#[command(name = "raceledger", about = "Sim racing results ledger", version)]
pub struct Args {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, env = "RACELEDGER_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,

    /// Storage backend, overriding the settings file
    #[arg(long, global = true)]
    pub backend: Option<BackendKind>,

    /// Directory holding the ledger, overriding the settings file
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Keep credentials in memory only instead of the OS keyring
    #[arg(long, global = true)]
    pub no_keyring: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a result to the ledger
    Add {
        #[arg(long)]
        car: String,
        #[arg(long)]
        track: String,
        #[arg(long, default_value_t = 0)]
        incidents: u32,
        /// Finishing position (1 = win)
        #[arg(long)]
        position: Option<u32>,
    },

    /// Work on an entry one field at a time
    Pending {
        #[command(subcommand)]
        action: PendingAction,
    },

    /// Show the ledger, newest first
    List,

    /// Remove every result from the ledger
    Clear,

    /// Store credentials for the stats service
    Login {
        #[arg(long, env = "RACELEDGER_USERNAME")]
        username: String,
        /// Read from stdin when omitted
        #[arg(long, env = "RACELEDGER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget stored credentials
    Logout,

    /// Show recent races from the stats service
    Recent {
        /// Driver (customer) id, overriding the settings file
        #[arg(long)]
        driver: Option<u64>,
        /// Also add the races to the ledger
        #[arg(long)]
        import: bool,
    },

    /// Show upcoming scheduled sessions
    Upcoming,

    /// Show the leaderboard snapshot
    Leaderboard {
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show the current time in the display timezone
    Clock,
}

#[derive(Debug, Subcommand)]
pub enum PendingAction {
    /// Show the pending entry
    Show,
    SetCar { value: String },
    SetTrack { value: String },
    SetIncidents { value: u32 },
    SetPosition { value: u32 },
    /// Add the pending entry to the ledger
    Commit,
}
