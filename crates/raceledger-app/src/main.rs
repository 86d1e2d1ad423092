mod args;
mod output;

use anyhow::{anyhow, bail, Context, Result};
use args::{Args, Command, PendingAction};
use clap::Parser;
use raceledger_core::credentials::{CredentialVault, Credentials, KeyringStore, MemoryStore};
use raceledger_core::ledger::{LedgerStore, LoadOutcome};
use raceledger_core::record::RaceResult;
use raceledger_core::remote::{self, IRacingClient, RecordIssue, RemoteError, StatsAdapter};
use raceledger_core::settings::AppSettings;
use raceledger_core::storage::open_backend;
use std::io::{self, BufRead, Write};
use std::process;

const DEFAULT_FILTER: &str = "raceledger=info,raceledger_core=info,warn";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("raceledger: error: {:#}", e);
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_FILTER)),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let settings_path = args.settings.clone().unwrap_or_else(AppSettings::default_path);
    let mut settings = AppSettings::load(&settings_path);
    if let Some(backend) = args.backend {
        settings.backend = backend;
    }
    if let Some(dir) = args.data_dir.clone() {
        settings.data_dir = Some(dir);
    }
    tracing::debug!("Settings from {}: {:?}", settings_path.display(), settings);

    let vault = if args.no_keyring {
        CredentialVault::new(Box::new(MemoryStore::default()))
    } else {
        CredentialVault::new(Box::new(KeyringStore))
    };

    match args.command {
        Command::Add {
            car,
            track,
            incidents,
            position,
        } => {
            let result = RaceResult::manual(car, incidents, position, track)
                .context("Invalid result")?;
            let mut store = open_store(&settings)?;
            store.add(result.clone()).context("Failed to save the ledger")?;
            println!("{}", output::result_block(&result));
            println!("{} of {} results stored", store.len(), store.capacity());
        }

        Command::Pending { action } => {
            let mut store = open_store(&settings)?;
            match action {
                PendingAction::Show => {}
                PendingAction::SetCar { value } => {
                    store.update_pending(|p| p.car_model = Some(value))?
                }
                PendingAction::SetTrack { value } => {
                    store.update_pending(|p| p.track_name = Some(value))?
                }
                PendingAction::SetIncidents { value } => {
                    store.update_pending(|p| p.incidents_count = Some(value))?
                }
                PendingAction::SetPosition { value } => {
                    store.update_pending(|p| p.position_in_race = Some(value))?
                }
                PendingAction::Commit => {
                    let result = store
                        .commit_pending()
                        .context("Could not add the pending entry")?;
                    println!("{}", output::result_block(&result));
                    return Ok(());
                }
            }
            println!("{}", output::pending_block(store.pending()));
        }

        Command::List => {
            let store = open_store(&settings)?;
            if store.is_empty() {
                println!("No results yet");
            }
            for result in store.all() {
                println!("{}", output::result_block(result));
            }
        }

        Command::Clear => {
            let mut store = open_store(&settings)?;
            store.clear().context("Failed to save the ledger")?;
            println!("Ledger cleared");
        }

        Command::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt_password()?,
            };
            if username.trim().is_empty() || password.is_empty() {
                bail!("Username and password are required");
            }
            vault
                .set(Credentials::new(username.trim(), password))
                .context("Failed to store credentials")?;
            println!("Credentials stored");
        }

        Command::Logout => {
            vault.clear().context("Failed to clear credentials")?;
            println!("Credentials cleared");
        }

        Command::Recent { driver, import } => {
            let creds = credentials(&vault)?;
            let adapter = adapter(&settings)?;
            let driver = driver.unwrap_or(settings.remote.driver_id);

            let report = adapter
                .recent_races(&creds, driver)
                .await
                .map_err(|e| remote_failure(e, &vault))?;
            print_issues(&report.issues);
            if report.items.is_empty() {
                println!("No recent races");
            }
            for result in &report.items {
                println!("{}", output::result_block(result));
            }

            if import && !report.items.is_empty() {
                let mut store = open_store(&settings)?;
                // Oldest first so the newest race ends up on top
                for result in report.items.into_iter().rev() {
                    store.add(result).context("Failed to save the ledger")?;
                }
                println!("Imported; {} results stored", store.len());
            }
        }

        Command::Upcoming => {
            let creds = credentials(&vault)?;
            let adapter = adapter(&settings)?;
            println!("Current time: {}", adapter.zone().now_string());

            let report = adapter
                .upcoming_sessions(&creds)
                .await
                .map_err(|e| remote_failure(e, &vault))?;
            print_issues(&report.issues);
            for session in &report.items {
                println!("{}", output::session_block(session));
            }
        }

        Command::Leaderboard { file, limit } => {
            let Some(file) = file.or_else(|| settings.remote.leaderboard_csv.clone()) else {
                bail!("No leaderboard file; pass --file or set remote.leaderboard_csv");
            };
            let limit = limit.unwrap_or(settings.remote.leaderboard_limit);
            let entries = remote::load_leaderboard(&file, limit)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            for entry in &entries {
                println!("{}", output::leaderboard_block(entry));
            }
        }

        Command::Clock => {
            println!("{}", settings.display_zone()?.now_string());
        }
    }

    Ok(())
}

fn open_store(settings: &AppSettings) -> Result<LedgerStore> {
    let data_dir = settings.data_dir();
    let backend = open_backend(settings.backend, &data_dir)
        .with_context(|| format!("Failed to open {} store in {}", settings.backend, data_dir.display()))?;

    let store = LedgerStore::load(backend);
    match store.load_outcome() {
        LoadOutcome::Recovered { reason } => {
            eprintln!("note: stored results were unreadable ({}); starting empty", reason)
        }
        LoadOutcome::Unreadable { reason } => {
            eprintln!("note: could not read stored results ({}); nothing will be saved", reason)
        }
        _ => {}
    }
    Ok(store)
}

fn adapter(settings: &AppSettings) -> Result<StatsAdapter<IRacingClient>> {
    let client = IRacingClient::new(settings.remote.base_url.clone(), settings.timeout());
    let lookup = settings.lookup_tables().context("Failed to load lookup tables")?;
    Ok(StatsAdapter::new(client, lookup, settings.display_zone()?))
}

/// Stored credentials, or ones given through the environment for this run only
fn credentials(vault: &CredentialVault) -> Result<Credentials> {
    if let (Ok(username), Ok(password)) = (
        std::env::var("RACELEDGER_USERNAME"),
        std::env::var("RACELEDGER_PASSWORD"),
    ) {
        if !username.is_empty() && !password.is_empty() {
            vault.set_session(Credentials::new(username, password))?;
        }
    }

    vault
        .get()
        .context("Failed to read credentials")?
        .ok_or_else(|| anyhow!("No credentials stored; run `raceledger login` first"))
}

fn remote_failure(error: RemoteError, vault: &CredentialVault) -> anyhow::Error {
    match error {
        RemoteError::Auth(_) => {
            if let Err(e) = vault.clear() {
                tracing::warn!("Could not clear rejected credentials: {}", e);
            }
            anyhow!("{}; run `raceledger login` again", error)
        }
        RemoteError::Transient(_) => anyhow!("{}; try again later", error),
    }
}

fn print_issues(issues: &[RecordIssue]) {
    for issue in issues {
        eprintln!("note: {}", issue);
    }
}

fn prompt_password() -> Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
