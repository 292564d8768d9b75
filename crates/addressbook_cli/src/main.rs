//! Address book command-line front end.
//!
//! # Responsibility
//! - Drive the find/add/remove/list flows of `addressbook_core` from a shell.
//! - Resolve configuration from `ADDRESSBOOK_*` variables and flags.

use addressbook_core::{
    init_logging_from_config, Address, AddressBookRuntime, AppConfig, MockAddressLookup,
    SearchOutcome,
};
use clap::{Parser, Subcommand};
use log::warn;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "addressbook", version, about = "Personal address book")]
struct Cli {
    /// SQLite database file (overrides ADDRESSBOOK_DB_PATH).
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Storage key (overrides ADDRESSBOOK_STORAGE_KEY).
    #[arg(long, global = true)]
    key: Option<String>,
    /// Absolute log directory (overrides ADDRESSBOOK_LOG_DIR).
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    /// Log level (overrides ADDRESSBOOK_LOG_LEVEL).
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Look up addresses for a postcode and house number.
    Find {
        postcode: String,
        house_number: String,
    },
    /// Look up addresses, pick one and save it with a person attached.
    Add {
        postcode: String,
        house_number: String,
        first_name: String,
        last_name: String,
        /// 1-based position in the lookup results.
        #[arg(long, default_value_t = 1, conflicts_with = "id")]
        pick: usize,
        /// Identity key of the result to pick.
        #[arg(long)]
        id: Option<String>,
    },
    /// Remove a saved entry by identity key.
    Remove { id: String },
    /// Print saved entries in display order.
    List,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = resolve_config(&cli);

    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("logging disabled: {err}");
    }

    let lookup = Arc::new(MockAddressLookup::new());
    let mut runtime = match AddressBookRuntime::open(&config, lookup).await {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to open {}: {err}", config.db_path.display());
            return ExitCode::FAILURE;
        }
    };

    let ok = run(cli.command, &mut runtime).await;

    let status = runtime.shutdown().await;
    if !status.is_clean() {
        warn!(
            "event=cli_exit module=cli status=error last_failed={:?}",
            status.last_failed
        );
        eprintln!("warning: changes may not have been saved");
    }

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn resolve_config(cli: &Cli) -> AppConfig {
    let mut config = AppConfig::from_env();
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(key) = &cli.key {
        config.storage_key = key.clone();
    }
    if let Some(log_dir) = &cli.log_dir {
        config.log_dir = Some(log_dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    config
}

async fn run(command: Command, runtime: &mut AddressBookRuntime) -> bool {
    let session = runtime.session_mut();
    match command {
        Command::Find {
            postcode,
            house_number,
        } => {
            if !report_search(session.find(&postcode, &house_number).await, session) {
                return false;
            }
            for (position, address) in session.results().iter().enumerate() {
                println!("{:>2}. {}  [{}]", position + 1, address.summary(), address.id);
            }
            true
        }
        Command::Add {
            postcode,
            house_number,
            first_name,
            last_name,
            pick,
            id,
        } => {
            if !report_search(session.find(&postcode, &house_number).await, session) {
                return false;
            }
            let chosen = id.or_else(|| {
                pick.checked_sub(1)
                    .and_then(|index| session.results().get(index))
                    .map(|address| address.id.clone())
            });
            if let Some(chosen) = chosen {
                session.select(chosen);
            }
            match session.add_person(&first_name, &last_name) {
                Ok(address) => {
                    println!("saved {}", describe(&address));
                    true
                }
                Err(err) => {
                    eprintln!("{err}");
                    false
                }
            }
        }
        Command::Remove { id } => {
            if session.remove(&id) {
                println!("removed {id}");
            } else {
                println!("no entry with id {id}");
            }
            true
        }
        Command::List => {
            let entries = session.entries();
            if entries.is_empty() {
                println!("No addresses yet, add your first one.");
            }
            for address in &entries {
                println!("{}", describe(address));
            }
            true
        }
    }
}

fn report_search(outcome: SearchOutcome, session: &addressbook_core::AddressBookSession) -> bool {
    match outcome {
        SearchOutcome::Found(_) => true,
        _ => {
            eprintln!("{}", session.message().unwrap_or("search did not complete"));
            false
        }
    }
}

fn describe(address: &Address) -> String {
    format!(
        "[{}] {} - {}  ({})",
        address.initials(),
        address.display_title(),
        address.summary(),
        address.id
    )
}
