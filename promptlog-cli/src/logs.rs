use std::path::Path;
use std::process;

use promptlog_lib::{normalize_limit, LogFilter, NewLogEntry, Store, StoreError};
use serde::Serialize;
use thiserror::Error;

/// Store operations exposed as CLI subcommands.
#[derive(Debug, Clone, PartialEq)]
pub enum DataCommand {
    Add(NewLogEntry),
    List {
        filter: LogFilter,
        limit: Option<String>,
    },
    Show {
        id: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to serialize output: {0}")]
    Output(#[from] serde_json::Error),
}

fn to_json<T: Serialize>(value: &T) -> Result<String, CommandError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Run `cmd` against the store at `db_path` and return what should be
/// printed on stdout.
pub fn execute(db_path: &Path, cmd: DataCommand) -> Result<String, CommandError> {
    let store = Store::open(db_path)?;
    match cmd {
        DataCommand::Add(new) => to_json(&store.create(new)?),
        DataCommand::List { filter, limit } => {
            to_json(&store.list(&filter, normalize_limit(limit.as_deref()))?)
        }
        DataCommand::Show { id } => to_json(&store.get(&id)?),
        DataCommand::Delete { id } => {
            let removed = store.delete(&id)?;
            Ok(format!("✓ Deleted {}", removed.id))
        }
    }
}

pub fn run(db_path: &Path, cmd: DataCommand) {
    match execute(db_path, cmd) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}
