pub mod entry;
pub mod error;
pub mod limit;
pub mod store;

pub use entry::{LogEntry, LogFilter, LogPage, NewLogEntry};
pub use error::{StoreError, StoreResult};
pub use limit::{clamp_limit, normalize_limit, DEFAULT_LIMIT, MAX_LIMIT};
pub use store::Store;

/// Backing file used when neither `--db` nor `DB_PATH` is given.
pub const DEFAULT_DB_PATH: &str = "./data/db.json";
