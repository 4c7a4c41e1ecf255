//! slatekv: a minimal transactional key/value engine with write-ahead
//! logging, checkpointing, and crash recovery.
//!
//! The engine keeps its whole dataset in an in-memory buffer pool and
//! makes changes durable through a line-oriented write-ahead log. Writes
//! hit the pool before commit (steal) and commit does not force data to
//! disk (no-force); a checkpoint rewrites the snapshot file and records
//! the master LSN recovery will replay from.

use std::path::PathBuf;

pub mod buffer_pool;
pub mod command;
pub mod entry;
pub mod error;
pub mod manager;
mod recovery;
pub mod types;
pub mod wal;

pub use command::Command;
pub use error::{Result, SlateError};
pub use manager::TransactionManager;
pub use wal::WalConfig;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the durable log and the snapshot file.
    pub data_dir: PathBuf,
    pub wal: WalConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./slatekv_data"),
            wal: WalConfig::default(),
        }
    }
}
