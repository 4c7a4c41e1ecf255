//! Log buffer and flush discipline.
//!
//! Entries queue in memory and only reach disk on flush: either when the
//! buffer hits the configured threshold or when a checkpoint forces it.
//! The flush is the single durability point. Anything still buffered at a
//! crash is lost; that is the throughput side of the tradeoff.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use log::debug;

use crate::entry::LogEntry;
use crate::error::Result;

/// Flush tuning for the in-memory log buffer.
#[derive(Debug, Clone)]
pub struct WalConfig {
    /// Buffered entries before a synchronous flush is forced.
    pub flush_threshold: usize,
}

impl Default for WalConfig {
    fn default() -> Self {
        Self { flush_threshold: 4 }
    }
}

/// Buffered writer over the append-only durable log file.
pub struct WalWriter {
    file: File,
    buffer: Vec<LogEntry>,
    config: WalConfig,
}

impl WalWriter {
    /// Open or create the log file for appending.
    pub fn open(path: &Path, config: WalConfig) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file,
            buffer: Vec::new(),
            config,
        })
    }

    /// Queue an entry; flushes synchronously once the buffer reaches the
    /// threshold.
    pub fn append(&mut self, entry: LogEntry) -> Result<()> {
        self.buffer.push(entry);
        if self.buffer.len() >= self.config.flush_threshold {
            self.flush()?;
        }
        Ok(())
    }

    /// Write every buffered entry in order, force the file to a durable
    /// state, and clear the buffer.
    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        for entry in &self.buffer {
            self.file.write_all(entry.encode().as_bytes())?;
        }
        self.file.flush()?;
        self.file.sync_data()?;
        debug!("flushed {} log entries", self.buffer.len());
        self.buffer.clear();
        Ok(())
    }

    /// Number of entries queued but not yet durable.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}
