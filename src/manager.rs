//! Transaction manager: the engine core.
//!
//! Owns the buffer pool, the log writer, the LSN counter, the master
//! record, and the active-transaction set, and drives every state change
//! through the write-ahead log.
//!
//! ## Buffer policy: steal + no-force
//! - **Steal**: `set` applies the new value to the buffer pool immediately,
//!   before commit. Uncommitted data is live and may be checkpointed.
//! - **No-force**: commit does not persist data. Only the log guarantees
//!   durability until the next checkpoint snapshots the pool.
//!
//! ## Execution model
//! Single-threaded and synchronous: one command is fully processed
//! (mutation, logging, optional flush) before the next is accepted, so no
//! locking exists anywhere in the engine.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use log::debug;

use crate::buffer_pool::BufferPool;
use crate::entry::{LogEntry, NIL};
use crate::error::{Result, SlateError};
use crate::types::{Lsn, Transaction, TxnId};
use crate::wal::WalWriter;
use crate::Config;

/// The transaction manager
pub struct TransactionManager {
    config: Config,
    /// Current database state; dirty reads by design (steal).
    pool: BufferPool,
    wal: WalWriter,
    /// Last allocated LSN.
    lsn: Lsn,
    /// LSN of the most recent checkpoint; zero if none was ever taken.
    master: Lsn,
    /// Transactions with a Begin but no Commit or Abort yet.
    active: BTreeMap<TxnId, Transaction>,
    /// Replayed operations are not re-logged while this is set.
    pub(crate) recovering: bool,
}

impl TransactionManager {
    pub(crate) const WAL_FILE: &'static str = "wal.log";
    pub(crate) const SNAPSHOT_FILE: &'static str = "snapshot.db";

    /// Open the engine.
    ///
    /// Startup order is load-bearing: load the snapshot (pool + master),
    /// replay the durable log against it, and only then accept commands.
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let snapshot_path = config.data_dir.join(Self::SNAPSHOT_FILE);
        let wal_path = config.data_dir.join(Self::WAL_FILE);

        let (master, pool) = BufferPool::load(&snapshot_path)?;
        let wal = WalWriter::open(&wal_path, config.wal.clone())?;

        let mut manager = Self {
            config,
            pool,
            wal,
            // The counter resumes from the master record; replay bumps it
            // past every LSN seen in the log.
            lsn: master,
            master,
            active: BTreeMap::new(),
            recovering: false,
        };
        crate::recovery::replay(&mut manager)?;

        Ok(manager)
    }

    pub(crate) fn wal_path(&self) -> PathBuf {
        self.config.data_dir.join(Self::WAL_FILE)
    }

    fn snapshot_path(&self) -> PathBuf {
        self.config.data_dir.join(Self::SNAPSHOT_FILE)
    }

    /// Allocate the next LSN. Advanced exactly once per logged event.
    fn next_lsn(&mut self) -> Lsn {
        self.lsn += 1;
        self.lsn
    }

    /// Raise the counter to at least `seen`, so allocation resumes strictly
    /// above every LSN read back from the durable log.
    pub(crate) fn bump_lsn(&mut self, seen: Lsn) {
        if seen > self.lsn {
            self.lsn = seen;
        }
    }

    /// Append through the log buffer, unless replaying: recovered
    /// operations must not grow the log again on every restart.
    fn write_log(&mut self, entry: LogEntry) -> Result<()> {
        if self.recovering {
            return Ok(());
        }
        self.wal.append(entry)
    }

    /// Start a transaction. Duplicate ids on the active set are rejected.
    pub fn begin(&mut self, txn_id: &str) -> Result<()> {
        if self.active.contains_key(txn_id) {
            return Err(SlateError::Transaction(format!(
                "transaction {} already exists",
                txn_id
            )));
        }

        let entry = LogEntry::Begin {
            lsn: self.next_lsn(),
            txn_id: txn_id.to_string(),
        };
        self.write_log(entry.clone())?;
        self.active
            .insert(txn_id.to_string(), Transaction::new(txn_id.to_string(), entry));
        Ok(())
    }

    /// Write a key inside a transaction. The pool's prior value (or the
    /// `nil` sentinel) is captured into the Update entry for undo, and the
    /// new value goes live immediately.
    pub fn set(&mut self, txn_id: &str, key: &str, value: &str) -> Result<()> {
        if !self.active.contains_key(txn_id) {
            return Err(SlateError::Transaction(format!(
                "transaction {} does not exist",
                txn_id
            )));
        }

        let old_value = self.pool.get(key).unwrap_or(NIL).to_string();
        let entry = LogEntry::Update {
            lsn: self.next_lsn(),
            txn_id: txn_id.to_string(),
            key: key.to_string(),
            old_value,
            new_value: value.to_string(),
        };
        self.write_log(entry.clone())?;

        if let Some(txn) = self.active.get_mut(txn_id) {
            txn.entries.push(entry);
        }
        self.pool.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Finalize a transaction. No undo is retained; its writes already
    /// stand in the pool.
    pub fn commit(&mut self, txn_id: &str) -> Result<()> {
        if !self.active.contains_key(txn_id) {
            return Err(SlateError::Transaction(format!(
                "transaction {} does not exist",
                txn_id
            )));
        }

        let entry = LogEntry::Commit {
            lsn: self.next_lsn(),
            txn_id: txn_id.to_string(),
        };
        self.write_log(entry)?;
        self.active.remove(txn_id);
        Ok(())
    }

    /// Undo a transaction by restoring the old values its Update entries
    /// recorded, then drop it from the active set.
    ///
    /// Old values are replayed in recorded order, not reverse: a key
    /// written more than once inside one transaction settles on the first
    /// written value instead of the pre-transaction one.
    pub fn abort(&mut self, txn_id: &str) -> Result<()> {
        if !self.active.contains_key(txn_id) {
            return Err(SlateError::Transaction(format!(
                "transaction {} does not exist",
                txn_id
            )));
        }

        let entry = LogEntry::Abort {
            lsn: self.next_lsn(),
            txn_id: txn_id.to_string(),
        };
        self.write_log(entry)?;

        if let Some(txn) = self.active.remove(txn_id) {
            for entry in &txn.entries {
                if let LogEntry::Update { key, old_value, .. } = entry {
                    if old_value == NIL {
                        self.pool.remove(key);
                    } else {
                        self.pool.insert(key.clone(), old_value.clone());
                    }
                }
            }
        }
        Ok(())
    }

    /// Read a key from the buffer pool. Dirty reads by design.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pool.get(key)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.pool.exists(key)
    }

    pub fn is_active(&self, txn_id: &str) -> bool {
        self.active.contains_key(txn_id)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub(crate) fn active_ids(&self) -> Vec<TxnId> {
        self.active.keys().cloned().collect()
    }

    /// LSN of the most recent checkpoint; zero means none was ever taken.
    pub fn master(&self) -> Lsn {
        self.master
    }

    /// Last allocated LSN.
    pub fn current_lsn(&self) -> Lsn {
        self.lsn
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Checkpoint: bound future recovery work.
    ///
    /// Allocates the new master LSN, logs a Checkpoint entry carrying every
    /// active transaction's accumulated entry list, forces the log buffer
    /// to disk, and only then rewrites the snapshot. Log before data: any
    /// state a snapshot reflects is already represented in the durable log.
    pub fn checkpoint(&mut self) -> Result<()> {
        self.master = self.next_lsn();

        let pending: Vec<(TxnId, Vec<LogEntry>)> = self
            .active
            .iter()
            .map(|(id, txn)| (id.clone(), txn.entries.clone()))
            .collect();
        let entry = LogEntry::Checkpoint {
            lsn: self.master,
            pending,
        };
        self.write_log(entry)?;
        self.wal.flush()?;

        self.pool.save(&self.snapshot_path(), self.master)?;
        debug!(
            "checkpoint at lsn {} with {} active transactions",
            self.master,
            self.active.len()
        );
        Ok(())
    }

    /// Flush any pending log entries and shut down.
    pub fn close(mut self) -> Result<()> {
        self.wal.flush()
    }
}
