//! Core transaction types

use crate::entry::LogEntry;

/// Log Sequence Number: unique, monotonically increasing identifier
/// ordering every durable event.
pub type Lsn = u64;

/// Transaction id. Caller-supplied and opaque to the engine; any
/// whitespace-free token works.
pub type TxnId = String;

/// An in-flight transaction and the log entries it has produced so far.
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Transaction id
    pub id: TxnId,
    /// The Begin entry plus every Update, in the order they were logged.
    /// Drives abort-time undo and checkpoint reporting.
    pub entries: Vec<LogEntry>,
}

impl Transaction {
    pub fn new(id: TxnId, begin: LogEntry) -> Self {
        Self {
            id,
            entries: vec![begin],
        }
    }
}
