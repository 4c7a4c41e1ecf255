//! Crash recovery: a single forward pass over the durable log.
//!
//! Runs once at startup, only when the loaded master LSN is greater than
//! zero. Entries below the master are already reflected in the snapshot and
//! are skipped; the first entry at or after it must be the checkpoint that
//! set it, anything else means the log and the master record disagree and
//! recovery fails fatally.
//!
//! The checkpoint's declared entry count is a countdown separating the
//! re-serialized pre-checkpoint entries of then-active transactions from
//! the tail the engine appended afterwards. Every replayed entry decrements
//! it; on the exact transition to zero, every transaction still open is
//! force-aborted, since it never reached commit or abort before the crash.

use std::fs::File;
use std::io::{BufRead, BufReader};

use log::{debug, info, warn};

use crate::entry::LogLine;
use crate::error::{Result, SlateError};
use crate::manager::TransactionManager;

/// Replay the durable log against the freshly loaded snapshot.
pub(crate) fn replay(manager: &mut TransactionManager) -> Result<()> {
    if manager.master() == 0 {
        return Ok(());
    }

    info!("start recovering from master lsn {}", manager.master());
    manager.recovering = true;
    let result = replay_log(manager);
    manager.recovering = false;

    if result.is_ok() {
        info!(
            "recovery complete, next lsn {}, {} transactions still active",
            manager.current_lsn() + 1,
            manager.active_count()
        );
    }
    result
}

fn replay_log(manager: &mut TransactionManager) -> Result<()> {
    let path = manager.wal_path();
    let file = File::open(&path).map_err(|e| {
        SlateError::Recovery(format!(
            "master lsn is {} but log {} cannot be opened: {}",
            manager.master(),
            path.display(),
            e
        ))
    })?;
    let reader = BufReader::new(file);

    let mut found_checkpoint = false;
    // Physical entries still belonging to the checkpointed active state.
    // Signed: the declared count can be overrun without ever hitting zero.
    let mut countdown: i64 = 0;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let parsed = match LogLine::parse(&line) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("skipping malformed log line {:?}: {}", line, e);
                continue;
            }
        };

        if !found_checkpoint {
            if parsed.lsn() < manager.master() {
                continue;
            }
            match parsed {
                LogLine::Checkpoint { entry_count, .. } => {
                    found_checkpoint = true;
                    countdown = entry_count as i64;
                    continue;
                }
                _ => {
                    return Err(SlateError::Recovery(
                        "should got a checkpoint log entry".to_string(),
                    ));
                }
            }
        }

        manager.bump_lsn(parsed.lsn());

        let result = match &parsed {
            LogLine::Begin { txn_id, .. } => manager.begin(txn_id),
            LogLine::Commit { txn_id, .. } => manager.commit(txn_id),
            LogLine::Abort { txn_id, .. } => manager.abort(txn_id),
            LogLine::Update {
                txn_id, key, new_value, ..
            } => manager.set(txn_id, key, new_value),
            // A checkpoint in the tail means the process died between
            // logging it and rewriting the snapshot; nothing to re-drive.
            LogLine::Checkpoint { .. } => Ok(()),
        };
        match result {
            Ok(()) => {}
            // Expected for entries of transactions already resolved, e.g.
            // updates logged after the force-abort boundary.
            Err(SlateError::Transaction(msg)) => debug!("replay skipped: {}", msg),
            Err(e) => return Err(e),
        }

        countdown -= 1;
        if countdown == 0 {
            // Boundary between the checkpointed state and the
            // post-checkpoint tail.
            for txn_id in manager.active_ids() {
                info!("force aborting in-flight transaction {}", txn_id);
                manager.abort(&txn_id)?;
            }
        }
    }

    Ok(())
}
