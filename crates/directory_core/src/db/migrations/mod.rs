//! Directory schema versions.
//!
//! Each schema step is an embedded `.sql` file. `PRAGMA user_version` holds
//! the last applied step, so a database file records which steps it has seen.
//!
//! # Invariants
//! - Step versions are strictly increasing, starting at 1.
//! - All pending steps of one upgrade commit together or not at all.
//! - A file stamped with a version above [`latest_version`] is never touched.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "init",
        sql: include_str!("0001_init.sql"),
    },
    SchemaStep {
        version: 2,
        name: "indexes",
        sql: include_str!("0002_indexes.sql"),
    },
];

/// Schema version this binary reads and writes.
pub fn latest_version() -> u32 {
    target_version(SCHEMA_STEPS)
}

/// Brings the connection's schema up to [`latest_version`].
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    upgrade(conn, SCHEMA_STEPS)
}

/// Reads the applied schema version from `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Returns the stored schema version, rejecting files from a newer binary.
///
/// Older or unmigrated files pass; callers that need the latest schema
/// check for it themselves.
pub fn ensure_supported_version(conn: &Connection) -> DbResult<u32> {
    supported_version(conn, latest_version())
}

fn target_version(steps: &[SchemaStep]) -> u32 {
    steps.last().map_or(0, |step| step.version)
}

fn supported_version(conn: &Connection, latest_supported: u32) -> DbResult<u32> {
    let db_version = current_user_version(conn)?;
    if db_version > latest_supported {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        });
    }
    Ok(db_version)
}

fn upgrade(conn: &mut Connection, steps: &[SchemaStep]) -> DbResult<()> {
    let target = target_version(steps);
    let from = supported_version(conn, target)?;
    let pending = steps
        .iter()
        .filter(|step| step.version > from)
        .collect::<Vec<_>>();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in pending {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        from, target
    );
    Ok(())
}
