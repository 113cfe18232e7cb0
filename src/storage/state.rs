//! State storage: the reconciled state blob in `SQLite`.
//!
//! The whole store is one JSON document in a single-row table. Each event is a
//! read-merge-write inside a `BEGIN IMMEDIATE` transaction, so concurrent
//! writers (threads or processes) serialize instead of losing each other's
//! updates. Readers see the last committed blob; a reader that collides with a
//! commit retries until the busy timeout.

use std::time::Duration;

use rusqlite::{Connection, ErrorCode, OptionalExtension, TransactionBehavior};
use tracing::{debug, info, warn};

use crate::model::{Event, StateStore};
use crate::reconcile::{self, Outcome};

use super::{Result, Storage, StorageError};

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS state (
        id   INTEGER PRIMARY KEY CHECK (id = 0),
        blob TEXT NOT NULL
    );
";

impl Storage {
    /// Applies one event atomically.
    ///
    /// Nothing is written when the event turns out to be a no-op.
    pub fn apply_event(&self, event: &Event) -> Result<Outcome> {
        let mut conn = self.open_state()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute_batch(SCHEMA)?;

        let mut state = read_state(&tx)?;
        let outcome = reconcile::apply(&mut state, event);

        if outcome.changed() {
            write_state(&tx, &state)?;
            tx.commit()?;
            info!(
                kind = event.kind(),
                project = %event.project(),
                git_ref = event.ref_name(),
                ?outcome,
                "applied event"
            );
        } else {
            tx.rollback()?;
            debug!(
                kind = event.kind(),
                project = %event.project(),
                git_ref = event.ref_name(),
                ?outcome,
                "event ignored"
            );
        }
        Ok(outcome)
    }

    /// Loads a snapshot of the state store.
    ///
    /// A missing, foreign, or damaged database is an empty store.
    pub fn load_state(&self) -> Result<StateStore> {
        if !self.state_path().exists() {
            return Ok(StateStore::default());
        }
        let conn = self.open_state()?;
        let loaded = match has_state_table(&conn) {
            Ok(true) => read_state(&conn),
            Ok(false) => Ok(StateStore::default()),
            Err(e) => Err(e.into()),
        };
        match loaded {
            Err(StorageError::Sqlite(rusqlite::Error::SqliteFailure(e, _)))
                if matches!(e.code, ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt) =>
            {
                warn!(
                    path = %self.state_path().display(),
                    error = %e,
                    "state database is unreadable, starting from empty"
                );
                Ok(StateStore::default())
            }
            other => other,
        }
    }

    fn open_state(&self) -> Result<Connection> {
        let conn = Connection::open(self.state_path())?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }
}

fn has_state_table(conn: &Connection) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'state')",
        [],
        |row| row.get(0),
    )
}

/// Reads the state blob. An unparseable blob is treated as empty.
fn read_state(conn: &Connection) -> Result<StateStore> {
    let blob: Option<String> = conn
        .query_row("SELECT blob FROM state WHERE id = 0", [], |row| row.get(0))
        .optional()?;

    let Some(json) = blob else {
        return Ok(StateStore::default());
    };

    match StateStore::from_json(&json) {
        Ok(state) => Ok(state),
        Err(e) => {
            warn!(error = %e, "state blob is corrupt, starting from empty");
            Ok(StateStore::default())
        }
    }
}

fn write_state(conn: &Connection, state: &StateStore) -> Result<()> {
    let json = state.to_json()?;
    conn.execute(
        "INSERT INTO state (id, blob) VALUES (0, ?1)
         ON CONFLICT (id) DO UPDATE SET blob = excluded.blob",
        rusqlite::params![json],
    )?;
    Ok(())
}
