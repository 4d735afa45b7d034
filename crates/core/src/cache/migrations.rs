//! Partition store schema.
//!
//! The applied schema version lives in SQLite's `user_version` header, so a
//! store opened by an older build is upgraded in place. Each step runs in its
//! own transaction together with the version bump.

use tokio_rusqlite::Connection;
use tokio_rusqlite::rusqlite;

use super::Error;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA: &[Migration] = &[
    Migration { version: 1, name: "partitions", sql: include_str!("../../migrations/001_partitions.sql") },
    Migration { version: 2, name: "generations", sql: include_str!("../../migrations/002_generations.sql") },
];

/// Schema version a fully migrated store reports.
pub const SCHEMA_VERSION: i64 = 2;

fn user_version(conn: &rusqlite::Connection) -> Result<i64, Error> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Bring the store up to [`SCHEMA_VERSION`].
///
/// # Errors
///
/// Returns `MigrationFailed` naming the step whose SQL was rejected. Earlier
/// steps stay applied.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        let current = user_version(conn)?;
        if current > SCHEMA_VERSION {
            return Err(Error::MigrationFailed(format!(
                "store is at schema {current}, this build knows {SCHEMA_VERSION}"
            )));
        }

        for step in SCHEMA.iter().filter(|m| m.version > current) {
            let tx = conn.transaction()?;
            tx.execute_batch(step.sql)
                .map_err(|e| Error::MigrationFailed(format!("{} ({}): {e}", step.name, step.version)))?;
            tx.pragma_update(None, "user_version", step.version)?;
            tx.commit()?;
            tracing::info!(version = step.version, name = step.name, "applied schema migration");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}

/// Schema version recorded in the store.
pub async fn schema_version(conn: &Connection) -> Result<i64, Error> {
    conn.call(|conn| -> Result<i64, Error> { user_version(conn) })
        .await
        .map_err(Error::from)
}
