//! Persistent lifecycle state per generation.

use super::connection::CacheDb;
use crate::Error;
use crate::generation::GenerationState;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::OptionalExtension;

impl CacheDb {
    /// Record the state of a generation, inserting it if new.
    pub async fn set_generation_state(&self, version: &str, state: GenerationState) -> Result<(), Error> {
        let version = version.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO generations (version, state, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(version) DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at",
                    params![version, state.as_str(), chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// State of a generation, or None if it was never installed.
    pub async fn generation_state(&self, version: &str) -> Result<Option<GenerationState>, Error> {
        let version = version.to_string();
        let state = self
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let state = conn
                    .query_row("SELECT state FROM generations WHERE version = ?1", params![version], |row| {
                        row.get(0)
                    })
                    .optional()?;
                Ok(state)
            })
            .await
            .map_err(Error::from)?;

        state.map(|s| s.parse()).transpose()
    }

    /// The version currently marked active, if any.
    pub async fn active_generation(&self) -> Result<Option<String>, Error> {
        self.conn
            .call(|conn| -> Result<Option<String>, Error> {
                let version = conn
                    .query_row(
                        "SELECT version FROM generations WHERE state = 'active' ORDER BY updated_at DESC LIMIT 1",
                        [],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(version)
            })
            .await
            .map_err(Error::from)
    }

    /// Make `version` the only active generation.
    ///
    /// Any other active generation becomes redundant in the same transaction.
    pub async fn mark_active(&self, version: &str) -> Result<(), Error> {
        let version = version.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let now = chrono::Utc::now().to_rfc3339();
                let tx = conn.transaction()?;
                tx.execute(
                    "UPDATE generations SET state = 'redundant', updated_at = ?2
                     WHERE state = 'active' AND version != ?1",
                    params![version, now],
                )?;
                tx.execute(
                    "INSERT INTO generations (version, state, updated_at) VALUES (?1, 'active', ?2)
                     ON CONFLICT(version) DO UPDATE SET state = 'active', updated_at = excluded.updated_at",
                    params![version, now],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
