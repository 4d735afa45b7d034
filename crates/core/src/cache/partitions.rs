//! Partition lifecycle: open, enumerate, delete.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

/// A stored partition with its entry count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PartitionInfo {
    pub name: String,
    pub created_at: String,
    pub entries: u64,
}

/// Look up a partition id, creating the partition if missing.
pub(crate) fn ensure_partition(conn: &rusqlite::Connection, name: &str) -> Result<i64, Error> {
    conn.execute(
        "INSERT INTO partitions (name, created_at) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING",
        params![name, chrono::Utc::now().to_rfc3339()],
    )?;
    let id = conn.query_row("SELECT id FROM partitions WHERE name = ?1", params![name], |row| row.get(0))?;
    Ok(id)
}

impl CacheDb {
    /// Open a partition by name, creating it if it doesn't exist.
    pub async fn open_partition(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                ensure_partition(conn, &name)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// All partition names in creation order.
    pub async fn partition_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY id ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// All partitions with their entry counts, in creation order.
    pub async fn partitions(&self) -> Result<Vec<PartitionInfo>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<PartitionInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT p.name, p.created_at, COUNT(e.key)
                     FROM partitions p LEFT JOIN entries e ON e.partition_id = p.id
                     GROUP BY p.id ORDER BY p.id ASC",
                )?;
                let infos = stmt
                    .query_map([], |row| {
                        Ok(PartitionInfo {
                            name: row.get(0)?,
                            created_at: row.get(1)?,
                            entries: row.get::<_, i64>(2)? as u64,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(infos)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn has_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let found = conn
                    .query_row("SELECT 1 FROM partitions WHERE name = ?1", params![name], |_| Ok(()))
                    .optional()?;
                Ok(found.is_some())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a partition and every entry in it.
    ///
    /// Returns false if no partition had that name.
    pub async fn delete_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM partitions WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_partition("safetrack-v1.1").await.unwrap();
        db.open_partition("safetrack-v1.1").await.unwrap();

        assert_eq!(db.partition_names().await.unwrap(), vec!["safetrack-v1.1".to_string()]);
    }

    #[tokio::test]
    async fn test_names_in_creation_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_partition("safetrack-v1.1").await.unwrap();
        db.open_partition("safetrack-runtime-v1.1").await.unwrap();
        db.open_partition("a-first-alphabetically").await.unwrap();

        let names = db.partition_names().await.unwrap();
        assert_eq!(names, vec!["safetrack-v1.1", "safetrack-runtime-v1.1", "a-first-alphabetically"]);
    }

    #[tokio::test]
    async fn test_delete_partition() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_partition("safetrack-v1.0").await.unwrap();

        assert!(db.has_partition("safetrack-v1.0").await.unwrap());
        assert!(db.delete_partition("safetrack-v1.0").await.unwrap());
        assert!(!db.has_partition("safetrack-v1.0").await.unwrap());
        assert!(!db.delete_partition("safetrack-v1.0").await.unwrap());
    }

    #[tokio::test]
    async fn test_partitions_empty_counts() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_partition("safetrack-v1.1").await.unwrap();

        let infos = db.partitions().await.unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].entries, 0);
    }
}
