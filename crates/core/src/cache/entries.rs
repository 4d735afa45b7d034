//! Entry storage and exact-match lookup.
//!
//! `put` replaces any entry with the same key in the same partition.
//! `match_any` searches partitions in creation order and returns the
//! first hit.

use super::connection::CacheDb;
use super::partitions::ensure_partition;
use crate::Error;
use crate::request::{Request, Response};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

/// A stored response together with where and when it was captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEntry {
    pub partition: String,
    pub stored_at: String,
    pub response: Response,
}

/// Listing row for inspection tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EntrySummary {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub size: u64,
    pub stored_at: String,
}

fn insert_entry(
    conn: &rusqlite::Connection, partition_id: i64, request: &Request, response: &Response,
) -> Result<(), Error> {
    let headers_json =
        serde_json::to_string(&response.headers).map_err(|e| Error::InvalidInput(format!("headers: {e}")))?;
    conn.execute(
        "INSERT INTO entries (partition_id, key, method, url, status, headers_json, body, stored_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(partition_id, key) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status = excluded.status,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            partition_id,
            request.key(),
            request.method.to_ascii_uppercase(),
            request.url.as_str(),
            response.status,
            headers_json,
            &response.body,
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, String, u16, String, Vec<u8>)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
}

fn decode_entry(raw: (String, String, String, u16, String, Vec<u8>)) -> Result<CachedEntry, Error> {
    let (partition, stored_at, url, status, headers_json, body) = raw;
    let headers: Vec<(String, String)> =
        serde_json::from_str(&headers_json).map_err(|e| Error::InvalidInput(format!("stored headers: {e}")))?;
    Ok(CachedEntry { partition, stored_at, response: Response { url, status, headers, body } })
}

impl CacheDb {
    /// Store a response under the request's key, replacing any previous entry.
    ///
    /// The partition is created if missing.
    pub async fn put(&self, partition: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let partition = partition.to_string();
        let request = request.clone();
        let response = response.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let id = ensure_partition(conn, &partition)?;
                insert_entry(conn, id, &request, &response)
            })
            .await
            .map_err(Error::from)
    }

    /// Store a batch of entries in one transaction: all or nothing.
    pub async fn put_all(&self, partition: &str, batch: Vec<(Request, Response)>) -> Result<usize, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.transaction()?;
                let id = ensure_partition(&tx, &partition)?;
                for (request, response) in &batch {
                    insert_entry(&tx, id, request, response)?;
                }
                tx.commit()?;
                Ok(batch.len())
            })
            .await
            .map_err(Error::from)
    }

    /// Exact-match lookup within one partition.
    pub async fn match_in(&self, partition: &str, request: &Request) -> Result<Option<CachedEntry>, Error> {
        let partition = partition.to_string();
        let key = request.key();
        let raw = self
            .conn
            .call(move |conn| -> Result<_, Error> {
                let raw = conn
                    .query_row(
                        "SELECT p.name, e.stored_at, e.url, e.status, e.headers_json, e.body
                         FROM entries e JOIN partitions p ON p.id = e.partition_id
                         WHERE p.name = ?1 AND e.key = ?2",
                        params![partition, key],
                        row_to_entry,
                    )
                    .optional()?;
                Ok(raw)
            })
            .await
            .map_err(Error::from)?;

        raw.map(decode_entry).transpose()
    }

    /// Exact-match lookup across every partition, oldest partition first.
    pub async fn match_any(&self, request: &Request) -> Result<Option<CachedEntry>, Error> {
        let key = request.key();
        let raw = self
            .conn
            .call(move |conn| -> Result<_, Error> {
                let raw = conn
                    .query_row(
                        "SELECT p.name, e.stored_at, e.url, e.status, e.headers_json, e.body
                         FROM entries e JOIN partitions p ON p.id = e.partition_id
                         WHERE e.key = ?1
                         ORDER BY p.id ASC LIMIT 1",
                        params![key],
                        row_to_entry,
                    )
                    .optional()?;
                Ok(raw)
            })
            .await
            .map_err(Error::from)?;

        raw.map(decode_entry).transpose()
    }

    /// List entries in a partition, ordered by URL.
    pub async fn entries(&self, partition: &str) -> Result<Vec<EntrySummary>, Error> {
        let partition = partition.to_string();
        let rows = self
            .conn
            .call(move |conn| -> Result<Vec<(String, String, u16, String, u64, String)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.method, e.url, e.status, e.headers_json, LENGTH(e.body), e.stored_at
                     FROM entries e JOIN partitions p ON p.id = e.partition_id
                     WHERE p.name = ?1 ORDER BY e.url ASC, e.method ASC",
                )?;
                let rows = stmt
                    .query_map(params![partition], |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get::<_, i64>(4)? as u64, row.get(5)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter()
            .map(|(method, url, status, headers_json, size, stored_at)| {
                let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)
                    .map_err(|e| Error::InvalidInput(format!("stored headers: {e}")))?;
                let content_type = headers
                    .iter()
                    .find(|(n, _)| n.eq_ignore_ascii_case("content-type"))
                    .map(|(_, v)| v.clone());
                Ok(EntrySummary { method, url, status, content_type, size, stored_at })
            })
            .collect()
    }

    pub async fn entry_count(&self, partition: &str) -> Result<u64, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries e JOIN partitions p ON p.id = e.partition_id WHERE p.name = ?1",
                    params![partition],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Destination;
    use url::Url;

    fn url(path: &str) -> Url {
        Url::parse("https://safetrack.app").unwrap().join(path).unwrap()
    }

    fn response(path: &str, body: &str) -> Response {
        Response::new(url(path).as_str(), 200, body).with_header("content-type", "text/plain")
    }

    #[tokio::test]
    async fn test_put_and_match_in() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let req = Request::asset(url("/app.js"), Destination::Script);

        db.put("safetrack-runtime-v1.1", &req, &response("/app.js", "one")).await.unwrap();

        let hit = db.match_in("safetrack-runtime-v1.1", &req).await.unwrap().unwrap();
        assert_eq!(hit.partition, "safetrack-runtime-v1.1");
        assert_eq!(hit.response.body, b"one");
        assert_eq!(hit.response.content_type(), Some("text/plain"));
        assert!(db.match_in("safetrack-v1.1", &req).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_replaces() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let req = Request::get(url("/app.css"));

        db.put("runtime", &req, &response("/app.css", "old")).await.unwrap();
        db.put("runtime", &req, &response("/app.css", "new")).await.unwrap();

        let hit = db.match_in("runtime", &req).await.unwrap().unwrap();
        assert_eq!(hit.response.body, b"new");
        assert_eq!(db.entry_count("runtime").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_match_any_prefers_oldest_partition() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let req = Request::get(url("/"));

        db.open_partition("precache").await.unwrap();
        db.open_partition("runtime").await.unwrap();
        db.put("runtime", &req, &response("/", "runtime copy")).await.unwrap();
        db.put("precache", &req, &response("/", "precache copy")).await.unwrap();

        let hit = db.match_any(&req).await.unwrap().unwrap();
        assert_eq!(hit.partition, "precache");
        assert_eq!(hit.response.body, b"precache copy");
    }

    #[tokio::test]
    async fn test_match_any_miss() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.match_any(&Request::get(url("/nope"))).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_method_is_part_of_key() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let get = Request::get(url("/data.json"));
        db.put("runtime", &get, &response("/data.json", "{}")).await.unwrap();

        let head = get.clone().with_method("HEAD");
        assert!(db.match_any(&head).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_all_and_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let batch = ["/", "/index.html"]
            .iter()
            .map(|p| (Request::get(url(p)), response(p, "shell")))
            .collect();

        assert_eq!(db.put_all("safetrack-v1.1", batch).await.unwrap(), 2);

        let entries = db.entries("safetrack-v1.1").await.unwrap();
        let urls: Vec<_> = entries.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, vec!["https://safetrack.app/", "https://safetrack.app/index.html"]);
        assert_eq!(entries[0].size, 5);
        assert_eq!(entries[0].content_type.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_delete_partition_cascades_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let req = Request::get(url("/"));
        db.put("old", &req, &response("/", "x")).await.unwrap();

        db.delete_partition("old").await.unwrap();

        assert!(db.match_any(&req).await.unwrap().is_none());
        assert_eq!(db.entry_count("old").await.unwrap(), 0);
    }
}
