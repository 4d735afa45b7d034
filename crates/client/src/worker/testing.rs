//! Test doubles for controller tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio_rusqlite::Connection;
use url::Url;

use safetrack_core::{CacheDb, CacheNames, Error, NotificationConfig, Request, Response, Scope};

use super::{CacheController, ControllerConfig};
use crate::network::Network;

pub(crate) const ORIGIN: &str = "https://safetrack.app";

pub(crate) fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

pub(crate) fn config(version: &str) -> ControllerConfig {
    ControllerConfig {
        names: CacheNames::new("safetrack", version),
        scope: Scope::new(Url::parse(ORIGIN).unwrap(), vec!["/functions/".into(), "/auth/".into()]),
        precache: vec!["/".into(), "/index.html".into(), "/manifest.json".into(), "/favicon.svg".into()],
        app_shell: "/".into(),
        notification: NotificationConfig::default(),
    }
}

/// Network that answers from a route table; unknown URLs fail like an
/// unreachable host.
#[derive(Default)]
pub(crate) struct StubNetwork {
    routes: Mutex<HashMap<String, Option<Response>>>,
    calls: Mutex<Vec<String>>,
}

impl StubNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with `status` for `path`, replacing any previous route.
    pub(crate) fn respond(&self, path: &str, status: u16, body: &str) {
        let url = url(path);
        let response = Response::new(url.as_str(), status, body).with_header("content-type", "text/plain");
        self.routes.lock().unwrap().insert(url.to_string(), Some(response));
    }

    /// Make `path` fail at the transport layer.
    pub(crate) fn fail(&self, path: &str) {
        self.routes.lock().unwrap().insert(url(path).to_string(), None);
    }

    /// Take the whole network offline.
    pub(crate) fn offline(&self) {
        for route in self.routes.lock().unwrap().values_mut() {
            *route = None;
        }
    }

    /// How many live fetches hit `path`.
    pub(crate) fn calls(&self, path: &str) -> usize {
        let target = url(path).to_string();
        self.calls.lock().unwrap().iter().filter(|u| **u == target).count()
    }

    pub(crate) fn shell(&self) {
        for path in ["/", "/index.html", "/manifest.json", "/favicon.svg"] {
            self.respond(path, 200, &format!("precached {path}"));
        }
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let key = request.url.to_string();
        self.calls.lock().unwrap().push(key.clone());
        match self.routes.lock().unwrap().get(&key) {
            Some(Some(response)) => Ok(response.clone()),
            _ => Err(Error::Network(format!("{key}: connection refused"))),
        }
    }
}

/// Controller for generation `v1.1` over a fresh in-memory database.
pub(crate) async fn controller(network: StubNetwork) -> (CacheController<StubNetwork>, Arc<StubNetwork>) {
    let db = CacheDb::open_in_memory().await.unwrap();
    let network = Arc::new(network);
    (CacheController::new(config("v1.1"), db, Arc::clone(&network)), network)
}

/// Controller for `version` sharing an existing database and network.
pub(crate) fn generation(
    version: &str, db: &CacheDb, network: &Arc<StubNetwork>,
) -> CacheController<StubNetwork> {
    CacheController::new(config(version), db.clone(), Arc::clone(network))
}

/// Controller for `v1.1` over a database file, plus a second connection to
/// the same file for planting storage failures. Keep the `TempDir` alive.
pub(crate) async fn file_controller(
    network: StubNetwork,
) -> (CacheController<StubNetwork>, Arc<StubNetwork>, Connection, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sw-cache.sqlite");
    let db = CacheDb::open(&path).await.unwrap();
    let side = Connection::open(&path).await.unwrap();
    let network = Arc::new(network);
    (CacheController::new(config("v1.1"), db, Arc::clone(&network)), network, side, dir)
}

/// Run raw SQL on a side connection.
pub(crate) async fn exec(conn: &Connection, sql: &'static str) {
    conn.call(move |conn| conn.execute_batch(sql)).await.unwrap();
}
