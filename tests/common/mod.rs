// Shared helpers for integration tests.
// A mock upstream API served on an ephemeral port and an instrumented cache store.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use tracing_subscriber::EnvFilter;

use catalog_cache::cache::{Cache, MemoryCache};
use catalog_cache::catalog::{PopulateOptions, Populator};
use catalog_cache::error::{Error, Result};
use catalog_cache::upstream::CatalogClient;

pub const PUBLIC_KEY: &str = "asd";
pub const PRIVATE_KEY: &str = "qwe";

pub const SINGLE_RESULT: &str =
    r#"{"data": { "results": [{"id": 1011334, "name": "lorem", "description": "asd"}] }}"#;

/// Route test logs to the test writer.
pub fn setup() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("catalog_cache=trace"))
        .with_target(false)
        .with_test_writer()
        .try_init()
        .ok();
}

/// Envelope body holding items with the given ids.
pub fn results_body(ids: impl IntoIterator<Item = u64>) -> String {
    let results: Vec<_> = ids
        .into_iter()
        .map(|id| serde_json::json!({"id": id, "name": format!("item {}", id), "description": ""}))
        .collect();
    serde_json::json!({"data": {"results": results}}).to_string()
}

#[derive(Default)]
struct MockState {
    routes: Mutex<HashMap<String, (StatusCode, String)>>,
    requests: Mutex<Vec<(String, HashMap<String, String>)>>,
}

async fn respond(State(state): State<Arc<MockState>>, uri: Uri) -> (StatusCode, String) {
    let query = uri
        .query()
        .map(|q| {
            q.split('&')
                .filter_map(|pair| pair.split_once('='))
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
        .unwrap_or_default();
    state
        .requests
        .lock()
        .unwrap()
        .push((uri.path().to_string(), query));

    state
        .routes
        .lock()
        .unwrap()
        .get(uri.path())
        .cloned()
        .unwrap_or((StatusCode::NOT_FOUND, String::new()))
}

/// Upstream API double. Unknown paths answer 404. Stops serving when dropped.
pub struct MockUpstream {
    state: Arc<MockState>,
    socket: SocketAddr,
    handle: tokio::task::JoinHandle<()>,
}

impl MockUpstream {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new().fallback(respond).with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let socket = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            socket,
            handle,
        }
    }

    pub fn reply(&self, path: &str, status: u16, body: &str) {
        self.state.routes.lock().unwrap().insert(
            path.to_string(),
            (StatusCode::from_u16(status).unwrap(), body.to_string()),
        );
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.socket)
    }

    pub fn client(&self) -> CatalogClient {
        CatalogClient::new(&self.url(), PUBLIC_KEY, PRIVATE_KEY, Duration::from_secs(2)).unwrap()
    }

    /// Path and query parameters of every request received so far.
    pub fn requests(&self) -> Vec<(String, HashMap<String, String>)> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Cache store that counts writes, tracks concurrent writers, and can fail chosen keys.
#[derive(Default)]
pub struct RecordingCache {
    inner: MemoryCache,
    write_delay: Duration,
    failing_keys: HashSet<String>,
    writes: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold each write for `delay` so concurrent writers overlap.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    pub fn failing_on(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    /// Keys passed to `set`/`set_if_absent`, in call order.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    pub fn peak_writers(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub async fn seed(&self, key: &str, value: &str) {
        self.inner
            .set(key, value, Duration::from_secs(60))
            .await
            .unwrap();
    }

    async fn record_write(&self, key: &str) -> Result<()> {
        self.writes.lock().unwrap().push(key.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.write_delay.is_zero() {
            tokio::time::sleep(self.write_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_keys.contains(key) {
            return Err(Error::Store(format!("refused write of {}", key)));
        }
        Ok(())
    }
}

#[async_trait]
impl Cache for RecordingCache {
    async fn exists(&self, key: &str) -> Result<bool> {
        self.inner.exists(key).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.record_write(key).await?;
        self.inner.set(key, value, ttl).await
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        self.record_write(key).await?;
        self.inner.set_if_absent(key, value, ttl).await
    }
}

pub fn populator(upstream: &MockUpstream, cache: &Arc<RecordingCache>) -> Populator<RecordingCache> {
    Populator::new(upstream.client(), Arc::clone(cache), PopulateOptions::new())
}
