//! In-memory stand-ins for the external services, used by unit tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::calendar::CalendarSource;
use crate::cdn::CdnInvalidator;
use crate::github::{RepositorySource, TreeListing};
use crate::storage::ObjectStore;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutRecord {
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
}

#[derive(Default)]
pub struct MockObjectStore {
    puts: Mutex<Vec<PutRecord>>,
    failing: HashSet<String>,
}

impl MockObjectStore {
    pub fn failing_on(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    pub fn puts(&self) -> Vec<PutRecord> {
        self.puts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        if self.failing.contains(key) {
            return Err(Error::StorageWrite(format!("AccessDenied: {}", key)));
        }
        self.puts.lock().unwrap().push(PutRecord {
            key: key.to_string(),
            body,
            content_type: content_type.to_string(),
        });
        Ok(())
    }
}

/// Repository whose files contain their own path as bytes.
pub struct MockRepository {
    listing: Option<TreeListing>,
    failing: HashSet<String>,
    list_calls: Mutex<u32>,
    fetched: Mutex<Vec<String>>,
}

impl MockRepository {
    pub fn new(listing: TreeListing) -> Self {
        Self {
            listing: Some(listing),
            failing: HashSet::new(),
            list_calls: Mutex::new(0),
            fetched: Mutex::new(Vec::new()),
        }
    }

    /// A repository whose tree listing always fails.
    pub fn unavailable() -> Self {
        Self {
            listing: None,
            ..Self::new(TreeListing::default())
        }
    }

    pub fn failing_on(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    pub fn list_calls(&self) -> u32 {
        *self.list_calls.lock().unwrap()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl RepositorySource for MockRepository {
    async fn list_tree(&self) -> Result<TreeListing> {
        *self.list_calls.lock().unwrap() += 1;
        match &self.listing {
            Some(listing) => Ok(TreeListing {
                entries: listing.entries.clone(),
                truncated: listing.truncated,
            }),
            None => Err(Error::RepositoryList("GitHub API returned 404 Not Found".to_string())),
        }
    }

    async fn fetch_file(&self, path: &str) -> Result<Vec<u8>> {
        self.fetched.lock().unwrap().push(path.to_string());
        if self.failing.contains(path) {
            return Err(Error::RepositoryFileFetch(format!("{}: HTTP 404 Not Found", path)));
        }
        Ok(path.as_bytes().to_vec())
    }
}

pub struct MockCalendar {
    response: Option<serde_json::Value>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockCalendar {
    pub fn returning(response: serde_json::Value) -> Self {
        Self {
            response: Some(response),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarSource for MockCalendar {
    async fn fetch_events(&self, calendar_id: &str, api_key: &str) -> Result<serde_json::Value> {
        self.calls
            .lock()
            .unwrap()
            .push((calendar_id.to_string(), api_key.to_string()));
        self.response
            .clone()
            .ok_or_else(|| Error::CalendarFetch("Calendar API returned 403 Forbidden".to_string()))
    }
}

#[derive(Default)]
pub struct MockCdn {
    references: Mutex<Vec<String>>,
    fail: bool,
}

impl MockCdn {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn references(&self) -> Vec<String> {
        self.references.lock().unwrap().clone()
    }
}

#[async_trait]
impl CdnInvalidator for MockCdn {
    async fn invalidate_all(&self, caller_reference: &str) -> Result<Option<String>> {
        self.references
            .lock()
            .unwrap()
            .push(caller_reference.to_string());
        if self.fail {
            return Err(Error::Invalidation("AccessDenied".to_string()));
        }
        Ok(Some("I2J0I21PCUYOIK".to_string()))
    }
}

/// Plain HTTP/1.1 server on 127.0.0.1 answering each connection with the
/// next canned `(status, body)` and recording the request heads.
pub struct StubServer {
    pub base_url: String,
    handle: JoinHandle<Vec<String>>,
}

impl StubServer {
    pub async fn start(responses: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let mut heads = Vec::new();
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();

                let mut request: Vec<u8> = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                }
                heads.push(String::from_utf8_lossy(&request).into_owned());

                let response = format!(
                    "HTTP/1.1 {} Stub\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
            heads
        });

        Self { base_url, handle }
    }

    /// Request heads, in arrival order, once every response was served.
    pub async fn requests(self) -> Vec<String> {
        self.handle.await.unwrap()
    }
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
