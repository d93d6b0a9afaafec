//! Mock collaborators for sync session tests.
//!
//! Every mock counts its calls with atomics so tests can assert on exact
//! interaction counts after `stop()` has joined the worker.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sync_worker::{
    ChangesetEvent, ClientDirectory, ClientHandle, ClientIdentity, MediaClient, StreamConnection,
    StreamEvent, StreamTransport, SyncHost, TransportError,
};
use url::Url;

pub const ADDRESS: &str = "http://192.168.1.50:32400";
pub const TOKEN: &str = "test-token";

/// Identity for a stream-capable (owned) or poll-only client
pub fn identity(owned: bool) -> ClientIdentity {
    ClientIdentity::new(owned, "Test Server", ADDRESS, "device-1", TOKEN)
}

/// Block until `condition` holds or `timeout` elapses; returns the final result
pub fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// Mock remote server client
#[derive(Default)]
pub struct MockClient {
    present: AtomicBool,
    /// Number of future scans that will report pending changes
    pending_scans: AtomicU32,
    last_scan_pending: AtomicBool,
    pub scans: AtomicU32,
    pub updates: AtomicU32,
}

impl MockClient {
    pub fn new(present: bool) -> Arc<Self> {
        let client = Self::default();
        client.present.store(present, Ordering::SeqCst);
        Arc::new(client)
    }

    /// Make the next `count` scans report pending changes
    pub fn with_pending_scans(self: Arc<Self>, count: u32) -> Arc<Self> {
        self.pending_scans.store(count, Ordering::SeqCst);
        self
    }

    pub fn updates(&self) -> u32 {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn scans(&self) -> u32 {
        self.scans.load(Ordering::SeqCst)
    }
}

impl MediaClient for MockClient {
    fn presence(&self) -> bool {
        self.present.load(Ordering::SeqCst)
    }

    fn scan_sections(&self) {
        self.scans.fetch_add(1, Ordering::SeqCst);
        let pending = self
            .pending_scans
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        self.last_scan_pending.store(pending, Ordering::SeqCst);
    }

    fn needs_update(&self) -> bool {
        self.last_scan_pending.load(Ordering::SeqCst)
    }

    fn update_sections(&self) {
        self.updates.fetch_add(1, Ordering::SeqCst);
    }
}

/// Mock client registry keyed by address
#[derive(Default)]
pub struct MockDirectory {
    clients: Mutex<HashMap<String, Arc<MockClient>>>,
    pub lookups: AtomicU32,
}

impl MockDirectory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_client(address: &str, client: Arc<MockClient>) -> Arc<Self> {
        let directory = Self::new();
        directory.register(address, client);
        directory
    }

    pub fn register(&self, address: &str, client: Arc<MockClient>) {
        self.clients
            .lock()
            .unwrap()
            .insert(address.to_string(), client);
    }

    pub fn unregister(&self, address: &str) {
        self.clients.lock().unwrap().remove(address);
    }

    pub fn lookups(&self) -> u32 {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl ClientDirectory for MockDirectory {
    fn find(&self, address: &str) -> Option<ClientHandle> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.clients
            .lock()
            .unwrap()
            .get(address)
            .map(|client| Arc::clone(client) as ClientHandle)
    }
}

/// Mock host application
#[derive(Default)]
pub struct MockHost {
    pub playing: AtomicBool,
    pub invalidations: AtomicU32,
    pub refreshes: AtomicU32,
    pub changesets: Mutex<Vec<ChangesetEvent>>,
}

impl MockHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn playing() -> Arc<Self> {
        let host = Self::default();
        host.playing.store(true, Ordering::SeqCst);
        Arc::new(host)
    }

    pub fn invalidations(&self) -> u32 {
        self.invalidations.load(Ordering::SeqCst)
    }

    pub fn refreshes(&self) -> u32 {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn changesets(&self) -> Vec<ChangesetEvent> {
        self.changesets.lock().unwrap().clone()
    }
}

impl SyncHost for MockHost {
    fn playback_active(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn invalidate_directory_cache(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }

    fn refresh_all(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_changeset(&self, event: &ChangesetEvent) {
        self.changesets.lock().unwrap().push(event.clone());
    }
}

/// State shared between a mock transport and the connections it hands out
#[derive(Default)]
pub struct StreamScript {
    frames: Mutex<VecDeque<String>>,
    fail_connect: AtomicBool,
    /// Connect attempts never resolve
    hang_connect: AtomicBool,
    close_when_drained: AtomicBool,
    /// True while a connection is open and not yet closed
    open: AtomicBool,
    connects: AtomicU32,
    closes: AtomicU32,
    last_url: Mutex<Option<String>>,
}

/// Mock notification stream transport driven by a frame script
#[derive(Clone, Default)]
pub struct MockTransport {
    script: Arc<StreamScript>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport whose connect attempts always fail
    pub fn failing() -> Self {
        let transport = Self::default();
        transport.script.fail_connect.store(true, Ordering::SeqCst);
        transport
    }

    /// Transport whose connect attempts never complete
    pub fn hanging() -> Self {
        let transport = Self::default();
        transport.script.hang_connect.store(true, Ordering::SeqCst);
        transport
    }

    /// Report `Closed` once the queued frames have been delivered
    pub fn close_when_drained(self) -> Self {
        self.script.close_when_drained.store(true, Ordering::SeqCst);
        self
    }

    pub fn push_frame(&self, frame: impl Into<String>) {
        self.script.frames.lock().unwrap().push_back(frame.into());
    }

    pub fn with_frames<I, S>(self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for frame in frames {
            self.push_frame(frame);
        }
        self
    }

    pub fn connects(&self) -> u32 {
        self.script.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> u32 {
        self.script.closes.load(Ordering::SeqCst)
    }

    pub fn is_open(&self) -> bool {
        self.script.open.load(Ordering::SeqCst)
    }

    pub fn frames_pending(&self) -> usize {
        self.script.frames.lock().unwrap().len()
    }

    pub fn last_url(&self) -> Option<String> {
        self.script.last_url.lock().unwrap().clone()
    }
}

#[async_trait]
impl StreamTransport for MockTransport {
    async fn connect(&self, url: &Url) -> Result<Box<dyn StreamConnection>, TransportError> {
        self.script.connects.fetch_add(1, Ordering::SeqCst);
        *self.script.last_url.lock().unwrap() = Some(url.to_string());

        if self.script.hang_connect.load(Ordering::SeqCst) {
            return std::future::pending().await;
        }

        if self.script.fail_connect.load(Ordering::SeqCst) {
            return Err(TransportError::Connect {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            });
        }

        self.script.open.store(true, Ordering::SeqCst);
        Ok(Box::new(MockConnection {
            script: Arc::clone(&self.script),
        }))
    }
}

struct MockConnection {
    script: Arc<StreamScript>,
}

#[async_trait]
impl StreamConnection for MockConnection {
    async fn next_event(&mut self, timeout: Duration) -> Result<StreamEvent, TransportError> {
        let next = self.script.frames.lock().unwrap().pop_front();
        match next {
            Some(frame) => Ok(StreamEvent::Frame(frame)),
            None if self.script.close_when_drained.load(Ordering::SeqCst) => {
                Ok(StreamEvent::Closed)
            }
            None => {
                tokio::time::sleep(timeout).await;
                Ok(StreamEvent::Idle)
            }
        }
    }

    async fn close(&mut self) {
        self.script.open.store(false, Ordering::SeqCst);
        self.script.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// A timeline frame carrying one entry per item id
pub fn timeline_frame(item_ids: &[&str]) -> String {
    let entries: Vec<String> = item_ids
        .iter()
        .map(|id| {
            format!(
                r#"{{"identifier":"com.plexapp.plugins.library","sectionID":"1","itemID":"{}","type":1,"title":"Item {}","state":5,"updatedAt":1700000000}}"#,
                id, id
            )
        })
        .collect();
    format!(
        r#"{{"NotificationContainer":{{"type":"timeline","size":{},"TimelineEntry":[{}]}}}}"#,
        item_ids.len(),
        entries.join(",")
    )
}
