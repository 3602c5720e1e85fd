use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use futures::channel::mpsc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::catalog::{load_catalog, Catalog};
use crate::product::{ProductId, ProductRecord};
use crate::push_id::PushIdGenerator;
use crate::stream::StreamEvent;

/// Errors from catalog store operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Unreachable(String),
    #[error("store returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("malformed store response: {0}")]
    Decode(String),
    #[error("write rejected: {0}")]
    Rejected(String),
}

/// Abstraction over the hosted product collection.
///
/// Reads return the whole collection as one snapshot; live change
/// notifications are delivered separately as [`StreamEvent`]s by each
/// backend's subscription mechanism.
#[allow(async_fn_in_trait)]
pub trait CatalogStore {
    /// Current value of the products collection (`null` when empty).
    async fn fetch_snapshot(&self) -> Result<Value, StoreError>;

    /// Append a document; the store picks and returns its key.
    async fn append(&self, record: &ProductRecord) -> Result<ProductId, StoreError>;

    /// Human-readable backend name.
    fn store_name(&self) -> &str;

    /// One-shot catalog load. Fetch failures degrade to an empty catalog.
    async fn load_catalog(&self) -> Catalog {
        match self.fetch_snapshot().await {
            Ok(snapshot) => load_catalog(&snapshot),
            Err(e) => {
                tracing::warn!(store = self.store_name(), "error fetching products: {e}");
                Catalog::default()
            }
        }
    }
}

#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

/// Decode the body the REST API answers an append with: `{"name": "<key>"}`.
pub fn parse_push_response(body: &str) -> Result<ProductId, StoreError> {
    serde_json::from_str::<PushResponse>(body)
        .map(|r| ProductId(r.name))
        .map_err(|e| StoreError::Decode(e.to_string()))
}

struct MemoryInner {
    documents: Map<String, Value>,
    subscribers: Vec<mpsc::UnboundedSender<StreamEvent>>,
    ids: PushIdGenerator,
    rng: StdRng,
    reject_writes: Option<String>,
}

/// In-process store with push keys and change notifications, used by tests
/// and offline development.
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                documents: Map::new(),
                subscribers: Vec::new(),
                ids: PushIdGenerator::new(),
                rng,
                reject_writes: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        // A panicking test thread must not wedge the others.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make every following append fail with `reason` (`None` to recover).
    pub fn reject_writes(&self, reason: Option<&str>) {
        self.lock().reject_writes = reason.map(String::from);
    }

    /// Store a document under a caller-chosen key, notifying subscribers.
    pub fn insert(&self, key: &str, document: Value) {
        let mut inner = self.lock();
        inner.documents.insert(key.to_string(), document.clone());
        broadcast(
            &mut inner,
            StreamEvent::Put {
                path: format!("/{key}"),
                data: document,
            },
        );
    }

    /// Open a subscription. The first event is the full current snapshot;
    /// every later change follows in order. Dropping the receiver ends it.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<StreamEvent> {
        let mut inner = self.lock();
        let (tx, rx) = mpsc::unbounded();
        let initial = StreamEvent::Put {
            path: "/".to_string(),
            data: snapshot_value(&inner.documents),
        };
        if tx.unbounded_send(initial).is_ok() {
            inner.subscribers.push(tx);
        }
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.lock();
        inner.subscribers.retain(|tx| !tx.is_closed());
        inner.subscribers.len()
    }
}

fn snapshot_value(documents: &Map<String, Value>) -> Value {
    if documents.is_empty() {
        Value::Null
    } else {
        Value::Object(documents.clone())
    }
}

fn broadcast(inner: &mut MemoryInner, event: StreamEvent) {
    inner
        .subscribers
        .retain(|tx| tx.unbounded_send(event.clone()).is_ok());
}

impl CatalogStore for MemoryStore {
    async fn fetch_snapshot(&self) -> Result<Value, StoreError> {
        Ok(snapshot_value(&self.lock().documents))
    }

    async fn append(&self, record: &ProductRecord) -> Result<ProductId, StoreError> {
        let document =
            serde_json::to_value(record).map_err(|e| StoreError::Rejected(e.to_string()))?;
        let mut inner = self.lock();
        if let Some(reason) = &inner.reject_writes {
            return Err(StoreError::Rejected(reason.clone()));
        }
        let MemoryInner { ids, rng, .. } = &mut *inner;
        let key = ids.next_id(Utc::now().timestamp_millis(), rng);
        inner.documents.insert(key.clone(), document.clone());
        broadcast(
            &mut inner,
            StreamEvent::Put {
                path: format!("/{key}"),
                data: document,
            },
        );
        Ok(ProductId(key))
    }

    fn store_name(&self) -> &str {
        "memory"
    }
}
