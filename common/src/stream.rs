//! Realtime catalog stream.
//!
//! The store pushes changes as Server-Sent Events. Each `put`/`patch` event
//! carries a JSON path relative to the subscribed location plus the new data;
//! applying them in order to a [`SnapshotTree`] reproduces the store's view of
//! the collection.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// One change notification from the realtime store.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Replace the node at `path` (a `null` payload deletes it).
    Put { path: String, data: Value },
    /// Put each child of `data` under `path`.
    Patch { path: String, data: Value },
    KeepAlive,
    /// The store revoked read access to the location.
    Cancel { reason: String },
    /// The credential used to open the stream is no longer valid.
    AuthRevoked,
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("unknown stream event `{0}`")]
    UnknownEvent(String),
    #[error("malformed `{event}` payload: {source}")]
    Payload {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct PathData {
    path: String,
    #[serde(default)]
    data: Value,
}

impl StreamEvent {
    /// Decode a named SSE frame.
    pub fn from_frame(event: &str, data: &str) -> Result<Self, StreamError> {
        match event {
            "put" | "patch" => {
                let PathData { path, data } =
                    serde_json::from_str(data).map_err(|source| StreamError::Payload {
                        event: event.to_string(),
                        source,
                    })?;
                if event == "put" {
                    Ok(StreamEvent::Put { path, data })
                } else {
                    Ok(StreamEvent::Patch { path, data })
                }
            }
            "keep-alive" => Ok(StreamEvent::KeepAlive),
            "cancel" => {
                let reason = serde_json::from_str::<Option<String>>(data)
                    .ok()
                    .flatten()
                    .unwrap_or_else(|| data.trim().to_string());
                Ok(StreamEvent::Cancel { reason })
            }
            "auth_revoked" => Ok(StreamEvent::AuthRevoked),
            other => Err(StreamError::UnknownEvent(other.to_string())),
        }
    }
}

/// A dispatched SSE message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

impl SseFrame {
    pub fn into_event(self) -> Result<StreamEvent, StreamError> {
        StreamEvent::from_frame(&self.event, &self.data)
    }
}

/// Incremental `text/event-stream` decoder.
///
/// Chunks may split lines (and UTF-8 sequences) anywhere; only complete lines
/// are interpreted.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning every frame completed by this chunk.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.pending.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(frame) = self.handle_line(line) {
                frames.push(frame);
            }
        }
        frames
    }

    fn handle_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            if self.event.is_none() && self.data.is_empty() {
                return None;
            }
            return Some(SseFrame {
                event: self.event.take().unwrap_or_else(|| "message".to_string()),
                data: std::mem::take(&mut self.data).join("\n"),
            });
        }
        // Comment line.
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }
}

/// Local replica of the subscribed location, rebuilt from stream events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotTree {
    root: Value,
}

impl SnapshotTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Apply an event; returns `true` when it carried data.
    pub fn apply(&mut self, event: &StreamEvent) -> bool {
        match event {
            StreamEvent::Put { path, data } => {
                self.put(path, data.clone());
                true
            }
            StreamEvent::Patch { path, data } => {
                self.patch(path, data.clone());
                true
            }
            StreamEvent::KeepAlive | StreamEvent::Cancel { .. } | StreamEvent::AuthRevoked => {
                false
            }
        }
    }

    pub fn put(&mut self, path: &str, data: Value) {
        let segments = segments(path);
        set_at(&mut self.root, &segments, data);
    }

    pub fn patch(&mut self, path: &str, data: Value) {
        let Value::Object(children) = data else {
            tracing::warn!(path, "ignoring patch whose payload is not an object");
            return;
        };
        let base = segments(path);
        for (key, value) in children {
            let mut target = base.clone();
            target.push(key.as_str());
            set_at(&mut self.root, &target, value);
        }
    }

    pub fn clear(&mut self) {
        self.root = Value::Null;
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn set_at(node: &mut Value, segments: &[&str], data: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = normalize(data);
        return;
    };

    if data.is_null() {
        if !(node.is_object() || node.is_array()) {
            return;
        }
        let map = ensure_object(node);
        let emptied = match map.get_mut(*head) {
            Some(child) if rest.is_empty() => {
                *child = Value::Null;
                true
            }
            Some(child) => {
                set_at(child, rest, Value::Null);
                child.is_null()
            }
            None => false,
        };
        if emptied {
            map.remove(*head);
        }
        if map.is_empty() {
            *node = Value::Null;
        }
        return;
    }

    let map = ensure_object(node);
    let child = map.entry(head.to_string()).or_insert(Value::Null);
    set_at(child, rest, data);
}

/// Empty objects do not exist in the store; they read back as `null`.
fn normalize(data: Value) -> Value {
    match data {
        Value::Object(ref map) if map.is_empty() => Value::Null,
        other => other,
    }
}

/// Coerce `node` into an object, keying array elements by index.
fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        let map = match node.take() {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .filter(|(_, v)| !v.is_null())
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
            _ => Map::new(),
        };
        *node = Value::Object(map);
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}
