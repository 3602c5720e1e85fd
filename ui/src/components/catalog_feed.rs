//! App-level catalog feed.
//!
//! One coroutine owns the store subscription for the lifetime of the app and
//! republishes the catalog into [`SharedState`] after every change.

use dioxus::prelude::*;
use mobiflex_common::catalog::CatalogLoader;
use mobiflex_common::stream::StreamEvent;

use super::shared_state::{use_shared_state, SharedState};

/// One message from the live subscription.
#[cfg_attr(not(target_family = "wasm"), allow(dead_code))]
#[derive(Debug)]
enum FeedMessage {
    Event(StreamEvent),
    /// A message arrived but could not be decoded.
    Malformed(String),
    /// The source is closed for good.
    Closed(String),
}

/// Apply one feed message to the shared state. Returns `false` once the
/// feed should stop.
#[cfg_attr(not(target_family = "wasm"), allow(dead_code))]
fn handle_message(state: &mut SharedState, loader: &mut CatalogLoader, message: FeedMessage) -> bool {
    match message {
        FeedMessage::Event(event) => {
            state.connected = true;
            let revoked = matches!(event, StreamEvent::AuthRevoked);
            if let Some(catalog) = loader.apply(event) {
                state.last_error = None;
                state.publish(catalog);
            }
            if revoked {
                state.fail("catalog access revoked".to_string());
                return false;
            }
            true
        }
        FeedMessage::Malformed(reason) => {
            state.publish(loader.reject(&reason));
            state.last_error = Some(reason);
            true
        }
        FeedMessage::Closed(reason) => {
            state.fail(reason);
            false
        }
    }
}

/// Start the catalog feed coroutine.
///
/// Live builds subscribe to the store's event stream; `static-catalog`
/// builds read the bundled product file once.
pub fn use_catalog_feed() {
    let shared = use_shared_state();
    use_coroutine(move |_rx: UnboundedReceiver<()>| run_feed(shared));
}

async fn run_feed(shared: Signal<SharedState>) {
    if cfg!(feature = "static-catalog") {
        load_static(shared).await;
    } else {
        follow_store(shared).await;
    }
}

/// One-shot load of the bundled catalog file.
async fn load_static(mut shared: Signal<SharedState>) {
    use mobiflex_common::catalog::Catalog;

    use super::store_client::{fetch_text, STATIC_CATALOG_PATH};

    match fetch_text(STATIC_CATALOG_PATH).await {
        Ok(text) => match Catalog::from_static_json(&text) {
            Ok(catalog) => {
                tracing::info!(len = catalog.len(), "static catalog loaded");
                shared.write().publish(catalog);
            }
            Err(e) => shared.write().fail(format!("bad {STATIC_CATALOG_PATH}: {e}")),
        },
        Err(e) => shared.write().fail(e.to_string()),
    }
}

#[cfg(target_family = "wasm")]
async fn follow_store(shared: Signal<SharedState>) {
    wasm_impl::follow_store(shared).await;
}

#[cfg(not(target_family = "wasm"))]
async fn follow_store(mut shared: Signal<SharedState>) {
    tracing::debug!("live catalog feed disabled outside the browser");
    shared
        .write()
        .fail("live catalog only available in WASM".to_string());
}

// ─── WASM implementation ────────────────────────────────────────────────────

#[cfg(target_family = "wasm")]
mod wasm_impl {
    use dioxus::prelude::*;
    use futures::channel::mpsc;
    use futures::StreamExt;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use web_sys::{EventSource, MessageEvent};

    use mobiflex_common::catalog::CatalogLoader;
    use mobiflex_common::config::StoreConfig;
    use mobiflex_common::stream::StreamEvent;

    use super::{handle_message, FeedMessage};
    use crate::components::shared_state::SharedState;

    /// Event names the database streams for a location.
    const STREAM_EVENTS: [&str; 5] = ["put", "patch", "keep-alive", "cancel", "auth_revoked"];

    type Listener = Closure<dyn FnMut(MessageEvent)>;

    /// Open `EventSource` plus its listeners. Dropping it closes the stream
    /// and detaches every callback.
    struct Subscription {
        source: EventSource,
        listeners: Vec<(&'static str, Listener)>,
        _on_error: Closure<dyn FnMut(web_sys::Event)>,
    }

    impl Subscription {
        fn open(
            url: &str,
            tx: mpsc::UnboundedSender<FeedMessage>,
        ) -> Result<Self, String> {
            let source = EventSource::new(url)
                .map_err(|e| format!("EventSource connection failed: {:?}", e))?;

            let mut listeners = Vec::with_capacity(STREAM_EVENTS.len());
            for name in STREAM_EVENTS {
                let tx = tx.clone();
                let cb = Closure::wrap(Box::new(move |event: MessageEvent| {
                    let data = event.data().as_string().unwrap_or_default();
                    let message = match StreamEvent::from_frame(name, &data) {
                        Ok(event) => FeedMessage::Event(event),
                        Err(e) => FeedMessage::Malformed(e.to_string()),
                    };
                    let _ = tx.unbounded_send(message);
                }) as Box<dyn FnMut(MessageEvent)>);
                source
                    .add_event_listener_with_callback(name, cb.as_ref().unchecked_ref())
                    .map_err(|e| format!("Failed to listen for {name}: {:?}", e))?;
                listeners.push((name, cb));
            }

            // The browser retries dropped connections on its own; only a
            // closed source (e.g. rules denied the read) is terminal.
            let watched = source.clone();
            let on_error = Closure::wrap(Box::new(move |_: web_sys::Event| {
                if watched.ready_state() == EventSource::CLOSED {
                    let _ = tx.unbounded_send(FeedMessage::Closed("catalog stream closed".to_string()));
                } else {
                    tracing::warn!("catalog stream interrupted, reconnecting");
                }
            }) as Box<dyn FnMut(web_sys::Event)>);
            source.set_onerror(Some(on_error.as_ref().unchecked_ref()));

            Ok(Self {
                source,
                listeners,
                _on_error: on_error,
            })
        }
    }

    impl Drop for Subscription {
        fn drop(&mut self) {
            self.source.close();
            for (name, cb) in &self.listeners {
                let _ = self
                    .source
                    .remove_event_listener_with_callback(name, cb.as_ref().unchecked_ref());
            }
            self.source.set_onerror(None);
        }
    }

    pub async fn follow_store(mut shared: Signal<SharedState>) {
        let url = StoreConfig::from_build_env().products_url();
        let (tx, mut events) = mpsc::unbounded();

        let _subscription = match Subscription::open(&url, tx) {
            Ok(s) => s,
            Err(e) => {
                shared.write().fail(e);
                return;
            }
        };
        tracing::info!("subscribed to catalog stream");

        let mut loader = CatalogLoader::new();
        while let Some(message) = events.next().await {
            let idle = matches!(message, FeedMessage::Event(StreamEvent::KeepAlive));
            if idle && shared.peek().connected {
                continue;
            }
            if !handle_message(&mut shared.write(), &mut loader, message) {
                break;
            }
        }
    }
}
