use std::time::Duration;

use futures::{Stream, StreamExt};
use serde_json::{json, Value};
use tokio::time::Instant;

use mobiflex_admin::commands::UploadArgs;
use mobiflex_common::catalog::{Catalog, CatalogLoader};
use mobiflex_common::config::{StoreConfig, DEFAULT_DATABASE_URL};
use mobiflex_common::stream::StreamEvent;

/// Store settings for live tests, read from the environment.
pub fn live_config() -> StoreConfig {
    StoreConfig {
        database_url: std::env::var("MOBIFLEX_DATABASE_URL")
            .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
        auth: std::env::var("MOBIFLEX_DB_AUTH").ok().filter(|a| !a.is_empty()),
        ..StoreConfig::default()
    }
}

/// A stored product document as the upload page writes it.
pub fn make_dummy_document(name: &str, price: f64) -> Value {
    json!({
        "name": name,
        "image": format!("https://img.example.com/{}.png", name.to_lowercase().replace(' ', "-")),
        "price": price,
        "rating": 4.0,
        "description": format!("{name} smartphone"),
        "link": "https://store.example.com/item",
        "highlights": ["6.5\" display", "5000 mAh"],
    })
}

/// Valid upload arguments with a recognisable name.
pub fn make_upload_args(name: &str) -> UploadArgs {
    UploadArgs {
        name: name.to_string(),
        image: "https://img.example.com/phone.png".into(),
        price: "15999".into(),
        rating: "4.2".into(),
        description: format!("{name} with a big battery"),
        link: "https://store.example.com/phone".into(),
        highlights: vec!["8 GB RAM".into(), String::new(), "128 GB".into()],
    }
}

/// Drive a loader with events from `stream` until a published catalog
/// satisfies `predicate`, or the timeout expires.
pub async fn wait_for_catalog<S, F>(
    stream: &mut S,
    loader: &mut CatalogLoader,
    predicate: F,
    timeout: Duration,
) -> Option<Catalog>
where
    S: Stream<Item = StreamEvent> + Unpin,
    F: Fn(&Catalog) -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return None;
        }
        match tokio::time::timeout(remaining, stream.next()).await {
            Ok(Some(event)) => match loader.apply(event) {
                Some(catalog) if predicate(&catalog) => return Some(catalog),
                Some(catalog) => {
                    tracing::debug!(len = catalog.len(), "discarding non-matching catalog");
                }
                None => continue,
            },
            Ok(None) => return None,
            Err(_) => return None, // timeout
        }
    }
}
