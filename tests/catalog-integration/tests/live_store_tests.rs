#![cfg(feature = "live-tests")]

use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;

use mobiflex_admin::commands;
use mobiflex_admin::rest_store::RestStore;
use mobiflex_catalog_integration::*;
use mobiflex_common::catalog::CatalogLoader;
use mobiflex_common::store::CatalogStore;

const TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn live_snapshot_loads() {
    tracing_subscriber::fmt::try_init().ok();

    let store = RestStore::new(live_config());
    let snapshot = store.fetch_snapshot().await.expect("snapshot");
    assert!(snapshot.is_null() || snapshot.is_object() || snapshot.is_array());
}

/// Append through REST and observe the write on the event stream.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn live_upload_is_streamed() {
    tracing_subscriber::fmt::try_init().ok();

    let store = RestStore::new(live_config());
    let subscription = store.subscribe().await.expect("stream opens");
    let mut events = subscription.filter_map(|e| async move { e.ok() }).boxed();
    let mut loader = CatalogLoader::new();

    let name = format!("Live Test Phone {}", Utc::now().timestamp_millis());
    let id = commands::upload(&store, make_upload_args(&name), Utc::now())
        .await
        .expect("upload");

    let catalog = wait_for_catalog(
        &mut events,
        &mut loader,
        |c| c.find(id.as_str()).is_some(),
        TIMEOUT,
    )
    .await
    .expect("uploaded product streamed back");
    assert_eq!(catalog.find(id.as_str()).map(|p| p.name.as_str()), Some(name.as_str()));
}
