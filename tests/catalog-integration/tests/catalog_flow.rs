use std::time::Duration;

use chrono::Utc;
use futures::executor::block_on;

use mobiflex_admin::commands;
use mobiflex_catalog_integration::*;
use mobiflex_common::catalog::CatalogLoader;
use mobiflex_common::search::SearchSession;
use mobiflex_common::store::{CatalogStore, MemoryStore};
use mobiflex_common::stream::StreamEvent;

const TIMEOUT: Duration = Duration::from_secs(2);

/// Subscribe, upload through the admin command, and see the product arrive.
#[tokio::test]
async fn upload_reaches_live_subscribers() {
    tracing_subscriber::fmt::try_init().ok();

    let store = MemoryStore::seeded(11);
    store.insert("k1", make_dummy_document("Redmi Note 13", 12999.0));

    let mut events = store.subscribe();
    let mut loader = CatalogLoader::new();

    let initial = wait_for_catalog(&mut events, &mut loader, |c| c.len() == 1, TIMEOUT)
        .await
        .expect("initial snapshot");
    assert_eq!(initial.products()[0].name, "Redmi Note 13");

    let id = commands::upload(&store, make_upload_args("Poco X6"), Utc::now())
        .await
        .unwrap();

    let updated = wait_for_catalog(&mut events, &mut loader, |c| c.len() == 2, TIMEOUT)
        .await
        .expect("catalog after upload");
    let uploaded = updated.find(id.as_str()).expect("uploaded product visible");
    assert_eq!(uploaded.highlights, vec!["8 GB RAM", "128 GB"]);
    assert_eq!(uploaded.price, 15999.0);
}

/// A live update replaces the search baseline, and the current term is
/// re-applied to it.
#[tokio::test]
async fn search_follows_catalog_updates() {
    let store = MemoryStore::seeded(12);
    store.insert("k1", make_dummy_document("Samsung Galaxy A15", 13999.0));
    store.insert("k2", make_dummy_document("Redmi 13C", 8999.0));

    let mut events = store.subscribe();
    let mut loader = CatalogLoader::new();
    let first = wait_for_catalog(&mut events, &mut loader, |c| c.len() == 2, TIMEOUT)
        .await
        .unwrap();

    let mut session = SearchSession::new(first);
    session.set_query("GALAXY");
    assert_eq!(session.visible().len(), 1);

    store.insert("k3", make_dummy_document("Samsung Galaxy M34", 16999.0));
    let next = wait_for_catalog(&mut events, &mut loader, |c| c.len() == 3, TIMEOUT)
        .await
        .unwrap();
    session.replace_catalog(next);

    let names: Vec<&str> = session.visible().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names.len(), 2);
    assert!(names.iter().all(|n| n.contains("Galaxy")));

    session.set_query("nokia");
    assert!(session.has_no_results());
}

#[tokio::test]
async fn dropped_subscription_is_released() {
    let store = MemoryStore::seeded(13);
    let events = store.subscribe();
    let _other = store.subscribe();
    assert_eq!(store.subscriber_count(), 2);

    drop(events);
    store.insert("k1", make_dummy_document("Moto G54", 11999.0));
    assert_eq!(store.subscriber_count(), 1);
}

#[test]
fn detail_lookup_of_unknown_id_is_not_found() {
    let store = MemoryStore::seeded(14);
    store.insert("k1", make_dummy_document("iQOO Z9", 19999.0));

    let catalog = block_on(store.load_catalog());
    assert!(catalog.find("k1").is_some());
    assert!(catalog.find("missing").is_none());

    let mut out = Vec::new();
    assert!(!block_on(commands::show(&store, "missing", &mut out)).unwrap());
}

#[test]
fn empty_store_loads_empty_catalog() {
    let store = MemoryStore::seeded(15);
    let catalog = block_on(store.load_catalog());
    assert!(catalog.is_empty());

    let mut loader = CatalogLoader::new();
    let published = loader.apply(StreamEvent::Put {
        path: "/".into(),
        data: serde_json::Value::Null,
    });
    assert!(published.unwrap().is_empty());
}

#[test]
fn rejected_upload_leaves_catalog_unchanged() {
    let store = MemoryStore::seeded(16);
    store.reject_writes(Some("Permission denied"));
    assert!(block_on(commands::upload(&store, make_upload_args("Vivo T3"), Utc::now())).is_err());

    store.reject_writes(None);
    assert!(block_on(store.load_catalog()).is_empty());
    block_on(commands::upload(&store, make_upload_args("Vivo T3"), Utc::now())).unwrap();
    assert_eq!(block_on(store.load_catalog()).len(), 1);
}

#[test]
fn seeded_catalog_is_listed() {
    let store = MemoryStore::seeded(17);
    let file = r#"[
        {"id": "a", "name": "OnePlus Nord CE4", "price": 24999, "rating": 4.3},
        {"id": "b", "name": "Realme Narzo 70", "price": 15999, "rating": 4.0}
    ]"#;
    block_on(commands::seed(&store, file, Utc::now())).unwrap();

    let mut out = Vec::new();
    let shown = block_on(commands::list(&store, "narzo", false, &mut out)).unwrap();
    assert_eq!(shown, 1);
    assert!(String::from_utf8(out).unwrap().contains("₹15999"));
}
