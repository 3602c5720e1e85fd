use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::product::{Product, ProductId, ProductRecord, StaticProduct};
use crate::stream::{SnapshotTree, StreamEvent};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("expected a collection of products, got {0}")]
    NotACollection(&'static str),
    #[error("malformed static catalog: {0}")]
    Static(#[from] serde_json::Error),
}

/// Immutable, ordered view of every product known to the client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Normalize a store snapshot of the products collection.
    ///
    /// Each key becomes the product id. Order follows the snapshot's key
    /// order; push keys sort chronologically. Documents that fail to decode
    /// are skipped with a warning.
    pub fn from_snapshot(snapshot: &Value) -> Result<Self, CatalogError> {
        let products = match snapshot {
            Value::Null => Vec::new(),
            Value::Object(documents) => documents
                .iter()
                .filter_map(|(key, doc)| decode_document(key, doc))
                .collect(),
            // Collections written with dense integer keys come back as arrays.
            Value::Array(documents) => documents
                .iter()
                .enumerate()
                .filter(|(_, doc)| !doc.is_null())
                .filter_map(|(index, doc)| decode_document(&index.to_string(), doc))
                .collect(),
            other => return Err(CatalogError::NotACollection(json_kind(other))),
        };
        Ok(Self { products })
    }

    /// Parse the static `product.json` fallback: an array of products that
    /// carry their own `id`.
    pub fn from_static_json(text: &str) -> Result<Self, CatalogError> {
        let entries: Vec<StaticProduct> = serde_json::from_str(text)?;
        Ok(Self {
            products: entries
                .into_iter()
                .map(|entry| Product::from_record(entry.id, entry.record))
                .collect(),
        })
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn find(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id.as_str() == id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Product> {
        self.products.iter()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Product;
    type IntoIter = std::slice::Iter<'a, Product>;

    fn into_iter(self) -> Self::IntoIter {
        self.products.iter()
    }
}

fn decode_document(key: &str, doc: &Value) -> Option<Product> {
    match ProductRecord::deserialize(doc) {
        Ok(record) => Some(Product::from_record(ProductId::from(key), record)),
        Err(e) => {
            tracing::warn!(key, "skipping malformed product document: {e}");
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Guarded snapshot transform: malformed data degrades to an empty catalog.
pub fn load_catalog(snapshot: &Value) -> Catalog {
    match Catalog::from_snapshot(snapshot) {
        Ok(catalog) => {
            if catalog.is_empty() {
                tracing::info!("no products found in the store");
            }
            catalog
        }
        Err(e) => {
            tracing::warn!("publishing empty catalog: {e}");
            Catalog::default()
        }
    }
}

/// Catalog loader for one live subscription.
///
/// Replays stream events into a local snapshot and yields the catalog to
/// publish after every event that changed data.
#[derive(Debug, Default)]
pub struct CatalogLoader {
    tree: SnapshotTree,
}

impl CatalogLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event. `Some` carries the catalog to republish as both the
    /// visible list and the search baseline.
    pub fn apply(&mut self, event: StreamEvent) -> Option<Catalog> {
        match &event {
            StreamEvent::KeepAlive => None,
            StreamEvent::AuthRevoked => {
                tracing::warn!("catalog stream credential revoked");
                None
            }
            StreamEvent::Cancel { reason } => {
                tracing::warn!("catalog stream cancelled by store: {reason}");
                self.tree.clear();
                Some(Catalog::default())
            }
            StreamEvent::Put { .. } | StreamEvent::Patch { .. } => {
                self.tree.apply(&event);
                Some(load_catalog(self.tree.root()))
            }
        }
    }

    /// A stream message that could not be decoded. The visible list degrades
    /// to empty; the local snapshot is kept so the next good event
    /// republishes everything known so far.
    pub fn reject(&self, reason: impl std::fmt::Display) -> Catalog {
        tracing::warn!("malformed catalog stream message, publishing empty catalog: {reason}");
        Catalog::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(catalog: &Catalog) -> Vec<&str> {
        catalog.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn snapshot_keys_become_ids() {
        let snapshot = json!({
            "k1": {"name": "A", "price": 100, "rating": 4.5, "description": "first"},
            "k2": {"name": "B", "price": "250", "description": "second"},
        });
        let catalog = Catalog::from_snapshot(&snapshot).unwrap();
        assert_eq!(ids(&catalog), vec!["k1", "k2"]);
        assert_eq!(catalog.find("k2").unwrap().price, 250.0);
    }

    #[test]
    fn empty_snapshot_is_empty_catalog() {
        assert!(Catalog::from_snapshot(&Value::Null).unwrap().is_empty());
        assert!(load_catalog(&json!({})).is_empty());
    }

    #[test]
    fn scalar_snapshot_degrades_to_empty() {
        assert!(matches!(
            Catalog::from_snapshot(&json!("oops")),
            Err(CatalogError::NotACollection("a string"))
        ));
        assert!(load_catalog(&json!(42)).is_empty());
    }

    #[test]
    fn malformed_document_is_skipped() {
        let snapshot = json!({
            "k1": {"name": "A"},
            "k2": {"name": {"nested": true}},
            "k3": "not a document",
        });
        let catalog = load_catalog(&snapshot);
        assert_eq!(ids(&catalog), vec!["k1"]);
    }

    #[test]
    fn array_snapshot_uses_indices() {
        let catalog = Catalog::from_snapshot(&json!([null, {"name": "A"}, {"name": "B"}])).unwrap();
        assert_eq!(ids(&catalog), vec!["1", "2"]);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let catalog = Catalog::from_snapshot(&json!({"k1": {"name": "A"}})).unwrap();
        assert!(catalog.find("missing").is_none());
    }

    #[test]
    fn static_catalog_parses_array() {
        let catalog = Catalog::from_static_json(
            r#"[{"id": 1, "name": "Nord CE", "price": 24999, "description": "d", "color": "gray"},
                {"id": "x2", "name": "Pixel", "price": 64999, "description": "d"}]"#,
        )
        .unwrap();
        assert_eq!(ids(&catalog), vec!["1", "x2"]);
        assert!(matches!(
            Catalog::from_static_json("{}"),
            Err(CatalogError::Static(_))
        ));
    }

    #[test]
    fn loader_republishes_on_every_change() {
        let mut loader = CatalogLoader::new();
        let first = loader
            .apply(StreamEvent::Put {
                path: "/".into(),
                data: json!({"k1": {"name": "A"}}),
            })
            .unwrap();
        assert_eq!(ids(&first), vec!["k1"]);

        assert!(loader.apply(StreamEvent::KeepAlive).is_none());

        let second = loader
            .apply(StreamEvent::Put {
                path: "/k2".into(),
                data: json!({"name": "B"}),
            })
            .unwrap();
        assert_eq!(ids(&second), vec!["k1", "k2"]);

        let cancelled = loader
            .apply(StreamEvent::Cancel {
                reason: "Permission denied".into(),
            })
            .unwrap();
        assert!(cancelled.is_empty());
    }

    #[test]
    fn loader_recovers_after_malformed_message() {
        let mut loader = CatalogLoader::new();
        loader.apply(StreamEvent::Put {
            path: "/".into(),
            data: json!({"k1": {"name": "A"}}),
        });

        let degraded = loader.reject("truncated payload");
        assert!(degraded.is_empty());

        let recovered = loader
            .apply(StreamEvent::Put {
                path: "/k2".into(),
                data: json!({"name": "B"}),
            })
            .unwrap();
        assert_eq!(ids(&recovered), vec!["k1", "k2"]);
    }
}
