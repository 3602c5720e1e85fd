use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Document key assigned by the catalog store when a product is appended.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// A product document as stored under `products/<key>`.
///
/// Reads are lenient: every field is optional, and `price`/`rating` accept
/// either JSON numbers or numeric text (older uploads stored the price as
/// the raw form string).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub rating: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A catalog item: a stored record plus the key it lives under.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub rating: f64,
    pub image: String,
    pub link: Option<String>,
    pub highlights: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn from_record(id: ProductId, record: ProductRecord) -> Self {
        Self {
            id,
            name: record.name,
            description: record.description,
            price: record.price,
            rating: record.rating,
            image: record.image,
            link: record.link.filter(|l| !l.trim().is_empty()),
            highlights: record.highlights,
            created_at: record.created_at,
        }
    }

    /// The document to store for this product (the id is the store's key).
    pub fn to_record(&self) -> ProductRecord {
        ProductRecord {
            name: self.name.clone(),
            image: self.image.clone(),
            price: self.price,
            rating: self.rating,
            description: self.description.clone(),
            link: self.link.clone(),
            highlights: self.highlights.clone(),
            created_at: self.created_at,
        }
    }

    /// URL path segment derived from the name, used by `/product/:id/:name`.
    ///
    /// Lowercase ASCII alphanumerics separated by single dashes.
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Entry of the static `product.json` fallback, which carries its own `id`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StaticProduct {
    #[serde(deserialize_with = "key_from_text_or_number")]
    pub id: ProductId,
    #[serde(flatten)]
    pub record: ProductRecord,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrText::Number(n)) => n,
        Some(NumberOrText::Text(text)) => text.trim().parse().unwrap_or_default(),
        None => 0.0,
    })
}

fn key_from_text_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<ProductId, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Key {
        Integer(u64),
        Text(String),
    }
    Ok(match Key::deserialize(deserializer)? {
        Key::Integer(n) => ProductId(n.to_string()),
        Key::Text(text) => ProductId(text),
    })
}
