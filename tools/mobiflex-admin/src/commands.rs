//! Operator commands, generic over the backing store so tests can run them
//! against [`MemoryStore`](mobiflex_common::store::MemoryStore).

use std::io::Write;

use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use serde::Serialize;
use thiserror::Error;

use mobiflex_common::catalog::{Catalog, CatalogError, CatalogLoader};
use mobiflex_common::currency::{format_price, format_rating};
use mobiflex_common::product::{Product, ProductId};
use mobiflex_common::search::{filter_products, SearchSession};
use mobiflex_common::store::{CatalogStore, StoreError};
use mobiflex_common::stream::StreamEvent;
use mobiflex_common::upload::{UploadErrors, UploadField, UploadForm};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid product: {}", describe_errors(.0))]
    InvalidUpload(UploadErrors),
    #[error("invalid catalog file: {0}")]
    Seed(#[from] CatalogError),
    #[error("output failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("output failed: {0}")]
    Json(#[from] serde_json::Error),
}

fn describe_errors(errors: &UploadErrors) -> String {
    errors
        .iter()
        .map(|(field, msg)| format!("{field:?}: {msg}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Output shape for `--json` listings.
#[derive(Serialize)]
struct Listing<'a> {
    id: &'a str,
    name: &'a str,
    price: f64,
    rating: f64,
    slug: String,
}

impl<'a> From<&'a Product> for Listing<'a> {
    fn from(p: &'a Product) -> Self {
        Listing {
            id: p.id.as_str(),
            name: &p.name,
            price: p.price,
            rating: p.rating,
            slug: p.slug(),
        }
    }
}

fn write_row(out: &mut impl Write, p: &Product) -> std::io::Result<()> {
    writeln!(
        out,
        "{:<22} {:<40} {:>10} {:>4} ★",
        p.id.as_str(),
        p.name,
        format_price(p.price),
        format_rating(p.rating)
    )
}

fn write_listing(out: &mut impl Write, visible: &[&Product], json: bool) -> Result<(), CommandError> {
    if json {
        let rows: Vec<Listing<'_>> = visible.iter().map(|p| Listing::from(*p)).collect();
        serde_json::to_writer_pretty(&mut *out, &rows)?;
        writeln!(out)?;
        return Ok(());
    }
    if visible.is_empty() {
        writeln!(out, "No products found")?;
        return Ok(());
    }
    for p in visible {
        write_row(out, p)?;
    }
    Ok(())
}

/// Print the catalog, optionally filtered by a search term.
pub async fn list<S: CatalogStore>(
    store: &S,
    search: &str,
    json: bool,
    out: &mut impl Write,
) -> Result<usize, CommandError> {
    let snapshot = store.fetch_snapshot().await?;
    let catalog = Catalog::from_snapshot(&snapshot)?;
    let visible = filter_products(catalog.products(), search);
    write_listing(out, &visible, json)?;
    Ok(visible.len())
}

/// Print one product. Returns `false` when the id is unknown.
pub async fn show<S: CatalogStore>(
    store: &S,
    id: &str,
    out: &mut impl Write,
) -> Result<bool, CommandError> {
    let catalog = store.load_catalog().await;
    let Some(p) = catalog.find(id) else {
        writeln!(out, "Product not found")?;
        return Ok(false);
    };

    writeln!(out, "{}", p.name)?;
    writeln!(out, "{}  {} ★", format_price(p.price), format_rating(p.rating))?;
    if !p.description.is_empty() {
        writeln!(out, "{}", p.description)?;
    }
    if p.highlights.is_empty() {
        writeln!(out, "No additional details available")?;
    } else {
        writeln!(out, "Details:")?;
        for h in &p.highlights {
            writeln!(out, "  - {h}")?;
        }
    }
    if let Some(link) = &p.link {
        writeln!(out, "Link: {link}")?;
    }
    writeln!(out, "Path: /product/{}/{}", p.id, p.slug())?;
    Ok(true)
}

/// Raw field values for a new product, as typed on the command line.
#[derive(Debug, Clone, Default)]
pub struct UploadArgs {
    pub name: String,
    pub image: String,
    pub price: String,
    pub rating: String,
    pub description: String,
    pub link: String,
    pub highlights: Vec<String>,
}

impl UploadArgs {
    fn into_form(self) -> UploadForm {
        let mut form = UploadForm::default();
        form.set(UploadField::Name, self.name);
        form.set(UploadField::Image, self.image);
        form.set(UploadField::Price, self.price);
        form.set(UploadField::Rating, self.rating);
        form.set(UploadField::Description, self.description);
        form.set(UploadField::Link, self.link);
        let mut row = form.highlights.rows()[0].id;
        for (i, text) in self.highlights.into_iter().enumerate() {
            if i > 0 {
                row = form.highlights.insert_after(row);
            }
            form.highlights.set(row, text);
        }
        form
    }
}

/// Validate and append one product, stamped with `now`.
pub async fn upload<S: CatalogStore>(
    store: &S,
    args: UploadArgs,
    now: DateTime<Utc>,
) -> Result<ProductId, CommandError> {
    let payload = args
        .into_form()
        .validate()
        .map_err(CommandError::InvalidUpload)?;
    let id = store.append(&payload.into_record(now)).await?;
    tracing::info!(%id, "product uploaded");
    Ok(id)
}

/// Append every entry of a static `product.json` file. Entries keep their
/// content; the store assigns fresh keys.
pub async fn seed<S: CatalogStore>(
    store: &S,
    static_json: &str,
    now: DateTime<Utc>,
) -> Result<Vec<ProductId>, CommandError> {
    let catalog = Catalog::from_static_json(static_json)?;
    let mut ids = Vec::with_capacity(catalog.len());
    for p in &catalog {
        let mut record = p.to_record();
        record.created_at.get_or_insert(now);
        let id = store.append(&record).await?;
        tracing::debug!(from = %p.id, to = %id, "seeded product");
        ids.push(id);
    }
    tracing::info!(count = ids.len(), "catalog seeded");
    Ok(ids)
}

/// Replay a live event stream, reprinting the filtered catalog after each
/// change. Returns the number of catalogs published.
///
/// A message that fails to decode publishes an empty catalog and the watch
/// goes on; any other store error ends it.
pub async fn watch(
    mut events: impl Stream<Item = Result<StreamEvent, StoreError>> + Unpin,
    search: &str,
    out: &mut impl Write,
) -> Result<usize, CommandError> {
    let mut loader = CatalogLoader::new();
    let mut session = SearchSession::new(Catalog::default());
    session.set_query(search);
    let mut published = 0;

    while let Some(event) = events.next().await {
        let update = match event {
            Ok(event) => loader.apply(event),
            Err(StoreError::Decode(reason)) => Some(loader.reject(reason)),
            Err(e) => return Err(e.into()),
        };
        if let Some(catalog) = update {
            session.replace_catalog(catalog);
            published += 1;
            writeln!(
                out,
                "--- {} of {} products ---",
                session.visible().len(),
                session.baseline().len()
            )?;
            write_listing(out, &session.visible(), false)?;
        }
    }
    Ok(published)
}
