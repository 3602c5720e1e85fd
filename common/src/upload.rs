use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::product::ProductRecord;

/// Stable identity of one highlight row, independent of its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightRow {
    pub id: RowId,
    pub text: String,
}

/// Editable list of highlight rows. Always holds at least one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightRows {
    rows: Vec<HighlightRow>,
    next_id: u32,
}

impl Default for HighlightRows {
    fn default() -> Self {
        Self::new()
    }
}

impl HighlightRows {
    pub fn new() -> Self {
        let mut rows = Self {
            rows: Vec::new(),
            next_id: 0,
        };
        rows.push_row();
        rows
    }

    pub fn rows(&self) -> &[HighlightRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Any row may be removed as long as at least one row is kept.
    pub fn can_remove(&self) -> bool {
        self.rows.len() > 1
    }

    fn fresh_row(&mut self) -> HighlightRow {
        let id = RowId(self.next_id);
        self.next_id += 1;
        HighlightRow {
            id,
            text: String::new(),
        }
    }

    pub fn push_row(&mut self) -> RowId {
        let row = self.fresh_row();
        let id = row.id;
        self.rows.push(row);
        id
    }

    /// Insert an empty row right after `after`, or at the end if it is gone.
    pub fn insert_after(&mut self, after: RowId) -> RowId {
        let row = self.fresh_row();
        let id = row.id;
        match self.rows.iter().position(|r| r.id == after) {
            Some(index) => self.rows.insert(index + 1, row),
            None => self.rows.push(row),
        }
        id
    }

    /// Remove a row. Refuses to remove the last remaining row.
    pub fn remove(&mut self, id: RowId) -> bool {
        if !self.can_remove() {
            return false;
        }
        let before = self.rows.len();
        self.rows.retain(|r| r.id != id);
        self.rows.len() != before
    }

    pub fn set(&mut self, id: RowId, text: String) {
        if let Some(row) = self.rows.iter_mut().find(|r| r.id == id) {
            row.text = text;
        }
    }

    /// Non-blank entries, in row order.
    pub fn values(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter(|r| !r.text.trim().is_empty())
            .map(|r| r.text.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UploadField {
    Name,
    Image,
    Price,
    Rating,
    Description,
    Link,
}

/// Validation failures keyed by field.
pub type UploadErrors = BTreeMap<UploadField, &'static str>;

/// Upload page state: the text of each input plus the highlight rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadForm {
    pub name: String,
    pub image: String,
    pub price: String,
    pub rating: String,
    pub description: String,
    pub link: String,
    pub highlights: HighlightRows,
}

/// Validated payload, ready to be stamped and appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub image: String,
    pub price: f64,
    pub rating: f64,
    pub description: String,
    pub link: String,
    pub highlights: Vec<String>,
}

impl UploadForm {
    pub fn set(&mut self, field: UploadField, value: String) {
        let slot = match field {
            UploadField::Name => &mut self.name,
            UploadField::Image => &mut self.image,
            UploadField::Price => &mut self.price,
            UploadField::Rating => &mut self.rating,
            UploadField::Description => &mut self.description,
            UploadField::Link => &mut self.link,
        };
        *slot = value;
    }

    /// Check every required field; on success build the payload with blank
    /// highlights dropped and rating coerced to a number.
    pub fn validate(&self) -> Result<NewProduct, UploadErrors> {
        let mut errors = UploadErrors::new();

        if self.name.trim().is_empty() {
            errors.insert(UploadField::Name, "Product name is required");
        }
        if !is_http_url(&self.image) {
            errors.insert(UploadField::Image, "Enter a valid image URL");
        }
        let price = self.price.trim().parse::<f64>().ok().filter(|p| p.is_finite() && *p >= 0.0);
        if price.is_none() {
            errors.insert(UploadField::Price, "Enter a valid price");
        }
        let rating = self.rating.trim().parse::<f64>().ok().filter(|r| r.is_finite());
        if rating.is_none() {
            errors.insert(UploadField::Rating, "Enter a numeric rating");
        }
        if self.description.trim().is_empty() {
            errors.insert(UploadField::Description, "Description is required");
        }
        if !is_http_url(&self.link) {
            errors.insert(UploadField::Link, "Enter a valid product link");
        }

        match (price, rating) {
            (Some(price), Some(rating)) if errors.is_empty() => Ok(NewProduct {
                name: self.name.trim().to_string(),
                image: self.image.trim().to_string(),
                price,
                rating,
                description: self.description.trim().to_string(),
                link: self.link.trim().to_string(),
                highlights: self.highlights.values(),
            }),
            _ => Err(errors),
        }
    }
}

fn is_http_url(s: &str) -> bool {
    let s = s.trim();
    ["http://", "https://"].iter().any(|scheme| {
        s.len() > scheme.len()
            && s.get(..scheme.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(scheme))
            && !s.contains(char::is_whitespace)
    })
}

impl NewProduct {
    /// Stamp the creation time and produce the stored document.
    pub fn into_record(self, now: DateTime<Utc>) -> ProductRecord {
        ProductRecord {
            name: self.name,
            image: self.image,
            price: self.price,
            rating: self.rating,
            description: self.description,
            link: Some(self.link),
            highlights: self.highlights,
            created_at: Some(now),
        }
    }
}

/// Submission state of the upload page.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum UploadStatus {
    #[default]
    Editing,
    Submitting,
    Succeeded,
    Failed(String),
}

pub const UPLOAD_SUCCESS_NOTICE: &str = "Product uploaded successfully!";
pub const UPLOAD_FAILURE_NOTICE: &str = "Failed to upload product. Please try again.";

impl UploadStatus {
    /// The submit control is disabled while a write is in flight.
    pub fn is_submitting(&self) -> bool {
        matches!(self, UploadStatus::Submitting)
    }

    pub fn notice(&self) -> Option<&str> {
        match self {
            UploadStatus::Succeeded => Some(UPLOAD_SUCCESS_NOTICE),
            UploadStatus::Failed(msg) => Some(msg),
            UploadStatus::Editing | UploadStatus::Submitting => None,
        }
    }
}

/// Upload page: form values plus submission status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Upload {
    pub form: UploadForm,
    pub errors: UploadErrors,
    pub status: UploadStatus,
}

impl Upload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and enter `Submitting`, returning the record to append.
    /// `None` when a submit is already in flight or the form is invalid.
    pub fn begin_submit(&mut self, now: DateTime<Utc>) -> Option<ProductRecord> {
        if self.status.is_submitting() {
            return None;
        }
        match self.form.validate() {
            Ok(payload) => {
                self.errors.clear();
                self.status = UploadStatus::Submitting;
                Some(payload.into_record(now))
            }
            Err(errors) => {
                self.errors = errors;
                self.status = UploadStatus::Editing;
                None
            }
        }
    }

    /// Success clears every field; failure keeps them for a retry.
    pub fn finish_submit<E: std::fmt::Display>(&mut self, result: Result<(), E>) {
        match result {
            Ok(()) => {
                self.form = UploadForm::default();
                self.status = UploadStatus::Succeeded;
            }
            Err(e) => {
                tracing::error!("error uploading product: {e}");
                self.status = UploadStatus::Failed(UPLOAD_FAILURE_NOTICE.to_string());
            }
        }
    }
}
