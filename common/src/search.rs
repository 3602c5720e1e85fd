use crate::catalog::Catalog;
use crate::product::Product;

/// Products whose name or description contains `term`, case-insensitively.
///
/// A blank term keeps everything. Order is preserved and `all` is never
/// touched, so this is cheap enough to run on every keystroke.
pub fn filter_products<'a>(all: &'a [Product], term: &str) -> Vec<&'a Product> {
    let needle = term.to_lowercase();
    if needle.trim().is_empty() {
        return all.iter().collect();
    }
    all.iter().filter(|p| matches_term(p, &needle)).collect()
}

/// `needle` must already be lowercase.
fn matches_term(product: &Product, needle: &str) -> bool {
    product.name.to_lowercase().contains(needle)
        || product.description.to_lowercase().contains(needle)
}

/// Search state owned by one catalog view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSession {
    query: String,
    baseline: Catalog,
}

impl SearchSession {
    pub fn new(baseline: Catalog) -> Self {
        Self {
            query: String::new(),
            baseline,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, raw: &str) {
        self.query = raw.to_lowercase();
    }

    /// Swap in a freshly published catalog, keeping the current query.
    pub fn replace_catalog(&mut self, baseline: Catalog) {
        self.baseline = baseline;
    }

    pub fn baseline(&self) -> &Catalog {
        &self.baseline
    }

    pub fn visible(&self) -> Vec<&Product> {
        filter_products(self.baseline.products(), &self.query)
    }

    /// True when the view should render its "no products found" state.
    pub fn has_no_results(&self) -> bool {
        self.visible().is_empty()
    }
}
