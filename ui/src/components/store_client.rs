//! Browser HTTP client for the hosted catalog store.
//!
//! Talks to the database REST API with `fetch`. Connection settings are
//! baked in at compile time (see [`StoreConfig::from_build_env`]).

use serde_json::Value;

use mobiflex_common::config::StoreConfig;
use mobiflex_common::product::{ProductId, ProductRecord};
use mobiflex_common::store::{parse_push_response, CatalogStore, StoreError};

/// Path of the catalog bundled with the site, used by `static-catalog` builds.
pub const STATIC_CATALOG_PATH: &str = "/product.json";

#[derive(Clone, Debug)]
pub struct BrowserStore {
    config: StoreConfig,
}

impl BrowserStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn from_build_env() -> Self {
        Self::new(StoreConfig::from_build_env())
    }
}

impl CatalogStore for BrowserStore {
    async fn fetch_snapshot(&self) -> Result<Value, StoreError> {
        let text = fetch_json(&self.config.products_url(), "GET", None).await?;
        serde_json::from_str(&text).map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn append(&self, record: &ProductRecord) -> Result<ProductId, StoreError> {
        let body = serde_json::to_string(record).map_err(|e| StoreError::Rejected(e.to_string()))?;
        let text = fetch_json(&self.config.products_url(), "POST", Some(body)).await?;
        parse_push_response(&text)
    }

    fn store_name(&self) -> &str {
        "firebase-browser"
    }
}

/// Fetch a same-origin or remote document as text.
pub async fn fetch_text(url: &str) -> Result<String, StoreError> {
    fetch_json(url, "GET", None).await
}

// ─── HTTP helpers (WASM) ─────────────────────────────────────────────────────

#[cfg(target_family = "wasm")]
async fn fetch_json(url: &str, method: &str, body: Option<String>) -> Result<String, StoreError> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    let opts = web_sys::RequestInit::new();
    opts.set_method(method);
    opts.set_mode(web_sys::RequestMode::Cors);

    if let Some(b) = body {
        opts.set_body(&wasm_bindgen::JsValue::from_str(&b));
    }

    let request = web_sys::Request::new_with_str_and_init(url, &opts)
        .map_err(|e| StoreError::Unreachable(format!("Failed to create request: {:?}", e)))?;

    if method == "POST" {
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(|e| StoreError::Unreachable(format!("Failed to set header: {:?}", e)))?;
    }

    let window = web_sys::window().ok_or(StoreError::Unreachable("No window".into()))?;
    let resp_value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| StoreError::Unreachable(format!("Fetch failed: {:?}", e)))?;

    let resp: web_sys::Response = resp_value
        .dyn_into()
        .map_err(|_| StoreError::Decode("Response is not a Response object".into()))?;

    let text = JsFuture::from(
        resp.text()
            .map_err(|e| StoreError::Decode(format!("Failed to get text: {:?}", e)))?,
    )
    .await
    .map_err(|e| StoreError::Unreachable(format!("Failed to read body: {:?}", e)))?;

    let text_str = text
        .as_string()
        .ok_or(StoreError::Decode("Response body is not a string".into()))?;

    let status = resp.status();
    if status >= 400 {
        return Err(StoreError::Http {
            status,
            body: text_str,
        });
    }

    Ok(text_str)
}

// Non-WASM stub for type checking
#[cfg(not(target_family = "wasm"))]
async fn fetch_json(_url: &str, _method: &str, _body: Option<String>) -> Result<String, StoreError> {
    Err(StoreError::Unreachable(
        "store client only available in WASM".to_string(),
    ))
}
