use serde::{Deserialize, Serialize};

/// Default database URL, overridden at compile time via `MOBIFLEX_DATABASE_URL`.
pub const DEFAULT_DATABASE_URL: &str = "https://mobiflex-default-rtdb.firebaseio.com";

/// Collection every product document lives under.
pub const PRODUCTS_PATH: &str = "products";

/// Connection parameters of the hosted catalog store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub database_url: String,
    pub project_id: String,
    pub api_key: String,
    /// Database secret or ID token appended as `?auth=`; public rules need none.
    pub auth: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            project_id: "mobiflex".to_string(),
            api_key: String::new(),
            auth: None,
        }
    }
}

impl StoreConfig {
    /// Configuration baked in at compile time, falling back to defaults.
    pub fn from_build_env() -> Self {
        let defaults = Self::default();
        Self {
            database_url: option_env!("MOBIFLEX_DATABASE_URL")
                .filter(|s| !s.is_empty())
                .map(String::from)
                .unwrap_or(defaults.database_url),
            project_id: option_env!("MOBIFLEX_PROJECT_ID")
                .filter(|s| !s.is_empty())
                .map(String::from)
                .unwrap_or(defaults.project_id),
            api_key: option_env!("MOBIFLEX_API_KEY")
                .map(String::from)
                .unwrap_or(defaults.api_key),
            auth: option_env!("MOBIFLEX_DB_AUTH")
                .filter(|s| !s.is_empty())
                .map(String::from),
        }
    }

    /// REST URL of a location, e.g. `https://db.example.com/products.json`.
    pub fn location_url(&self, path: &str) -> String {
        let base = self.database_url.trim_end_matches('/');
        let path = path.trim_matches('/');
        match &self.auth {
            Some(token) => format!("{base}/{path}.json?auth={token}"),
            None => format!("{base}/{path}.json"),
        }
    }

    pub fn products_url(&self) -> String {
        self.location_url(PRODUCTS_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn products_url_without_auth() {
        let config = StoreConfig {
            database_url: "https://shop.firebaseio.com/".into(),
            ..StoreConfig::default()
        };
        assert_eq!(config.products_url(), "https://shop.firebaseio.com/products.json");
    }

    #[test]
    fn location_url_with_auth() {
        let config = StoreConfig {
            auth: Some("secret".into()),
            ..StoreConfig::default()
        };
        assert_eq!(
            config.location_url("/products/k1/"),
            format!("{DEFAULT_DATABASE_URL}/products/k1.json?auth=secret")
        );
    }
}
