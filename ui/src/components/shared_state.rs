use dioxus::prelude::*;

use mobiflex_common::catalog::Catalog;

/// Store-sourced state shared across all components.
///
/// Written only by the catalog feed; views read it.
#[derive(Clone, Debug, Default)]
pub struct SharedState {
    /// Latest published catalog, also the search baseline.
    pub catalog: Catalog,
    /// Whether the first snapshot (or a load failure) has arrived.
    pub loaded: bool,
    /// Whether the live stream is delivering events.
    pub connected: bool,
    /// Last error message from store communication.
    pub last_error: Option<String>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the visible catalog wholesale.
    pub fn publish(&mut self, catalog: Catalog) {
        tracing::debug!(len = catalog.len(), "publishing catalog");
        self.catalog = catalog;
        self.loaded = true;
    }

    /// Record a feed failure. Before the first snapshot this publishes an
    /// empty catalog so views stop showing the loading state.
    pub fn fail(&mut self, message: String) {
        tracing::warn!("catalog feed error: {message}");
        self.connected = false;
        self.last_error = Some(message);
        if !self.loaded {
            self.publish(Catalog::default());
        }
    }
}

pub fn use_shared_state() -> Signal<SharedState> {
    use_context::<Signal<SharedState>>()
}
