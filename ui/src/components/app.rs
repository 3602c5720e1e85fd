use dioxus::prelude::*;

use mobiflex_common::product::Product;

use super::catalog_feed::use_catalog_feed;
use super::catalog_view::LandingPage;
use super::product_details::ProductDetails;
use super::shared_state::{use_shared_state, SharedState};
use super::upload_form::UploadPage;

#[derive(Clone, Debug, PartialEq, Routable)]
pub enum Route {
    #[layout(NavbarLayout)]
    #[route("/")]
    Landing {},
    #[route("/upload_products")]
    Upload {},
    #[route("/product/:product_id")]
    ProductPage { product_id: String },
    #[route("/product/:product_id/:product_name")]
    ProductPageNamed {
        product_id: String,
        product_name: String,
    },
    #[route("/:..segments")]
    NotFound { segments: Vec<String> },
}

/// Detail page of a product, with its name slug when it has one.
pub fn detail_route(product: &Product) -> Route {
    let product_id = product.id.to_string();
    let product_name = product.slug();
    if product_name.is_empty() {
        Route::ProductPage { product_id }
    } else {
        Route::ProductPageNamed {
            product_id,
            product_name,
        }
    }
}

#[component]
pub fn App() -> Element {
    use_context_provider(|| Signal::new(SharedState::new()));
    use_catalog_feed();

    rsx! { Router::<Route> {} }
}

#[component]
fn NavbarLayout() -> Element {
    let live = use_shared_state().read().connected;
    rsx! {
        div { class: "mobiflex-app",
            header { class: "navbar",
                Link { class: "brand", to: Route::Landing {},
                    h3 { "MobiFlex" }
                }
                nav {
                    if live {
                        span { class: "live-badge", title: "Catalog updates are live", "Live" }
                    }
                    Link { to: Route::Upload {}, "Upload Product" }
                }
            }
            main {
                Outlet::<Route> {}
            }
        }
    }
}

/// Route component: renders the searchable catalog.
#[component]
fn Landing() -> Element {
    rsx! { LandingPage {} }
}

/// Route component: renders the upload page.
#[component]
fn Upload() -> Element {
    rsx! { UploadPage {} }
}

/// Route component: renders a product by id from the URL.
#[component]
fn ProductPage(product_id: String) -> Element {
    rsx! { ProductDetails { key: "{product_id}", product_id } }
}

/// Route component: the name segment is cosmetic; lookup is by id only.
#[component]
fn ProductPageNamed(product_id: String, product_name: String) -> Element {
    tracing::trace!(%product_id, slug = %product_name, "named product route");
    rsx! { ProductDetails { key: "{product_id}", product_id } }
}

#[component]
fn NotFound(segments: Vec<String>) -> Element {
    let path = segments.join("/");
    rsx! {
        div { class: "empty-state",
            p { "Nothing at /{path}" }
            Link { to: Route::Landing {}, "Back to products" }
        }
    }
}
