use dioxus::prelude::*;

use mobiflex_common::currency::{format_price, format_rating};
use mobiflex_common::product::Product;
use mobiflex_common::search::SearchSession;

use super::app::detail_route;
use super::shared_state::use_shared_state;

#[component]
pub fn LandingPage() -> Element {
    let shared_state = use_shared_state();
    let mut search_input = use_signal(String::new);

    // Rebuilt whenever the catalog or the term changes, so a live update
    // re-applies the current term to the new baseline.
    let session = use_memo(move || {
        let mut session = SearchSession::new(shared_state.read().catalog.clone());
        session.set_query(&search_input.read());
        session
    });

    let loaded = shared_state.read().loaded;
    let last_error = shared_state.read().last_error.clone();
    let query = session.read().query().to_string();
    let visible: Vec<Product> = session.read().visible().into_iter().cloned().collect();

    rsx! {
        div { class: "landing-page",
            div { class: "search-bar",
                input {
                    r#type: "text",
                    placeholder: "search your product",
                    value: "{query}",
                    oninput: move |evt| search_input.set(evt.value()),
                }
            }
            if let Some(err) = last_error {
                p { class: "connection-status error", "Error: {err}" }
            }
            div { class: "product-list",
                if !loaded {
                    p { class: "loading-state", "Loading…" }
                } else if visible.is_empty() {
                    p { class: "empty-state", "No products found" }
                } else {
                    {visible.into_iter().map(|product| {
                        rsx! {
                            ProductCard { key: "{product.id}", product }
                        }
                    })}
                }
            }
        }
    }
}

#[component]
pub fn ProductCard(product: Product) -> Element {
    let nav = use_navigator();
    let route = detail_route(&product);
    let price_str = format_price(product.price);
    let rating_str = format_rating(product.rating);

    let open = move |_: MouseEvent| {
        nav.push(route.clone());
    };

    rsx! {
        div { class: "product-card",
            div { class: "product-card-media",
                img {
                    src: "{product.image}",
                    alt: "{product.name}",
                    onclick: open.clone(),
                }
                button { class: "buy-now", onclick: open.clone(), "Buy Now" }
            }
            div { class: "product-card-info",
                h2 { onclick: open, "{product.name}" }
                p { class: "description", "{product.description}" }
                div { class: "price-row",
                    span { class: "price", "{price_str}" }
                    span { class: "rating", "{rating_str} ★" }
                }
            }
        }
    }
}
