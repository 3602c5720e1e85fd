use dioxus::prelude::*;

use mobiflex_common::checkout::Checkout;
use mobiflex_common::currency::{format_price, format_rating};

use super::app::Route;
use super::checkout_modal::CheckoutModal;
use super::shared_state::use_shared_state;

#[component]
pub fn ProductDetails(product_id: String) -> Element {
    let shared_state = use_shared_state();
    let mut checkout = use_signal(Checkout::new);

    let state = shared_state.read();
    if !state.loaded {
        return rsx! {
            p { class: "loading-state", "Loading…" }
        };
    }
    let Some(product) = state.catalog.find(&product_id).cloned() else {
        return rsx! {
            div { class: "empty-state",
                p { "Product not found" }
                Link { to: Route::Landing {}, "Back to products" }
            }
        };
    };
    drop(state);

    let price_str = format_price(product.price);
    let rating_str = format_rating(product.rating);

    rsx! {
        div { class: "product-details",
            div { class: "product-image",
                if product.image.is_empty() {
                    div { class: "image-placeholder", "No Image Available" }
                } else {
                    img { src: "{product.image}", alt: "{product.name}" }
                }
            }
            div { class: "product-info",
                h1 { "{product.name}" }
                p { class: "rating", "{rating_str} ★" }
                p { class: "price", "{price_str}" }
                p { class: "description", "{product.description}" }
                div { class: "highlights",
                    h3 { "Details:" }
                    ul {
                        if product.highlights.is_empty() {
                            li { "No additional details available" }
                        } else {
                            {product.highlights.iter().enumerate().map(|(i, detail)| rsx! {
                                li { key: "{i}", "{detail}" }
                            })}
                        }
                    }
                }
                if let Some(link) = product.link.clone() {
                    a {
                        class: "external-link",
                        href: "{link}",
                        target: "_blank",
                        rel: "noopener noreferrer",
                        "View on store"
                    }
                }
                button {
                    class: "buy-now",
                    onclick: move |_| checkout.write().open(),
                    "Buy Now"
                }
            }
            CheckoutModal { product, checkout }
        }
    }
}
