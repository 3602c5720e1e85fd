use dioxus::prelude::*;

use mobiflex_common::checkout::{Checkout, CheckoutField, CheckoutStatus};
#[cfg(target_family = "wasm")]
use mobiflex_common::checkout::{PAYMENT_ROUND_TRIP_MS, SUCCESS_DISMISS_MS};
use mobiflex_common::currency::format_price;
use mobiflex_common::payment::{PaymentGateway, SimulatedGateway};
use mobiflex_common::product::Product;

fn placeholder(field: CheckoutField) -> &'static str {
    match field {
        CheckoutField::CardNumber => "1234 5678 9012 3456",
        CheckoutField::Expiry => "MM/YY",
        CheckoutField::Cvv => "123",
        CheckoutField::Name => "John Doe",
        CheckoutField::Email => "john@example.com",
        CheckoutField::Address => "123 Main St, City, Country",
    }
}

fn input_type(field: CheckoutField) -> &'static str {
    match field {
        CheckoutField::Email => "email",
        _ => "text",
    }
}

/// Payment modal for one product. Hidden while the checkout is closed.
#[component]
pub fn CheckoutModal(product: Product, mut checkout: Signal<Checkout>) -> Element {
    let mut gateway = use_signal(SimulatedGateway::new);

    if !checkout.read().is_open() {
        return rsx! {};
    }
    let status = checkout.read().status().clone();
    let processing = status == CheckoutStatus::Processing;
    let price_str = format_price(product.price);

    let pay = {
        let product = product.clone();
        move |evt: FormEvent| {
            evt.prevent_default();
            if checkout.write().submit().is_err() {
                return;
            }
            let request = checkout
                .read()
                .form()
                .charge_request(product.id.as_str(), product.price);
            tracing::info!(product = %product.id, "processing payment");
            // Scoped to this component: results arriving after unmount are dropped.
            spawn(async move {
                #[cfg(target_family = "wasm")]
                gloo_timers::future::TimeoutFuture::new(PAYMENT_ROUND_TRIP_MS).await;
                let outcome = gateway.write().charge(&request);
                checkout.write().resolve(outcome);

                if matches!(checkout.read().status(), CheckoutStatus::Succeeded(_)) {
                    #[cfg(target_family = "wasm")]
                    gloo_timers::future::TimeoutFuture::new(SUCCESS_DISMISS_MS).await;
                    checkout.write().finish();
                }
            });
        }
    };

    let body = match status {
        CheckoutStatus::Succeeded(receipt) => {
            let paid = format_price(receipt.amount);
            rsx! {
                div { class: "payment-result success",
                    h3 { "Payment Successful!" }
                    p { "Thank you for your purchase" }
                    p { class: "receipt", "Paid {paid} · ref {receipt.reference}" }
                }
            }
        }
        CheckoutStatus::Failed { reason } => rsx! {
            div { class: "payment-result failed",
                h3 { "Payment Failed" }
                p { class: "reason", "{reason}" }
                p { "Please try another payment method" }
                button {
                    onclick: move |_| checkout.write().retry(),
                    "Try Again"
                }
            }
        },
        CheckoutStatus::Idle | CheckoutStatus::Processing | CheckoutStatus::Closed => rsx! {
            form { class: "checkout-form", onsubmit: pay,
                {CheckoutField::all().iter().copied().map(|field| {
                    let value = checkout.read().form().get(field).to_string();
                    let error = checkout.read().error(field);
                    rsx! {
                        div { class: "form-group", key: "{field:?}",
                            label { "{field.label()}" }
                            input {
                                r#type: input_type(field),
                                placeholder: placeholder(field),
                                value: "{value}",
                                disabled: processing,
                                oninput: move |evt| checkout.write().edit(field, evt.value()),
                            }
                            if let Some(msg) = error {
                                p { class: "field-error", "{msg}" }
                            }
                        }
                    }
                })}
                div { class: "form-actions",
                    button {
                        r#type: "button",
                        disabled: processing,
                        onclick: move |_| {
                            checkout.write().close();
                        },
                        "Cancel"
                    }
                    button {
                        r#type: "submit",
                        disabled: processing,
                        if processing { "Processing..." } else { "Pay {price_str}" }
                    }
                }
            }
        },
    };

    rsx! {
        div {
            class: "modal-overlay",
            tabindex: "-1",
            onmounted: move |evt| async move {
                let _ = evt.set_focus(true).await;
            },
            onclick: move |_| {
                checkout.write().close();
            },
            onkeydown: move |evt| {
                if evt.key() == Key::Escape {
                    checkout.write().close();
                }
            },
            div {
                class: "modal",
                onclick: move |evt| evt.stop_propagation(),
                h2 { "Complete Your Purchase" }
                {body}
            }
        }
    }
}
