use dioxus::prelude::*;

use mobiflex_common::store::CatalogStore;
use mobiflex_common::upload::{Upload, UploadField, UploadStatus};

use super::store_client::BrowserStore;

struct FieldSpec {
    field: UploadField,
    label: &'static str,
    placeholder: &'static str,
    input_type: &'static str,
}

const FIELDS: [FieldSpec; 5] = [
    FieldSpec {
        field: UploadField::Name,
        label: "Product's Name:",
        placeholder: "Enter the product name",
        input_type: "text",
    },
    FieldSpec {
        field: UploadField::Image,
        label: "Product's Image URL:",
        placeholder: "Enter the product Image URL",
        input_type: "url",
    },
    FieldSpec {
        field: UploadField::Price,
        label: "Price:",
        placeholder: "Enter the price of the product",
        input_type: "text",
    },
    FieldSpec {
        field: UploadField::Rating,
        label: "Rating:",
        placeholder: "Enter the rating (1-5)",
        input_type: "text",
    },
    FieldSpec {
        field: UploadField::Link,
        label: "Product's link (Flipkart):",
        placeholder: "Enter the product Link",
        input_type: "url",
    },
];

fn field_value(upload: &Upload, field: UploadField) -> String {
    let form = &upload.form;
    match field {
        UploadField::Name => form.name.clone(),
        UploadField::Image => form.image.clone(),
        UploadField::Price => form.price.clone(),
        UploadField::Rating => form.rating.clone(),
        UploadField::Description => form.description.clone(),
        UploadField::Link => form.link.clone(),
    }
}

#[component]
pub fn UploadPage() -> Element {
    let mut upload = use_signal(Upload::new);

    let submit = move |evt: FormEvent| {
        evt.prevent_default();
        let Some(record) = upload.write().begin_submit(chrono::Utc::now()) else {
            return;
        };
        spawn(async move {
            let store = BrowserStore::from_build_env();
            let result = store.append(&record).await.map(|id| {
                tracing::info!(%id, store = store.store_name(), "product uploaded");
            });
            upload.write().finish_submit(result);
        });
    };

    let state = upload.read();
    let submitting = state.status.is_submitting();
    let notice = state.status.notice().map(String::from);
    let notice_class = match state.status {
        UploadStatus::Failed(_) => "notice error",
        _ => "notice success",
    };
    let description = state.form.description.clone();
    let description_error = state.errors.get(&UploadField::Description).copied();
    let rows = state.form.highlights.rows().to_vec();
    let can_remove = state.form.highlights.can_remove();
    drop(state);

    rsx! {
        div { class: "upload-page",
            h2 { "Upload New Product" }
            if let Some(msg) = notice {
                div { class: "{notice_class}", "{msg}" }
            }
            form { class: "upload-form", onsubmit: submit,
                {FIELDS.iter().map(|spec| {
                    let field = spec.field;
                    let value = field_value(&upload.read(), field);
                    let error = upload.read().errors.get(&field).copied();
                    rsx! {
                        div { class: "form-group", key: "{spec.label}",
                            label { "{spec.label}" }
                            input {
                                r#type: spec.input_type,
                                placeholder: spec.placeholder,
                                value: "{value}",
                                oninput: move |evt| upload.write().form.set(field, evt.value()),
                            }
                            if let Some(msg) = error {
                                p { class: "field-error", "{msg}" }
                            }
                        }
                    }
                })}
                div { class: "form-group",
                    label { "Product's description:" }
                    textarea {
                        placeholder: "Enter the product Description",
                        rows: "4",
                        value: "{description}",
                        oninput: move |evt| upload.write().form.set(UploadField::Description, evt.value()),
                    }
                    if let Some(msg) = description_error {
                        p { class: "field-error", "{msg}" }
                    }
                }
                {rows.into_iter().enumerate().map(|(index, row)| {
                    let id = row.id;
                    let number = index + 1;
                    rsx! {
                        div { class: "highlight-row", key: "{id.0}",
                            label { "Feature {number}:" }
                            input {
                                r#type: "text",
                                placeholder: "Enter feature {number}",
                                value: "{row.text}",
                                oninput: move |evt| upload.write().form.highlights.set(id, evt.value()),
                            }
                            button {
                                r#type: "button",
                                onclick: move |_| {
                                    upload.write().form.highlights.insert_after(id);
                                },
                                "+"
                            }
                            if can_remove {
                                button {
                                    r#type: "button",
                                    onclick: move |_| {
                                        upload.write().form.highlights.remove(id);
                                    },
                                    "Remove"
                                }
                            }
                        }
                    }
                })}
                button {
                    r#type: "submit",
                    disabled: submitting,
                    if submitting { "Saving..." } else { "Submit" }
                }
            }
        }
    }
}
