pub mod app;
pub mod catalog_feed;
pub mod catalog_view;
pub mod checkout_modal;
pub mod product_details;
pub mod shared_state;
pub mod store_client;
pub mod upload_form;
