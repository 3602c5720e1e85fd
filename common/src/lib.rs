pub mod catalog;
pub mod checkout;
pub mod config;
pub mod currency;
pub mod payment;
pub mod product;
pub mod push_id;
pub mod search;
pub mod store;
pub mod stream;
pub mod upload;
