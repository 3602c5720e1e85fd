//! Operator tooling for the MobiFlex catalog: a native REST client for the
//! hosted store and the commands built on it.

pub mod commands;
pub mod rest_store;
