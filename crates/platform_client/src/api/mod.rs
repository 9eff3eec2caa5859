//! Platform control-plane API client and types.

pub mod client;
pub mod models;
