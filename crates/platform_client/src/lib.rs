//! Client for the managed ML platform.
//!
//! Talks to the control-plane API (pipelines, model registry, transform
//! jobs) and drives batch inference against the latest approved model.

pub mod api;
pub mod batch;

pub use api::client::PlatformClient;
