//! REST client for the authoritative unit data service.
//!
//! Only the lightweight data version marker is fetched here; catalog
//! records themselves are loaded by the web client.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
