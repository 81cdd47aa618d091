//! Client-side caches.
//!
//! - `CachedData`: a value stamped with the time it was fetched
//! - `QueryCache`: the in-memory query cache, keyed by structured query keys
//!
//! Query results are considered stale after 60 minutes.

pub mod query;

pub use query::{CachedData, QueryCache, QueryKey, UNITS_NAMESPACE};
