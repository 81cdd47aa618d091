//! Core library for the Warcrow companion.
//!
//! - `share`: army list share tokens and the `/shared-list/{token}` route
//! - `guard`: stale cache detection, soft refresh and nuclear reset
//! - `catalog`: faction id canonicalization and unit de-duplication
//! - `store`, `storage`, `cache`, `platform`: client state and host seams
//! - `auth`, `api`, `config`: session, data service client, configuration

pub mod api;
pub mod auth;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod guard;
pub mod models;
pub mod platform;
pub mod share;
pub mod storage;
pub mod store;

pub use config::Config;
pub use guard::{StaleDataGuard, StaleWatcher, VersionGuard};
pub use models::{ArmyList, DataVersion, UnitEntry};
pub use share::{decode, encode, DecodeError, EncodeError, ShareToken};
pub use store::CompanionStore;
