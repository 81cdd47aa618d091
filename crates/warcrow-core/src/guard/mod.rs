//! Stale cache detection and remediation.
//!
//! - `StaleDataGuard`: known-bad signature check, soft refresh, nuclear reset
//! - `StaleWatcher`: runs the check on a timer and on visibility changes
//! - `VersionGuard`: compares the cached data version marker with the server

pub mod signatures;
pub mod stale;
pub mod version;
pub mod watcher;

pub use signatures::{CacheHealthSnapshot, FieldValue, Signature, SignatureTable};
pub use stale::{RefreshReport, ResetReport, StaleDataGuard};
pub use version::{VersionGuard, VersionSource, VersionStatus, DATA_VERSION_KEY};
pub use watcher::{CheckTrigger, StaleAlert, StaleWatcher};
