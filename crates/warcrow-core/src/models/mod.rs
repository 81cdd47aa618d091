//! Data models for army lists and catalog data.
//!
//! - `ArmyList`, `UnitEntry`: user-composed rosters, the payload of share links
//! - `DataVersion`: the lightweight marker published with the unit catalog

pub mod army;
pub mod version;

pub use army::{ArmyList, UnitEntry};
pub use version::DataVersion;
