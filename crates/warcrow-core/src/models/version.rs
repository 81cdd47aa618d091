use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marker published by the data service; changes whenever unit data changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct DataVersion {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DataVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            updated_at: None,
        }
    }

    /// Two markers describe the same data when their version strings match.
    pub fn same_data(&self, other: &DataVersion) -> bool {
        self.version == other.version
    }
}
