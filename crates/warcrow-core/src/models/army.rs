//! Army list domain types.
//!
//! Field names serialize in camelCase so cached JSON and share payloads
//! stay compatible with the web client.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn is_zero(value: &u32) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A single roster line: one catalog unit taken `quantity` times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct UnitEntry {
    pub id: String,
    pub name: String,
    /// Display names keyed by language code (`es`, `fr`, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub localized_names: BTreeMap<String, String>,
    pub points_cost: u32,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub command: u32,
    #[serde(default, skip_serializing_if = "is_false")]
    pub high_command: bool,
}

impl UnitEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, points_cost: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            localized_names: BTreeMap::new(),
            points_cost,
            quantity: 1,
            command: 0,
            high_command: false,
        }
    }

    pub fn total_points(&self) -> u32 {
        self.points_cost.saturating_mul(self.quantity)
    }

    pub fn total_command(&self) -> u32 {
        self.command.saturating_mul(self.quantity)
    }

    /// Name in the requested language, falling back to the default name.
    pub fn display_name(&self, lang: &str) -> &str {
        self.localized_names
            .get(lang)
            .map(|s| s.as_str())
            .unwrap_or(&self.name)
    }

    /// Reason this entry cannot be shared, if any.
    pub(crate) fn validation_error(&self) -> Option<&'static str> {
        if self.id.trim().is_empty() {
            Some("missing id")
        } else if self.name.trim().is_empty() {
            Some("missing name")
        } else if self.quantity == 0 {
            Some("quantity must be at least 1")
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ArmyList {
    pub id: String,
    pub name: String,
    pub faction: String,
    #[serde(default)]
    pub units: Vec<UnitEntry>,
    pub created_at: DateTime<Utc>,
}

impl ArmyList {
    pub fn new(id: impl Into<String>, name: impl Into<String>, faction: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            faction: faction.into(),
            units: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_unit(mut self, unit: UnitEntry) -> Self {
        self.units.push(unit);
        self
    }

    // Shared lists come from untrusted tokens, so totals saturate.
    pub fn total_points(&self) -> u32 {
        self.units
            .iter()
            .fold(0u32, |acc, u| acc.saturating_add(u.total_points()))
    }

    pub fn total_command(&self) -> u32 {
        self.units
            .iter()
            .fold(0u32, |acc, u| acc.saturating_add(u.total_command()))
    }

    pub fn model_count(&self) -> u32 {
        self.units
            .iter()
            .fold(0u32, |acc, u| acc.saturating_add(u.quantity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_totals() {
        let mut unit = UnitEntry::new("aide", "Aide", 25);
        unit.quantity = 2;
        unit.command = 1;
        assert_eq!(unit.total_points(), 50);
        assert_eq!(unit.total_command(), 2);
    }

    #[test]
    fn test_list_totals() {
        let mut captain = UnitEntry::new("captain", "Captain", 40);
        captain.command = 2;
        captain.high_command = true;
        let mut troops = UnitEntry::new("troops", "Line Troops", 20);
        troops.quantity = 3;

        let list = ArmyList::new("l1", "Vanguard", "northern-tribes")
            .with_unit(captain)
            .with_unit(troops);

        assert_eq!(list.total_points(), 100);
        assert_eq!(list.total_command(), 2);
        assert_eq!(list.model_count(), 4);
    }

    #[test]
    fn test_empty_list_totals() {
        let list = ArmyList::new("l1", "Empty", "syenann");
        assert_eq!(list.total_points(), 0);
        assert_eq!(list.total_command(), 0);
    }

    #[test]
    fn test_list_totals_saturate() {
        let mut big = UnitEntry::new("colossus", "Colossus", u32::MAX);
        big.command = u32::MAX;
        big.quantity = u32::MAX;
        let list = ArmyList::new("l1", "Huge", "syenann")
            .with_unit(big.clone())
            .with_unit(big);

        assert_eq!(list.total_points(), u32::MAX);
        assert_eq!(list.total_command(), u32::MAX);
        assert_eq!(list.model_count(), u32::MAX);
    }

    #[test]
    fn test_display_name_falls_back() {
        let mut unit = UnitEntry::new("aide", "Aide", 25);
        unit.localized_names.insert("es".to_string(), "Ayudante".to_string());
        assert_eq!(unit.display_name("es"), "Ayudante");
        assert_eq!(unit.display_name("fr"), "Aide");
    }

    #[test]
    fn test_optional_fields_omitted_from_json() {
        let unit = UnitEntry::new("aide", "Aide", 25);
        let json = serde_json::to_string(&unit).unwrap();
        assert_eq!(json, r#"{"id":"aide","name":"Aide","pointsCost":25,"quantity":1}"#);
    }

    #[test]
    fn test_parse_cached_unit_without_optional_fields() {
        let json = r#"{"id":"aide","name":"Aide","pointsCost":15,"quantity":1}"#;
        let unit: UnitEntry = serde_json::from_str(json).unwrap();
        assert_eq!(unit.command, 0);
        assert!(!unit.high_command);
        assert!(unit.localized_names.is_empty());
    }

    #[test]
    fn test_validation_error() {
        let mut unit = UnitEntry::new("aide", "Aide", 25);
        assert!(unit.validation_error().is_none());
        unit.quantity = 0;
        assert!(unit.validation_error().is_some());
        let unit = UnitEntry::new("", "Aide", 25);
        assert_eq!(unit.validation_error(), Some("missing id"));
    }
}
