//! Known-bad unit data signatures.
//!
//! Each signature describes field values a unit had before a data fix. A
//! cached unit matching one of them proves the cache predates the fix. A
//! miss proves nothing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::UnitEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum FieldValue {
    PointsCost(u32),
    Command(u32),
    HighCommand(bool),
}

impl FieldValue {
    fn matches(&self, unit: &UnitEntry) -> bool {
        match *self {
            FieldValue::PointsCost(points) => unit.points_cost == points,
            FieldValue::Command(command) => unit.command == command,
            FieldValue::HighCommand(flag) => unit.high_command == flag,
        }
    }
}

/// A set of field values that must all match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(Vec<FieldValue>);

impl Signature {
    pub fn new(fields: impl IntoIterator<Item = FieldValue>) -> Self {
        Self(fields.into_iter().collect())
    }

    pub fn fields(&self) -> &[FieldValue] {
        &self.0
    }

    /// An empty signature matches nothing.
    pub fn matches(&self, unit: &UnitEntry) -> bool {
        !self.0.is_empty() && self.0.iter().all(|field| field.matches(unit))
    }
}

/// Unit id -> signatures of its known-bad historical values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureTable(BTreeMap<String, Vec<Signature>>);

impl SignatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Regressions shipped to clients in the past.
    pub fn known_regressions() -> Self {
        // The aide briefly shipped at 15 points; corrected to 25 with 1 command.
        Self::new().with("aide", Signature::new([FieldValue::PointsCost(15)]))
    }

    pub fn with(mut self, unit_id: impl Into<String>, signature: Signature) -> Self {
        self.0.entry(unit_id.into()).or_default().push(signature);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First cached unit matching a known-bad signature, scanning the table
    /// in order and stopping at the first hit.
    pub fn find_match<'a>(&self, cached_units: &'a [UnitEntry]) -> Option<&'a UnitEntry> {
        self.0.iter().find_map(|(unit_id, signatures)| {
            cached_units
                .iter()
                .filter(|unit| &unit.id == unit_id)
                .find(|unit| signatures.iter().any(|sig| sig.matches(unit)))
        })
    }
}

/// Result of one health check. Computed on demand, never stored.
#[derive(Debug, Clone)]
pub struct CacheHealthSnapshot {
    pub known_bad_signatures: SignatureTable,
    pub detected: bool,
    pub matched_unit: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(id: &str, points: u32, command: u32) -> UnitEntry {
        let mut unit = UnitEntry::new(id, id, points);
        unit.command = command;
        unit
    }

    #[test]
    fn test_known_regression_matches_old_aide() {
        let table = SignatureTable::known_regressions();
        let cached = vec![unit("captain", 40, 2), unit("aide", 15, 0)];
        assert_eq!(table.find_match(&cached).map(|u| u.id.as_str()), Some("aide"));
    }

    #[test]
    fn test_known_regression_ignores_corrected_aide() {
        let table = SignatureTable::known_regressions();
        assert!(table.find_match(&[unit("aide", 25, 1)]).is_none());
    }

    #[test]
    fn test_signature_requires_all_fields() {
        let sig = Signature::new([FieldValue::PointsCost(15), FieldValue::Command(0)]);
        assert!(sig.matches(&unit("aide", 15, 0)));
        assert!(!sig.matches(&unit("aide", 15, 1)));
        assert!(!Signature::new([]).matches(&unit("aide", 15, 0)));
    }

    #[test]
    fn test_other_unit_with_same_values_is_ignored() {
        let table = SignatureTable::known_regressions();
        assert!(table.find_match(&[unit("hunter", 15, 0)]).is_none());
    }

    #[test]
    fn test_table_parses_from_json() {
        let json = r#"{"aide":[[{"field":"pointsCost","value":15}]],"captain":[[{"field":"highCommand","value":false}]]}"#;
        let table: SignatureTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.len(), 2);
        let mut captain = unit("captain", 40, 2);
        captain.high_command = false;
        assert!(table.find_match(&[captain]).is_some());
    }
}
