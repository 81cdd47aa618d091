//! Unit catalog normalization.
//!
//! Catalog tables are maintained by hand and disagree on faction spelling;
//! everything is funnelled through `canonical_faction_id` before it is
//! cached or compared.

use std::collections::HashSet;

use tracing::debug;

use crate::models::UnitEntry;

pub const HEGEMONY: &str = "hegemony-of-embersig";
pub const NORTHERN_TRIBES: &str = "northern-tribes";
pub const SCIONS: &str = "scions-of-yaldabaoth";
pub const SYENANN: &str = "syenann";

/// Canonical faction ids.
pub const FACTIONS: &[&str] = &[HEGEMONY, NORTHERN_TRIBES, SCIONS, SYENANN];

const FACTION_ALIASES: &[(&str, &str)] = &[
    ("hegemony", HEGEMONY),
    ("embersig", HEGEMONY),
    ("the-hegemony", HEGEMONY),
    ("hegemony-of-embersig", HEGEMONY),
    ("tribes", NORTHERN_TRIBES),
    ("northern", NORTHERN_TRIBES),
    ("northern-tribes", NORTHERN_TRIBES),
    ("scions", SCIONS),
    ("yaldabaoth", SCIONS),
    ("scions-of-yaldabaoth", SCIONS),
    ("syenann", SYENANN),
    ("syenan", SYENANN),
];

/// Normalize a faction id: lowercase, `-` separated, known aliases resolved.
///
/// Unknown factions are returned normalized rather than rejected so newly
/// released factions keep working.
pub fn canonical_faction_id(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !normalized.is_empty() && !normalized.ends_with('-') {
                normalized.push('-');
            }
        } else {
            normalized.extend(c.to_lowercase());
        }
    }
    let normalized = normalized.trim_end_matches('-').to_string();

    FACTION_ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(normalized)
}

pub fn is_known_faction(raw: &str) -> bool {
    let id = canonical_faction_id(raw);
    FACTIONS.contains(&id.as_str())
}

/// Keep the first entry for each unit id, preserving order.
pub fn dedupe_units(units: Vec<UnitEntry>) -> Vec<UnitEntry> {
    let mut seen = HashSet::new();
    let total = units.len();
    let deduped: Vec<UnitEntry> = units
        .into_iter()
        .filter(|unit| seen.insert(unit.id.clone()))
        .collect();

    if deduped.len() < total {
        debug!(
            dropped = total - deduped.len(),
            kept = deduped.len(),
            "Dropped duplicate catalog units"
        );
    }
    deduped
}
