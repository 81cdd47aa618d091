//! Plain-text rendering for terminal output.

use warcrow_core::catalog::is_known_faction;
use warcrow_core::guard::CacheHealthSnapshot;
use warcrow_core::ArmyList;

/// Width of the unit name column.
const NAME_WIDTH: usize = 28;

/// Truncate to `max` characters, ending with an ellipsis when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

pub fn render_list(list: &ArmyList) -> String {
    let mut out = String::new();
    let faction = if is_known_faction(&list.faction) {
        list.faction.clone()
    } else {
        format!("{} (unknown faction)", list.faction)
    };
    out.push_str(&format!("{} [{}]\n", list.name, faction));

    if list.units.is_empty() {
        out.push_str("  (no units)\n");
    }
    for unit in &list.units {
        let mut line = format!(
            "  {:>2}x {:<width$} {:>4} pts",
            unit.quantity,
            truncate(&unit.name, NAME_WIDTH),
            unit.total_points(),
            width = NAME_WIDTH
        );
        if unit.high_command {
            line.push_str("  [high command]");
        }
        out.push_str(&line);
        out.push('\n');
    }

    out.push_str(&format!(
        "Total: {} pts, {} command, {} models",
        list.total_points(),
        list.total_command(),
        list.model_count()
    ));
    out
}

pub fn render_snapshot(snapshot: &CacheHealthSnapshot) -> String {
    let mut out = String::new();
    if snapshot.detected {
        out.push_str(&format!(
            "Outdated unit data detected ({}).\n",
            snapshot.matched_unit.as_deref().unwrap_or("unknown unit")
        ));
        out.push_str("Run `warcrow refresh`, or `warcrow reset` if that does not help.");
    } else {
        out.push_str("Cached unit data looks current.");
    }
    out.push_str(&format!(
        "\nKnown bad signatures: {}",
        snapshot.known_bad_signatures.len()
    ));
    out
}
