//! Structured storage keys.
//!
//! Keys in the wild look like `warcrow_unit_cache_v1`, `sb-abc-auth-token`
//! or `armyListsV2`. Every cleanup decision goes through `StorageKey::parse`
//! so there is exactly one place that understands the key namespace.

/// Prefix for keys owned by this application.
pub const APP_NAMESPACE: &str = "warcrow";

/// Whole segments that mark unit catalog and army data.
const CATALOG_MARKERS: &[&str] = &["unit", "units", "army", "armies", "faction", "factions"];

/// How a key is treated by cache cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    /// Authentication state. Only a nuclear reset removes it.
    Auth,
    /// Unit, army or faction data.
    Catalog,
    /// Other application-owned data.
    AppNamespace,
    /// Keys this application does not own.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKey {
    raw: String,
    segments: Vec<String>,
}

impl StorageKey {
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            segments: tokenize(raw),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn class(&self) -> KeyClass {
        if self.is_auth() {
            KeyClass::Auth
        } else if self.is_catalog() {
            KeyClass::Catalog
        } else if self.segments.first().map(String::as_str) == Some(APP_NAMESPACE) {
            KeyClass::AppNamespace
        } else {
            KeyClass::Other
        }
    }

    /// Whether a soft refresh should drop this key.
    pub fn is_refreshable(&self) -> bool {
        matches!(self.class(), KeyClass::Catalog | KeyClass::AppNamespace)
    }

    fn is_auth(&self) -> bool {
        let supabase_token = self.segments.first().map(String::as_str) == Some("sb")
            && self.segments.last().map(String::as_str) == Some("token");
        supabase_token || self.segments.iter().any(|s| s.starts_with("auth"))
    }

    fn is_catalog(&self) -> bool {
        self.segments
            .iter()
            .any(|s| CATALOG_MARKERS.contains(&s.as_str()))
    }
}

/// Split on separators and lower-to-upper camelCase boundaries, lowercased.
fn tokenize(raw: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in raw.chars() {
        if matches!(c, '_' | '-' | '.' | ':' | '/' | ' ') {
            if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}
