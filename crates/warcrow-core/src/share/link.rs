//! Share URLs and the `/shared-list/{token}` route.

use tracing::debug;

use super::{codec, EncodeError};
use crate::models::ArmyList;

/// Path prefix for shared lists.
pub const SHARED_LIST_ROUTE: &str = "/shared-list/";

/// What the shared-list route renders.
#[derive(Debug, Clone, PartialEq)]
pub enum SharedListView {
    /// Read-only view of the decoded list.
    List(ArmyList),
    /// The generic "invalid or expired list" view.
    Invalid,
}

impl SharedListView {
    pub fn is_invalid(&self) -> bool {
        matches!(self, SharedListView::Invalid)
    }
}

/// Build the full share URL for a list.
pub fn share_url(base_url: &str, list: &ArmyList) -> Result<String, EncodeError> {
    let token = codec::encode(list)?;
    Ok(format!(
        "{}{}{}",
        base_url.trim_end_matches('/'),
        SHARED_LIST_ROUTE,
        token
    ))
}

/// Extract the token from a shared-list URL or path.
///
/// Scheme and authority, query strings, fragments and a single trailing
/// slash are ignored. The path must start with the route prefix and the
/// token must be the only segment after it.
pub fn extract_token(url_or_path: &str) -> Option<&str> {
    let without_fragment = url_or_path.split('#').next().unwrap_or_default();
    let without_query = without_fragment.split('?').next().unwrap_or_default();

    let path = match without_query.split_once("://") {
        Some((_, after_scheme)) => &after_scheme[after_scheme.find('/')?..],
        None => without_query,
    };

    let rest = path.strip_prefix(SHARED_LIST_ROUTE)?;
    let token = rest.strip_suffix('/').unwrap_or(rest);

    if token.is_empty() || token.contains('/') {
        None
    } else {
        Some(token)
    }
}

/// Resolve a request path to the view the route should render.
pub fn resolve_shared_path(url_or_path: &str) -> SharedListView {
    let Some(token) = extract_token(url_or_path) else {
        debug!(path = url_or_path, "Not a shared-list path");
        return SharedListView::Invalid;
    };

    match codec::decode(token) {
        Ok(list) => SharedListView::List(list),
        Err(e) => {
            debug!(error = %e, category = %e.category(), "Rejected shared list token");
            SharedListView::Invalid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UnitEntry;

    fn list() -> ArmyList {
        ArmyList::new("local", "Raiders", "northern-tribes")
            .with_unit(UnitEntry::new("hunter", "Hunter", 20))
    }

    #[test]
    fn test_share_url_shape() {
        let url = share_url("https://companion.example/", &list()).unwrap();
        assert!(url.starts_with("https://companion.example/shared-list/"));
        let token = extract_token(&url).unwrap();
        assert!(!token.is_empty());
    }

    #[test]
    fn test_resolve_full_url_round_trip() {
        let url = share_url("https://companion.example", &list()).unwrap();
        match resolve_shared_path(&url) {
            SharedListView::List(decoded) => {
                assert_eq!(decoded.name, "Raiders");
                assert_eq!(decoded.units.len(), 1);
            }
            SharedListView::Invalid => panic!("expected a list"),
        }
    }

    #[test]
    fn test_extract_ignores_query_fragment_and_trailing_slash() {
        assert_eq!(extract_token("/shared-list/abc_-1?ref=x"), Some("abc_-1"));
        assert_eq!(extract_token("/shared-list/abc#top"), Some("abc"));
        assert_eq!(extract_token("/shared-list/abc/"), Some("abc"));
    }

    #[test]
    fn test_extract_rejects_other_paths() {
        assert_eq!(extract_token("/lists/abc"), None);
        assert_eq!(extract_token("/shared-list/"), None);
        assert_eq!(extract_token("/shared-list/abc/def"), None);
    }

    #[test]
    fn test_invalid_token_renders_invalid_view() {
        assert!(resolve_shared_path("/shared-list/not-valid-base64!!").is_invalid());
        assert!(resolve_shared_path("/rules/faq").is_invalid());
    }

    #[test]
    fn test_route_must_start_the_path() {
        let token = codec::encode(&list()).unwrap();
        assert!(resolve_shared_path(&format!("/foo/shared-list/{}", token)).is_invalid());
        assert!(resolve_shared_path(&format!("https://companion.example/foo/shared-list/{}", token)).is_invalid());
        assert!(!resolve_shared_path(&format!("https://companion.example/shared-list/{}", token)).is_invalid());
        assert_eq!(extract_token("https://companion.example"), None);
    }
}
