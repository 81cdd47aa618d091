//! Share links for army lists.
//!
//! A share token is the whole list state: JSON, zlib-compressed, then
//! URL-safe base64. Nothing is stored server-side, so decoding a token is
//! the only way to get the list back.

pub mod codec;
pub mod error;
pub mod link;

pub use codec::{decode, encode, ShareToken};
pub use error::{DecodeError, EncodeError, ErrorCategory};
pub use link::{resolve_shared_path, share_url, SharedListView, SHARED_LIST_ROUTE};
