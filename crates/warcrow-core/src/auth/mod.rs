//! Authentication session state.
//!
//! The session is persisted in local storage under `sb-auth-token`, the key
//! the hosted auth backend uses. A soft refresh never touches it; a nuclear
//! reset removes it and signs the user out.

pub mod session;

pub use session::{Session, SessionData, AUTH_STORAGE_KEY};
