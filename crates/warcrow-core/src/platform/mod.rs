//! Host facilities used by the nuclear reset.
//!
//! These traits stand in for the browser's service worker registry, Cache
//! Storage and page reload. Async methods return `BoxFuture` so the guard
//! can hold them as trait objects.

pub mod caches;
pub mod reload;
pub mod workers;

use futures::future::BoxFuture;
use thiserror::Error;

pub use caches::{DirCacheStorage, MemoryCacheStorage};
pub use reload::{ChannelReloader, ReloadSignal};
pub use workers::MemoryServiceWorkers;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Operation not permitted: {0}")]
    NotPermitted(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub trait ServiceWorkerRegistry: Send + Sync {
    /// Scopes of all active registrations.
    fn registrations(&self) -> BoxFuture<'_, Result<Vec<String>, PlatformError>>;

    /// Returns false when no registration exists for `scope`.
    fn unregister<'a>(&'a self, scope: &'a str) -> BoxFuture<'a, Result<bool, PlatformError>>;
}

pub trait CacheStorage: Send + Sync {
    /// Names of all named caches.
    fn keys(&self) -> BoxFuture<'_, Result<Vec<String>, PlatformError>>;

    /// Returns false when no cache named `name` exists.
    fn delete<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<bool, PlatformError>>;
}

/// Schedules a full reload of the application.
pub trait Reloader: Send + Sync {
    /// Once scheduled a reload cannot be cancelled.
    fn schedule_reload(&self, delay: std::time::Duration);
}
