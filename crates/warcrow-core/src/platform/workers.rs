use std::collections::BTreeSet;
use std::sync::Mutex;

use futures::future::BoxFuture;
use futures::FutureExt;

use super::{PlatformError, ServiceWorkerRegistry};

/// Registry held in memory. Hosts without service workers use an empty one.
#[derive(Debug, Default)]
pub struct MemoryServiceWorkers {
    scopes: Mutex<BTreeSet<String>>,
}

impl MemoryServiceWorkers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, scope: impl Into<String>) {
        self.lock().insert(scope.into());
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
        self.scopes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ServiceWorkerRegistry for MemoryServiceWorkers {
    fn registrations(&self) -> BoxFuture<'_, Result<Vec<String>, PlatformError>> {
        let scopes = self.lock().iter().cloned().collect();
        async move { Ok(scopes) }.boxed()
    }

    fn unregister<'a>(&'a self, scope: &'a str) -> BoxFuture<'a, Result<bool, PlatformError>> {
        let removed = self.lock().remove(scope);
        async move { Ok(removed) }.boxed()
    }
}
