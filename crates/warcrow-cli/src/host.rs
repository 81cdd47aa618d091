//! Wiring between the core library and the local machine.
//!
//! Local storage is a directory of JSON files, session storage lives only as
//! long as the process, and named caches are subdirectories of the cache
//! root. There are no service workers outside a browser, so that registry
//! starts empty.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use warcrow_core::api::ApiClient;
use warcrow_core::auth::Session;
use warcrow_core::platform::{
    ChannelReloader, DirCacheStorage, MemoryServiceWorkers, ReloadSignal,
};
use warcrow_core::storage::{FileStorage, MemoryStorage};
use warcrow_core::{CompanionStore, Config, StaleDataGuard};

pub struct Host {
    pub config: Config,
    pub store: CompanionStore,
    pub guard: Arc<StaleDataGuard>,
    pub session: Session,
    pub api: ApiClient,
    reload_signal: Option<ReloadSignal>,
}

impl Host {
    pub fn new(config: Config) -> Result<Self> {
        let local = FileStorage::new(config.local_storage_dir()?)?;
        let store = CompanionStore::new(Arc::new(local), Arc::new(MemoryStorage::new()));

        let (reloader, reload_signal) = ChannelReloader::new();
        let guard = StaleDataGuard::new(
            store.clone(),
            Arc::new(MemoryServiceWorkers::new()),
            Arc::new(DirCacheStorage::new(config.cache_storage_dir()?)),
            Arc::new(reloader),
        )
        .with_reload_delay(config.reload_delay());

        let mut session = Session::new(store.local().clone());
        if let Err(e) = session.load() {
            warn!(error = %e, "Ignoring unreadable session");
        }

        let mut api = ApiClient::new(config.api_base_url.clone())?;
        match session.token() {
            Some(token) => api.set_token(token.to_string()),
            None => debug!("No valid session, data service calls are anonymous"),
        }

        Ok(Self {
            config,
            store,
            guard: Arc::new(guard),
            session,
            api,
            reload_signal: Some(reload_signal),
        })
    }

    /// The reload signal can only be awaited once.
    pub fn take_reload_signal(&mut self) -> Option<ReloadSignal> {
        self.reload_signal.take()
    }
}
