// Application state module
// Holds the loaded configuration plus the shared bundle store

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::types::Config;
use crate::routing::ConfiguredHost;
use crate::store::{BundleStore, SharedBundleStore};

/// Application state shared by the site and admin listeners
pub struct AppState {
    pub config: Config,
    pub store: SharedBundleStore,
    pub host: ConfiguredHost,
    pub upload_dir: PathBuf,
    /// Held while bundle folders are extracted or removed
    pub bundle_writes: Mutex<()>,
    access_log: bool,
}

impl AppState {
    /// Create `AppState`, opening the persisted bundle store
    pub fn new(config: &Config) -> Self {
        let store = Arc::new(BundleStore::open(&config.bundles.store_file));
        Self::with_store(config, store)
    }

    pub fn with_store(config: &Config, store: SharedBundleStore) -> Self {
        Self {
            config: config.clone(),
            store,
            host: ConfiguredHost::new(&config.host),
            upload_dir: PathBuf::from(&config.bundles.upload_dir),
            bundle_writes: Mutex::new(()),
            access_log: config.logging.access_log,
        }
    }

    pub const fn access_log_enabled(&self) -> bool {
        self.access_log
    }
}
