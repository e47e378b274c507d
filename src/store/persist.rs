// Bundle store persistence
// Keeps the page mapping and post template record in a TOML state file

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::mapping::{PageRecord, PostTemplate, SiteSnapshot};
use crate::error::{LoaderError, Result};
use crate::logger;

/// Persisted store of bundle records
///
/// Requests read an `Arc<SiteSnapshot>` taken once at request start. Writers
/// (the admin API) build a new snapshot, persist it, then publish it.
pub struct BundleStore {
    /// Path to state file
    path: PathBuf,
    /// Current snapshot (cached in memory)
    current: RwLock<Arc<SiteSnapshot>>,
}

impl BundleStore {
    /// Open the store, loading existing state if the file is present
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let snapshot = Self::load(&path).unwrap_or_default();
        Self {
            path,
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Load state from file
    fn load(path: &Path) -> Option<SiteSnapshot> {
        if !path.exists() {
            return None;
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<SiteSnapshot>(&content) {
                Ok(snapshot) => {
                    logger::log_info(&format!(
                        "Loaded {} page bundle(s) from {}",
                        snapshot.pages.len(),
                        path.display()
                    ));
                    Some(snapshot)
                }
                Err(e) => {
                    logger::log_error(&format!(
                        "Failed to parse bundle store {}: {}",
                        path.display(),
                        e
                    ));
                    None
                }
            },
            Err(e) => {
                logger::log_error(&format!(
                    "Failed to read bundle store {}: {}",
                    path.display(),
                    e
                ));
                None
            }
        }
    }

    /// Write snapshot to a temp file next to the target, then rename over it
    fn save(&self, snapshot: &SiteSnapshot) -> Result<()> {
        let content = toml::to_string_pretty(snapshot)
            .map_err(|e| LoaderError::Store(format!("Failed to serialize store: {e}")))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply a change to a copy of the current snapshot, persist, then publish
    async fn update<T>(&self, change: impl FnOnce(&mut SiteSnapshot) -> T) -> Result<T> {
        let mut current = self.current.write().await;
        let mut next = SiteSnapshot::clone(&current);
        let out = change(&mut next);
        self.save(&next)?;
        *current = Arc::new(next);
        drop(current);
        Ok(out)
    }

    /// Snapshot for one request
    pub async fn snapshot(&self) -> Arc<SiteSnapshot> {
        Arc::clone(&*self.current.read().await)
    }

    /// Insert or overwrite a page record; returns the replaced record
    pub async fn upsert_page(&self, record: PageRecord) -> Result<Option<PageRecord>> {
        self.update(|s| s.pages.upsert(record)).await
    }

    /// Remove a page record; returns it if it existed
    pub async fn remove_page(&self, slug: &str) -> Result<Option<PageRecord>> {
        self.update(|s| s.pages.remove(slug)).await
    }

    pub async fn set_post_template(&self, template: PostTemplate) -> Result<()> {
        self.update(|s| s.post_template = Some(template)).await
    }

    /// Toggle the template without touching its files; false when no template exists
    pub async fn set_post_template_enabled(&self, enabled: bool) -> Result<bool> {
        self.update(|s| match s.post_template.as_mut() {
            Some(t) => {
                t.enabled = enabled;
                true
            }
            None => false,
        })
        .await
    }

    pub async fn clear_post_template(&self) -> Result<Option<PostTemplate>> {
        self.update(|s| s.post_template.take()).await
    }
}

/// Wrapper for Arc<BundleStore>
pub type SharedBundleStore = Arc<BundleStore>;
