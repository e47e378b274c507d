// Bundle mapping types
// Ordered slug -> bundle records plus the single post template record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reserved slug for the site's front page bundle
pub const HOME_SLUG: &str = "home";

/// One page replaced by a bundle
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub slug: String,
    /// Folder name under the upload directory
    pub folder: String,
    pub uploaded_at: DateTime<Utc>,
}

impl PageRecord {
    pub fn new(slug: &str, folder: &str) -> Self {
        Self {
            slug: slug.to_string(),
            folder: folder.to_string(),
            uploaded_at: Utc::now(),
        }
    }

    pub fn is_home(&self) -> bool {
        self.slug == HOME_SLUG
    }
}

/// Bundle replacing every single-post page
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct PostTemplate {
    pub active: bool,
    /// Independent on/off switch; files stay on disk while disabled
    pub enabled: bool,
    pub folder: String,
    pub uploaded_at: DateTime<Utc>,
}

impl PostTemplate {
    pub fn new(folder: &str) -> Self {
        Self {
            active: true,
            enabled: true,
            folder: folder.to_string(),
            uploaded_at: Utc::now(),
        }
    }

    /// Whether single-post requests should be answered by this template
    pub const fn is_serving(&self) -> bool {
        self.active && self.enabled
    }
}

/// Insertion-ordered slug mapping
///
/// Iteration order is the order in which slugs were first added. Overwriting
/// an existing slug keeps its position. Asset matching relies on this order
/// when one slug is a prefix of another.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct BundleMapping {
    entries: Vec<PageRecord>,
}

impl BundleMapping {
    pub fn get(&self, slug: &str) -> Option<&PageRecord> {
        self.entries.iter().find(|r| r.slug == slug)
    }

    pub fn home(&self) -> Option<&PageRecord> {
        self.get(HOME_SLUG)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PageRecord> {
        self.entries.iter()
    }

    /// Records other than `home`, in mapping order
    pub fn pages(&self) -> impl Iterator<Item = &PageRecord> {
        self.entries.iter().filter(|r| !r.is_home())
    }

    /// Insert or overwrite in place; returns the replaced record if any
    pub fn upsert(&mut self, record: PageRecord) -> Option<PageRecord> {
        if let Some(existing) = self.entries.iter_mut().find(|r| r.slug == record.slug) {
            return Some(std::mem::replace(existing, record));
        }
        self.entries.push(record);
        None
    }

    pub fn remove(&mut self, slug: &str) -> Option<PageRecord> {
        let idx = self.entries.iter().position(|r| r.slug == slug)?;
        Some(self.entries.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<PageRecord> for BundleMapping {
    fn from_iter<I: IntoIterator<Item = PageRecord>>(iter: I) -> Self {
        let mut mapping = Self::default();
        for record in iter {
            mapping.upsert(record);
        }
        mapping
    }
}

/// Read-only view of the persisted configuration for one request
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct SiteSnapshot {
    #[serde(default)]
    pub pages: BundleMapping,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_template: Option<PostTemplate>,
}

impl SiteSnapshot {
    /// Post template record, only when it should be served
    pub fn serving_template(&self) -> Option<&PostTemplate> {
        self.post_template.as_ref().filter(|t| t.is_serving())
    }
}
