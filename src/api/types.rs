// Admin API types
// Request and response bodies for the bundle management endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{PageRecord, PostTemplate};

/// Inline success/error notice returned by every endpoint
#[derive(Debug, Serialize)]
pub struct Notice<T = ()> {
    pub status: NoticeStatus,
    pub message: String,
    #[serde(flatten)]
    pub data: Option<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeStatus {
    Ok,
    Error,
}

/// One configured page as shown by the API
#[derive(Debug, Serialize, Deserialize)]
pub struct PageView {
    pub slug: String,
    pub folder: String,
    pub uploaded_at: DateTime<Utc>,
    /// Public URL of the page
    pub url: String,
}

impl PageView {
    pub fn new(record: &PageRecord, site_url: &str) -> Self {
        let site = site_url.trim_end_matches('/');
        let url = if record.is_home() {
            format!("{site}/")
        } else {
            format!("{site}/{}", record.slug)
        };
        Self {
            slug: record.slug.clone(),
            folder: record.folder.clone(),
            uploaded_at: record.uploaded_at,
            url,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PageData {
    pub page: PageView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PageListData {
    pub pages: Vec<PageView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TemplateData {
    pub post_template: Option<PostTemplate>,
}

/// Body of `PUT /v1/post-template/enabled`
#[derive(Debug, Deserialize)]
pub struct EnabledRequest {
    pub enabled: bool,
}
