//! Bundle store module
//!
//! Persisted slug -> bundle mapping and the post template record.

mod mapping;
mod persist;

pub use mapping::{BundleMapping, PageRecord, PostTemplate, SiteSnapshot, HOME_SLUG};
pub use persist::{BundleStore, SharedBundleStore};
