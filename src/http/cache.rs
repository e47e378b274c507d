//! HTTP cache control module
//!
//! Cache-Control policies for bundle responses.

use crate::config::EntryCache;

/// Asset lifetime: 24 hours
pub const ASSET_MAX_AGE: u32 = 86_400;

/// Cache control policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Public cache with specified max-age (seconds)
    Public(u32),
    /// Revalidate on every use
    NoCache,
    /// Emit no Cache-Control header
    Unset,
}

impl CachePolicy {
    /// Policy for bundle assets
    pub const fn asset() -> Self {
        Self::Public(ASSET_MAX_AGE)
    }

    /// Policy for the bundle entry document, as configured
    pub const fn entry(setting: EntryCache) -> Self {
        match setting {
            EntryCache::NoCache => Self::NoCache,
            EntryCache::Public => Self::Public(ASSET_MAX_AGE),
            EntryCache::Unset => Self::Unset,
        }
    }

    /// Convert to Cache-Control header value
    pub fn to_header_value(self) -> Option<String> {
        match self {
            Self::Public(max_age) => Some(format!("public, max-age={max_age}")),
            Self::NoCache => Some("no-cache, no-store, must-revalidate".to_string()),
            Self::Unset => None,
        }
    }
}
