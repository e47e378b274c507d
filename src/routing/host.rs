//! Host routing signals
//!
//! The matcher asks the host three questions about the current request
//! (front page, blog home, single post). `ConfiguredHost` answers them from
//! the `[host]` configuration section.

use crate::config::HostConfig;

/// Read-only routing state reported by the host for one request path
pub trait HostSignals {
    fn is_front_page(&self, path: &str) -> bool;
    fn is_home(&self, path: &str) -> bool;
    fn is_single_post(&self, path: &str) -> bool;
}

/// Host signals derived from configured path lists
#[derive(Debug, Clone, Default)]
pub struct ConfiguredHost {
    front_page_paths: Vec<String>,
    single_post_prefixes: Vec<String>,
}

impl ConfiguredHost {
    pub fn new(config: &HostConfig) -> Self {
        Self {
            front_page_paths: config
                .front_page_paths
                .iter()
                .map(|p| normalize_path(p).to_string())
                .collect(),
            single_post_prefixes: config
                .single_post_prefixes
                .iter()
                .map(|p| format!("{}/", p.trim_end_matches('/')))
                .collect(),
        }
    }
}

impl HostSignals for ConfiguredHost {
    fn is_front_page(&self, path: &str) -> bool {
        self.front_page_paths.iter().any(|p| p == path)
    }

    /// The posts index: a single post prefix requested without a post name
    fn is_home(&self, path: &str) -> bool {
        self.single_post_prefixes
            .iter()
            .any(|p| p.trim_end_matches('/') == path && path != "/")
    }

    fn is_single_post(&self, path: &str) -> bool {
        self.single_post_prefixes
            .iter()
            .any(|p| path.strip_prefix(p.as_str()).is_some_and(|rest| !rest.is_empty()))
    }
}

/// Strip the query string and any trailing slash, keeping a bare `/`
pub fn normalize_path(uri_path: &str) -> &str {
    let path = uri_path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}
