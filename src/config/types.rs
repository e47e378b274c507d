// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub bundles: BundlesConfig,
    pub host: HostConfig,
    pub admin: AdminConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub admin_host: String,
    pub admin_port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub max_body_size: u64,
    /// Upper bound for archive uploads on the admin listener
    pub max_upload_size: u64,
}

/// Entry document rewriting policy
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RewriteMode {
    /// Only inject `<base href>` after `<head>`
    BaseTag,
    /// Rewrite `src`/`href` values that exist in the bundle, then inject `<base>`
    Smart,
}

/// Cache policy for the entry document response
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryCache {
    NoCache,
    Public,
    /// Send no Cache-Control header at all
    Unset,
}

/// Bundle storage and rendering configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BundlesConfig {
    /// Base directory holding one folder per bundle
    pub upload_dir: String,
    /// TOML file persisting the page mapping and post template record
    pub store_file: String,
    pub rewrite_mode: RewriteMode,
    pub entry_cache: EntryCache,
    /// Virtual prefix for post template assets
    pub template_prefix: String,
    /// Move every extracted file to the bundle root after upload
    pub flatten_uploads: bool,
}

/// Host routing configuration
///
/// Stands in for the routing state a CMS would report: which paths are the
/// front page, which are single posts, and where default content lives.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HostConfig {
    /// Absolute site origin used in `<base>` hrefs, empty for root-relative
    #[serde(default)]
    pub site_url: String,
    /// Document root served when no bundle applies
    #[serde(default)]
    pub document_root: Option<String>,
    pub index_files: Vec<String>,
    pub front_page_paths: Vec<String>,
    pub single_post_prefixes: Vec<String>,
    /// Path prefixes never claimed by the home bundle asset fallback
    pub reserved_prefixes: Vec<String>,
    /// Exact paths never claimed by the home bundle asset fallback
    pub reserved_paths: Vec<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            site_url: String::new(),
            document_root: None,
            index_files: vec!["index.html".to_string(), "index.htm".to_string()],
            front_page_paths: vec!["/".to_string()],
            single_post_prefixes: Vec::new(),
            reserved_prefixes: vec!["wp-".to_string()],
            reserved_paths: vec!["index.php".to_string(), "xmlrpc.php".to_string()],
        }
    }
}

/// Administrative access configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AdminConfig {
    /// Bearer token for the admin API and the debug overlay; empty disables auth
    #[serde(default)]
    pub token: String,
    pub debug_param: String,
    /// Seconds an admin connection may stay open; uploads can be slow
    #[serde(default = "default_admin_connection_timeout")]
    pub connection_timeout: u64,
}

const fn default_admin_connection_timeout() -> u64 {
    600
}

impl AdminConfig {
    /// Check an `Authorization` header value against the configured token
    pub fn authorize(&self, authorization: Option<&str>) -> bool {
        if self.token.is_empty() {
            return true;
        }
        authorization
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|t| t.trim() == self.token)
    }
}
