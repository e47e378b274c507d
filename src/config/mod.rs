// Configuration module entry point
// Loads layered configuration and holds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    AdminConfig, BundlesConfig, Config, EntryCache, HostConfig, HttpConfig, LoggingConfig,
    PerformanceConfig, RewriteMode, ServerConfig,
};

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let host = HostConfig::default();
        let settings = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.admin_host", "127.0.0.1")?
            .set_default("server.admin_port", 8000)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "custom-page-loader/0.1")?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default("http.max_upload_size", 104_857_600)? // 100MB
            .set_default("bundles.upload_dir", "data/custom-static-pages")?
            .set_default("bundles.store_file", "data/bundles.toml")?
            .set_default("bundles.rewrite_mode", "smart")?
            .set_default("bundles.entry_cache", "no_cache")?
            .set_default("bundles.template_prefix", "/_cpl_pt/")?
            .set_default("bundles.flatten_uploads", true)?
            .set_default("host.site_url", host.site_url)?
            .set_default("host.index_files", host.index_files)?
            .set_default("host.front_page_paths", host.front_page_paths)?
            .set_default("host.single_post_prefixes", host.single_post_prefixes)?
            .set_default("host.reserved_prefixes", host.reserved_prefixes)?
            .set_default("host.reserved_paths", host.reserved_paths)?
            .set_default("admin.token", "")?
            .set_default("admin.debug_param", "cpl_debug")?
            .set_default("admin.connection_timeout", 600)?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("CPL")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("host.front_page_paths")
                    .with_list_parse_key("host.single_post_prefixes")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    pub fn admin_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.admin_host, self.server.admin_port)
            .parse()
            .map_err(|e| format!("Invalid admin address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("definitely/not/here").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.admin_port, 8000);
        assert_eq!(cfg.bundles.template_prefix, "/_cpl_pt/");
        assert_eq!(cfg.bundles.rewrite_mode, RewriteMode::Smart);
        assert_eq!(cfg.bundles.entry_cache, EntryCache::NoCache);
        assert_eq!(cfg.host.reserved_prefixes, vec!["wp-".to_string()]);
        assert_eq!(cfg.admin.debug_param, "cpl_debug");
        assert!(cfg.socket_addr().is_ok());
        assert!(cfg.admin_socket_addr().is_ok());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9090

[bundles]
rewrite_mode = "base_tag"
entry_cache = "public"

[host]
single_post_prefixes = ["/blog/"]
"#,
        )
        .unwrap();

        let stem = path.with_extension("");
        let cfg = Config::load_from(stem.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.bundles.rewrite_mode, RewriteMode::BaseTag);
        assert_eq!(cfg.bundles.entry_cache, EntryCache::Public);
        assert_eq!(cfg.host.single_post_prefixes, vec!["/blog/".to_string()]);
        // untouched defaults survive
        assert_eq!(cfg.host.front_page_paths, vec!["/".to_string()]);
    }
}
