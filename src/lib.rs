//! Custom page loader
//!
//! Serves uploaded static HTML bundles in place of site pages. A site
//! listener runs the bundle matcher in front of the host's default document
//! root; an admin listener exposes a JSON API to upload and remove bundles.

pub mod api;
pub mod bundle;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod routing;
pub mod server;
pub mod store;
