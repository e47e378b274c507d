//! HTTP protocol layer module
//!
//! Response builders, cache policies and content type detection shared by
//! the site and admin listeners.

pub mod cache;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use cache::CachePolicy;
pub use response::{
    build_404_response, build_405_response, build_asset_response, build_entry_response,
    build_file_response, build_html_response, build_options_response,
};
