//! Routing module
//!
//! Maps an incoming request path to bundle candidates:
//! - Host signals (front page, home, single post)
//! - The ordered matcher cascade

mod host;
mod matcher;

pub use host::{normalize_path, ConfiguredHost, HostSignals};
pub use matcher::{candidates, BundleMatch, MatchContext, MatchTarget};
