//! Request handler module
//!
//! Site listener request processing: method checks, the bundle cascade,
//! the debug overlay and the host's default handling.

pub mod bundles;
pub mod debug;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
